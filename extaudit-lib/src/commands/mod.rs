//! Command-line interface and orchestration for extaudit
//!
//! This module parses the command line, loads configuration, and drives the decoder,
//! the enrichment pipeline, and the report generators end to end.
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and hands them to
//! `analyze`, which:
//!
//! 1. Initializes logging and loads the optional `extaudit.toml` configuration
//! 2. Reads and decodes the per-user listing
//! 3. Looks up each distinct extension in the marketplace, showing progress
//! 4. Renders the JSON result and optional HTML report in memory, then writes them
//! 5. Prints a summary unless `--quiet` was given
//!
//! Pressing Ctrl-C stops the lookups after the one in flight. The results gathered so
//! far are still written.

mod analyze;
mod common;
mod config;
mod host;
mod progress_reporter;
mod run;

#[cfg(debug_assertions)]
pub use config::Config;

pub use analyze::{AnalyzeArgs, analyze};
pub use common::{ColorMode, LogLevel};
pub use host::Host;
pub use progress_reporter::ProgressReporter;
pub use run::run;
