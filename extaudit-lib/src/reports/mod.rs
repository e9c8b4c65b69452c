//! Usage statistics and report generation
//!
//! Everything here operates on an [`AnalysisResult`]: the metadata per identifier
//! produced by the enrichment pipeline together with the per-user entries produced by
//! the decoder.
//!
//! # Implementation Model
//!
//! The `usage` module derives the figures every report shares:
//! - a summary (users, entries, distinct identifiers, lookup successes and failures)
//! - the popularity ranking, counting each user at most once per identifier
//! - per-user views with entries grouped by identifier and sorted by display name
//!
//! Three generators render those figures, each accessed through a `generate` function:
//! - **Console**: Terminal summary and ranking with optional ANSI colors
//! - **HTML**: Self-contained document with embedded CSS
//! - **JSON**: The `AnalysisResult` itself, pretty-printed
//!
//! Generators write into a `core::fmt::Write` so callers can render into memory and
//! only touch the file system once everything has been produced.

mod analysis_result;
mod console;
mod html;
mod json;
mod usage;

pub use analysis_result::{AnalysisResult, UNAVAILABLE_DESCRIPTION};
pub use console::generate as generate_console;
pub use html::generate as generate_html;
pub use json::generate as generate_json;
pub use usage::{ExtensionGroup, ExtensionUsage, Summary, UserView, popularity, summarize, user_views};
