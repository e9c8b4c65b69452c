#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for extaudit
//!
//! This library consolidates all functionality for the extaudit tool, which inventories
//! the editor extensions installed for the users of a shared machine, enriches them with
//! marketplace metadata, and reports on their usage.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`inventory`]: Directory-name parsing and input decoding
//! - [`marketplace`]: Metadata lookup and the serial enrichment pipeline
//! - [`reports`]: Usage statistics and report generation in multiple formats

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod inventory;
pub mod marketplace;
pub mod reports;

pub use crate::commands::{Host, run};
