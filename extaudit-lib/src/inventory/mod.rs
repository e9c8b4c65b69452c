//! Decoding of per-user extension listings
//!
//! The listings are produced by a collection script run on the target host: one heading
//! per user followed by the extension directory names found in that user's extension
//! folder. This module turns that text into structured data.
//!
//! # Implementation Model
//!
//! [`ExtensionRef::parse`] splits a directory name such as
//! `rust-lang.rust-analyzer-0.3.2500-darwin-arm64` into the marketplace identifier and
//! the version. [`decode`] drives a two-state line classifier over the listing and
//! yields an [`Inventory`]: the per-user entries plus the flat list of raw names that
//! feeds the enrichment pipeline.
//!
//! Decoding never fails. Lines that are not understood are skipped.

mod decoder;
mod extension_ref;

pub use decoder::{Inventory, UserEntries, decode};
pub use extension_ref::{ExtensionRef, split_dir_name};
