//! Marketplace metadata lookup
//!
//! This module resolves extension identifiers to display metadata through the public
//! marketplace query API.
//!
//! # Implementation Model
//!
//! A [`MetadataSource`] answers one identifier at a time with a [`LookupOutcome`].
//! The production source is [`Client`], a thin wrapper around a `reqwest` client.
//!
//! The [`Enricher`] drives a source over a batch of directory names:
//!
//! 1. Directory names are reduced to distinct identifiers in first-seen order.
//! 2. Identifiers already present in the caller's [`EnrichmentContext`] are skipped.
//! 3. The remaining identifiers are looked up strictly one after the other, with a
//!    fixed pause between consecutive lookups.
//! 4. Every outcome, including failures, ends up as an [`ExtensionMetadata`] entry.
//!
//! Progress is surfaced through an observer callback, which the command layer wires to
//! a [`LookupTracker`] feeding a [`Progress`] display.

mod client;
mod enricher;
mod extension_metadata;
mod lookup_outcome;
mod lookup_tracker;
mod progress;

pub use client::{Client, MARKETPLACE_QUERY_URL};
pub use enricher::{DEFAULT_REQUEST_DELAY, Enricher, EnrichmentContext, EnrichmentReport};
pub use extension_metadata::{ERROR_DESCRIPTION_PREFIX, ExtensionMetadata, NOT_FOUND_DESCRIPTION, UNKNOWN_PUBLISHER};
pub use lookup_outcome::LookupOutcome;
pub use lookup_tracker::LookupTracker;
pub use progress::Progress;

/// Something that can resolve a marketplace identifier to metadata.
pub trait MetadataSource: Send + Sync {
    /// Look up a single identifier.
    ///
    /// Implementations report failures through [`LookupOutcome::Failed`] instead of
    /// returning an error.
    fn lookup(&self, identifier: &str) -> impl Future<Output = LookupOutcome> + Send;
}
