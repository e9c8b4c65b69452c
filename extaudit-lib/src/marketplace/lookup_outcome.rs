use super::ExtensionMetadata;
use std::sync::Arc;

/// The result of looking up one identifier.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The marketplace returned a record for the identifier.
    Found(ExtensionMetadata),

    /// The marketplace answered but has no record of the identifier.
    NotFound,

    /// The lookup failed at the transport or protocol level.
    Failed(Arc<ohno::AppError>),
}

impl LookupOutcome {
    /// Turn the outcome into the metadata recorded for `identifier`, substituting a
    /// placeholder when nothing was found.
    ///
    /// Failures keep only the top-level error message; context lines and any captured
    /// backtrace stay in the logs.
    #[must_use]
    pub fn into_metadata(self, identifier: &str) -> ExtensionMetadata {
        match self {
            Self::Found(metadata) => metadata,
            Self::NotFound => ExtensionMetadata::not_found(identifier),
            Self::Failed(e) => ExtensionMetadata::lookup_error(identifier, e.message()),
        }
    }
}
