use serde::{Deserialize, Serialize};

/// Publisher shown when the marketplace did not provide one.
pub const UNKNOWN_PUBLISHER: &str = "Unknown";

/// Description recorded for identifiers the marketplace has no record of.
pub const NOT_FOUND_DESCRIPTION: &str = "Extension not found in marketplace";

/// Prefix of the description recorded when a lookup failed.
pub const ERROR_DESCRIPTION_PREFIX: &str = "Error:";

/// Display metadata for one marketplace identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMetadata {
    #[serde(alias = "name")]
    pub display_name: String,
    pub description: String,
    #[serde(default = "unknown_publisher")]
    pub publisher: String,
}

fn unknown_publisher() -> String {
    UNKNOWN_PUBLISHER.to_string()
}

impl ExtensionMetadata {
    #[must_use]
    pub fn new(display_name: impl Into<String>, description: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: description.into(),
            publisher: publisher.into(),
        }
    }

    /// Placeholder for an identifier the marketplace answered for but did not know.
    #[must_use]
    pub fn not_found(identifier: &str) -> Self {
        Self::new(identifier, NOT_FOUND_DESCRIPTION, UNKNOWN_PUBLISHER)
    }

    /// Placeholder for an identifier whose lookup failed with `message`.
    #[must_use]
    pub fn lookup_error(identifier: &str, message: impl core::fmt::Display) -> Self {
        Self::new(identifier, format!("{ERROR_DESCRIPTION_PREFIX} {message}"), UNKNOWN_PUBLISHER)
    }

    /// Whether this record stands in for a failed lookup.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        self.description.starts_with(ERROR_DESCRIPTION_PREFIX)
    }
}
