use crate::Result;
use crate::inventory::UserEntries;
use crate::marketplace::{ExtensionMetadata, UNKNOWN_PUBLISHER};
use indexmap::IndexMap;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Description shown for identifiers that have no metadata entry.
pub const UNAVAILABLE_DESCRIPTION: &str = "Extension information not available";

/// The outcome of an analysis run, and the format of the exported JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Metadata per marketplace identifier, in first-seen order.
    pub extensions: IndexMap<String, ExtensionMetadata>,

    /// Installed extensions per user, in input order.
    pub users: UserEntries,
}

impl AnalysisResult {
    #[must_use]
    pub const fn new(extensions: IndexMap<String, ExtensionMetadata>, users: UserEntries) -> Self {
        Self { extensions, users }
    }

    /// Parse a previously exported result.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).into_app_err("parsing analysis result")
    }

    /// Metadata for `identifier`, or a stand-in when the run never resolved it.
    #[must_use]
    pub fn metadata_for(&self, identifier: &str) -> Cow<'_, ExtensionMetadata> {
        self.extensions.get(identifier).map_or_else(
            || Cow::Owned(ExtensionMetadata::new(identifier, UNAVAILABLE_DESCRIPTION, UNKNOWN_PUBLISHER)),
            Cow::Borrowed,
        )
    }

    #[must_use]
    pub fn total_users(&self) -> usize {
        self.users.len()
    }

    /// Number of entries across all users, duplicates included.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn unique_extensions(&self) -> usize {
        self.extensions.len()
    }

    /// Metadata entries that do not stand in for a failed lookup.
    ///
    /// Not-found placeholders count as successful, since the marketplace did answer.
    #[must_use]
    pub fn successful_lookups(&self) -> usize {
        self.extensions.values().filter(|m| !m.is_lookup_error()).count()
    }

    #[must_use]
    pub fn failed_lookups(&self) -> usize {
        self.extensions.values().filter(|m| m.is_lookup_error()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::decode;

    fn sample() -> AnalysisResult {
        let inventory = decode("alice:\n  - foo.bar-1.2.3\n  - baz.qux-0.1.0\nbob:\n  - foo.bar-1.2.3\n");
        let mut extensions = IndexMap::new();
        let _ = extensions.insert("foo.bar".to_string(), ExtensionMetadata::new("Foo", "Does foo", "Foo Inc"));
        let _ = extensions.insert("baz.qux".to_string(), ExtensionMetadata::lookup_error("baz.qux", "HTTP 500"));
        AnalysisResult::new(extensions, inventory.users)
    }

    #[test]
    fn test_counts() {
        let result = sample();
        assert_eq!(result.total_users(), 2);
        assert_eq!(result.total_entries(), 3);
        assert_eq!(result.unique_extensions(), 2);
        assert_eq!(result.successful_lookups(), 1);
        assert_eq!(result.failed_lookups(), 1);
    }

    #[test]
    fn test_metadata_for_known() {
        let result = sample();
        assert!(matches!(result.metadata_for("foo.bar"), Cow::Borrowed(_)));
        assert_eq!(result.metadata_for("foo.bar").display_name, "Foo");
    }

    #[test]
    fn test_metadata_for_unknown() {
        let result = sample();
        let metadata = result.metadata_for("never.looked-up");
        assert_eq!(metadata.display_name, "never.looked-up");
        assert_eq!(metadata.description, UNAVAILABLE_DESCRIPTION);
        assert_eq!(metadata.publisher, "Unknown");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["extensions"]["foo.bar"]["displayName"], "Foo");
        assert_eq!(json["users"]["alice"][0]["identifier"], "foo.bar");
        assert_eq!(json["users"]["alice"][0]["version"], "1.2.3");
        assert_eq!(json["users"]["alice"][0]["originalDirname"], "foo.bar-1.2.3");
        assert_eq!(json["users"]["bob"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_json_keeps_insertion_order() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert!(text.find("\"alice\"").unwrap() < text.find("\"bob\"").unwrap());
        assert!(text.find("\"foo.bar\"").unwrap() < text.find("\"baz.qux\"").unwrap());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let result = sample();
        let text = serde_json::to_string_pretty(&result).unwrap();
        assert_eq!(AnalysisResult::from_json(&text).unwrap(), result);
    }

    #[test]
    fn test_from_json_older_export() {
        let result = AnalysisResult::from_json(
            r#"{
                "extensions": { "foo.bar": { "name": "Foo", "description": "Does foo" } },
                "users": { "alice": [ { "identifier": "foo.bar", "version": null, "originalName": "foo.bar" } ] }
            }"#,
        )
        .unwrap();

        assert_eq!(result.extensions["foo.bar"].publisher, "Unknown");
        assert_eq!(result.users["alice"][0].version(), None);
        assert_eq!(result.users["alice"][0].original_name(), "foo.bar");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = AnalysisResult::from_json("{ not json").unwrap_err();
        assert!(err.to_string().contains("parsing analysis result"));
    }
}
