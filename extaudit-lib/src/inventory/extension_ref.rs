use core::fmt::{Display, Formatter, Result as FmtResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Splits `<identifier>-<version>[-darwin-arm64]`.
///
/// The identifier group is lazy so it takes the shortest prefix that still leaves a
/// trailing version. Only ASCII digits are accepted in the version.
static DIR_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)-([0-9]+\.[0-9]+\.[0-9]+(?:\.[0-9]+)?)(?:-darwin-arm64)?$").expect("invalid regex")
});

/// An installed extension, as decoded from its on-disk directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionRef {
    identifier: String,
    version: Option<String>,
    #[serde(rename = "originalDirname", alias = "originalName")]
    original_name: String,
}

impl ExtensionRef {
    /// Parse a directory name such as `ms-azuretools.vscode-docker-2.0.0`.
    ///
    /// Names without a recognizable trailing version become an identifier with no version.
    #[must_use]
    pub fn parse(dir_name: &str) -> Self {
        let (identifier, version) = split_dir_name(dir_name);
        Self {
            identifier: identifier.to_string(),
            version: version.map(str::to_string),
            original_name: dir_name.to_string(),
        }
    }

    /// The marketplace `publisher.name` key.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The directory name this reference was parsed from.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

/// Split a directory name into its identifier and optional version without allocating.
#[must_use]
pub fn split_dir_name(dir_name: &str) -> (&str, Option<&str>) {
    DIR_NAME_REGEX.captures(dir_name).map_or((dir_name, None), |caps| {
        match (caps.get(1), caps.get(2)) {
            (Some(identifier), Some(version)) => (identifier.as_str(), Some(version.as_str())),
            _ => (dir_name, None),
        }
    })
}

impl Display for ExtensionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.identifier)?;
        if let Some(version) = self.version() {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
