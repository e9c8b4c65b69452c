use super::AnalysisResult;
use crate::marketplace::ExtensionMetadata;
use indexmap::{IndexMap, IndexSet};
use std::borrow::Cow;

/// Headline figures for an analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_users: usize,
    pub total_entries: usize,
    pub unique_extensions: usize,
    pub successful_lookups: usize,
    pub failed_lookups: usize,
}

/// How many users have a given extension installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionUsage<'a> {
    pub identifier: &'a str,
    pub users: usize,
    pub metadata: Cow<'a, ExtensionMetadata>,
}

/// All installed versions of one extension for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionGroup<'a> {
    pub identifier: &'a str,
    pub metadata: Cow<'a, ExtensionMetadata>,

    /// Versions in input order. `None` for entries without a recognizable version.
    pub versions: Vec<Option<&'a str>>,
}

/// One user's installed extensions, grouped by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView<'a> {
    pub name: &'a str,
    pub groups: Vec<ExtensionGroup<'a>>,
}

impl UserView<'_> {
    #[must_use]
    pub const fn unique_extensions(&self) -> usize {
        self.groups.len()
    }
}

#[must_use]
pub fn summarize(result: &AnalysisResult) -> Summary {
    Summary {
        total_users: result.total_users(),
        total_entries: result.total_entries(),
        unique_extensions: result.unique_extensions(),
        successful_lookups: result.successful_lookups(),
        failed_lookups: result.failed_lookups(),
    }
}

/// Rank identifiers by the number of distinct users that have them installed.
///
/// A user with several versions of the same extension counts once. Ties keep the order
/// in which the identifiers were first seen.
#[must_use]
pub fn popularity(result: &AnalysisResult) -> Vec<ExtensionUsage<'_>> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for entries in result.users.values() {
        let distinct: IndexSet<&str> = entries.iter().map(|e| e.identifier()).collect();
        for identifier in distinct {
            *counts.entry(identifier).or_default() += 1;
        }
    }

    let mut ranking: Vec<ExtensionUsage<'_>> = counts
        .into_iter()
        .map(|(identifier, users)| ExtensionUsage {
            identifier,
            users,
            metadata: result.metadata_for(identifier),
        })
        .collect();

    ranking.sort_by(|a, b| b.users.cmp(&a.users));
    ranking
}

/// Per-user views, in input order, with groups sorted by display name ignoring case.
#[must_use]
pub fn user_views(result: &AnalysisResult) -> Vec<UserView<'_>> {
    result
        .users
        .iter()
        .map(|(name, entries)| {
            let mut grouped: IndexMap<&str, Vec<Option<&str>>> = IndexMap::new();
            for entry in entries {
                grouped.entry(entry.identifier()).or_default().push(entry.version());
            }

            let mut groups: Vec<ExtensionGroup<'_>> = grouped
                .into_iter()
                .map(|(identifier, versions)| ExtensionGroup {
                    identifier,
                    metadata: result.metadata_for(identifier),
                    versions,
                })
                .collect();
            groups.sort_by_cached_key(|g| g.metadata.display_name.to_lowercase());

            UserView { name, groups }
        })
        .collect()
}
