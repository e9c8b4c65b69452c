use super::ExtensionRef;
use indexmap::IndexMap;

const LOG_TARGET: &str = "inventory";

/// User name to the extensions installed for that user, in input order.
pub type UserEntries = IndexMap<String, Vec<ExtensionRef>>;

/// The decoded form of an extension listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub users: UserEntries,

    /// Every raw directory name attached to a user, in input order, duplicates included.
    pub dir_names: Vec<String>,
}

impl Inventory {
    /// Total number of extension entries across all users.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }
}

/// How a single trimmed input line is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Comment,
    Heading(&'a str),
    Item(&'a str),
    Other,
}

impl<'a> LineKind<'a> {
    fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Blank
        } else if line.starts_with('#') {
            Self::Comment
        } else if let Some(name) = line.strip_suffix(':') {
            Self::Heading(name)
        } else if let Some(dir_name) = line.strip_prefix("- ") {
            Self::Item(dir_name)
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DecoderState {
    NoUser,
    InUser(String),
}

/// Decode an extension listing.
///
/// The format is one `user:` heading per user followed by `- <directory name>` items.
/// Indentation is irrelevant, `#` lines are comments, and unrecognized lines are skipped.
/// Only the line as a whole is trimmed: a user name is everything before the final `:`
/// and a directory name everything after `- `, inner spacing included. A heading for a
/// user that was already seen continues that user's list.
#[must_use]
pub fn decode(text: &str) -> Inventory {
    let mut inventory = Inventory::default();
    let mut state = DecoderState::NoUser;

    for (index, line) in text.lines().enumerate() {
        state = match (LineKind::classify(line), state) {
            (LineKind::Heading(name), _) => {
                if name.is_empty() {
                    log::debug!(target: LOG_TARGET, "line {}: heading with an empty user name", index + 1);
                }
                let _ = inventory.users.entry(name.to_string()).or_default();
                DecoderState::InUser(name.to_string())
            }

            (LineKind::Item(dir_name), DecoderState::InUser(user)) => {
                inventory
                    .users
                    .entry(user.clone())
                    .or_default()
                    .push(ExtensionRef::parse(dir_name));
                inventory.dir_names.push(dir_name.to_string());
                DecoderState::InUser(user)
            }

            (LineKind::Item(dir_name), DecoderState::NoUser) => {
                log::debug!(target: LOG_TARGET, "line {}: dropping '{dir_name}' which has no user", index + 1);
                DecoderState::NoUser
            }

            (LineKind::Other, state) => {
                log::trace!(target: LOG_TARGET, "line {}: ignored", index + 1);
                state
            }

            (LineKind::Blank | LineKind::Comment, state) => state,
        };
    }

    inventory
}
