//! Lifecycle event kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle moments a persistence layer can report.
///
/// The set is fixed up front; listeners are attached per kind rather than
/// generated on demand. Whether a single persistence operation fires more
/// than one kind (a create typically also fires `Save` and `Commit`) is
/// decided by the lifecycle source, and each firing fans out independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Entity was inserted for the first time
    Create,
    /// An existing entity was modified and persisted
    Update,
    /// Entity was persisted, whether new or existing
    Save,
    /// The surrounding transaction committed
    Commit,
}

impl EventKind {
    /// All recognized event kinds.
    pub const ALL: [EventKind; 4] = [
        EventKind::Create,
        EventKind::Update,
        EventKind::Save,
        EventKind::Commit,
    ];

    /// Wire/display name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Save => "save",
            EventKind::Commit => "commit",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
