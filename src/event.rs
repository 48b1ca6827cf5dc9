//! Source event vocabulary.
//!
//! These are the four event kinds the external notification listener can
//! deliver. They are intentionally serializable so a host can replay or
//! forward them across a process boundary.

use serde::{Deserialize, Serialize};

use crate::record::{NotificationRecord, SourceId};

/// One event from the external notification source.
///
/// Events arrive one at a time, in delivery order. Incremental events
/// (`Posted`/`Removed`) mutate the authoritative set in place; the two
/// lifecycle events (`Resynced`/`Cleared`) replace it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    /// A notification appeared (or was re-posted).
    Posted {
        /// The observed record.
        record: NotificationRecord,
    },

    /// A notification disappeared, keyed by its transport id.
    Removed {
        /// Transport id the source reported for the removal.
        source_id: SourceId,
    },

    /// The source reported its full set of currently-active items,
    /// typically on (re)connect. Authoritative: entries absent from the
    /// snapshot are dropped.
    Resynced {
        /// Freshly enumerated active records, possibly with duplicates.
        snapshot: Vec<NotificationRecord>,
    },

    /// The source disconnected and its state can no longer be trusted.
    Cleared,
}

impl SourceEvent {
    /// Short event-kind label for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Posted { .. } => "posted",
            Self::Removed { .. } => "removed",
            Self::Resynced { .. } => "resynced",
            Self::Cleared => "cleared",
        }
    }
}
