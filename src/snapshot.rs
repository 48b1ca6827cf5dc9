//! Immutable committed views of the authoritative set.
//!
//! Every commit publishes a fresh [`Snapshot`]; nothing mutates a
//! snapshot after publication. Readers clone the `Arc` and walk their
//! copy without coordinating with the writer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::record::{IdentityKey, NotificationRecord};

/// An immutable point-in-time view of the authoritative set.
///
/// Cheap to clone (an `Arc` bump). At most one record per identity;
/// iteration order is unspecified, display ordering is a presentation
/// concern.
///
/// # Examples
///
/// ```
/// use notistate::Snapshot;
///
/// let empty = Snapshot::empty();
/// assert!(empty.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Arc<HashMap<IdentityKey, NotificationRecord>>,
}

impl Snapshot {
    /// An empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Arc::new(HashMap::new()),
        }
    }

    pub(crate) fn from_map(records: HashMap<IdentityKey, NotificationRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Number of distinct notifications in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no notifications are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up the record with the given identity.
    #[must_use]
    pub fn get(&self, key: &IdentityKey) -> Option<&NotificationRecord> {
        self.records.get(key)
    }

    /// Returns true if a record with the given identity is present.
    #[must_use]
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.records.contains_key(key)
    }

    /// Iterates over the records, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.values()
    }

    /// Collects the records into a vector for display layers.
    #[must_use]
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.values().cloned().collect()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
