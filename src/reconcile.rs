//! The reconciliation engine.
//!
//! Applies source events to the authoritative set, guaranteeing exactly
//! one record per identity. Storage is keyed by [`IdentityKey`]; a
//! secondary `source_id -> identity` index exists because removals
//! arrive keyed by transport id.
//!
//! Index invariant: `by_source_id` maps the most-recently-observed
//! transport id of every present record to its identity, and nothing
//! else. Both maps are updated together under every operation.

use std::collections::HashMap;

use log::debug;

use crate::event::SourceEvent;
use crate::record::{IdentityKey, NotificationRecord, SourceId};
use crate::snapshot::Snapshot;

/// State machine over the authoritative notification set.
///
/// Each operation is a pure function of `(current set, event)`; the
/// engine holds no state beyond the set and the transport-id index.
/// No event is an error: late removals, duplicate posts, and redundant
/// clears are absorbed as no-ops or refreshes.
#[derive(Debug, Default)]
pub struct Reconciler {
    by_identity: HashMap<IdentityKey, NotificationRecord>,
    by_source_id: HashMap<SourceId, IdentityKey>,
}

impl Reconciler {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct notifications currently present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    /// Returns true if no notifications are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    /// Applies one source event, advancing to the next committed state.
    pub fn apply(&mut self, event: SourceEvent) {
        let before = self.by_identity.len();
        let kind = event.kind();

        match event {
            SourceEvent::Posted { record } => self.apply_posted(record),
            SourceEvent::Removed { source_id } => self.apply_removed(source_id),
            SourceEvent::Resynced { snapshot } => self.apply_resynced(snapshot),
            SourceEvent::Cleared => self.apply_cleared(),
        }

        debug!(
            "reconcile event={} size {} -> {}",
            kind,
            before,
            self.by_identity.len()
        );
    }

    /// Builds an immutable snapshot of the current set.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_map(self.by_identity.clone())
    }

    fn apply_posted(&mut self, record: NotificationRecord) {
        let key = record.identity();

        // A re-post may carry a fresh transport id; the stale index
        // entry for the replaced observation must not linger.
        if let Some(previous) = self.by_identity.get(&key) {
            self.by_source_id.remove(&previous.source_id);
        }

        // The source reusing a live id under new content is an in-place
        // update of that notification; the prior instance is superseded
        // and must not outlive its id.
        if let Some(superseded) = self.by_source_id.insert(record.source_id, key.clone()) {
            if superseded != key {
                self.by_identity.remove(&superseded);
            }
        }

        self.by_identity.insert(key, record);
    }

    fn apply_removed(&mut self, source_id: SourceId) {
        // Unknown ids are expected: duplicate and late removal events
        // are part of the source's weak delivery contract.
        let Some(key) = self.by_source_id.remove(&source_id) else {
            return;
        };
        self.by_identity.remove(&key);
    }

    fn apply_resynced(&mut self, snapshot: Vec<NotificationRecord>) {
        self.by_identity.clear();
        self.by_source_id.clear();
        for record in snapshot {
            // Later entries win, same as a sequence of posts.
            self.apply_posted(record);
        }
    }

    fn apply_cleared(&mut self) {
        self.by_identity.clear();
        self.by_source_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NotificationRecord;
    use chrono::{Duration, Utc};

    fn record(source_id: i64, origin: &str, title: &str, body: &str) -> NotificationRecord {
        NotificationRecord::builder(source_id, origin)
            .title(title)
            .body(body)
            .build()
            .unwrap()
    }

    fn posted(record: NotificationRecord) -> SourceEvent {
        SourceEvent::Posted { record }
    }

    fn removed(id: i64) -> SourceEvent {
        SourceEvent::Removed {
            source_id: SourceId::from_raw(id),
        }
    }

    #[test]
    fn test_post_inserts() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "T", "B")));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_duplicate_post_collapses_and_refreshes() {
        let mut engine = Reconciler::new();
        let t0 = Utc::now();
        let first = NotificationRecord::builder(1, "com.x")
            .title("T")
            .body("B")
            .observed_at(t0)
            .build()
            .unwrap();
        let second = NotificationRecord::builder(2, "com.x")
            .title("T")
            .body("B")
            .observed_at(t0 + Duration::seconds(5))
            .build()
            .unwrap();

        engine.apply(posted(first.clone()));
        engine.apply(posted(second.clone()));

        assert_eq!(engine.len(), 1);
        let snap = engine.snapshot();
        let live = snap.get(&first.identity()).unwrap();
        // Last-observed wins: payload and transport id come from the
        // second observation.
        assert_eq!(live.source_id, second.source_id);
        assert_eq!(live.observed_at, second.observed_at);
    }

    #[test]
    fn test_removal_by_latest_source_id() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "Hi", "there")));
        engine.apply(posted(record(2, "com.x", "Hi", "there")));
        assert_eq!(engine.len(), 1);

        // The live record's most recent transport id is 2.
        engine.apply(removed(2));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_removal_by_stale_source_id_is_noop() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "Hi", "there")));
        engine.apply(posted(record(2, "com.x", "Hi", "there")));

        // Id 1 was superseded by the re-post; its index entry is gone.
        engine.apply(removed(1));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_removal_idempotent() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "T", "B")));
        engine.apply(removed(1));
        engine.apply(removed(1));
        engine.apply(removed(99));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_same_id_repost_with_new_identity_supersedes_old() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "Download", "0%")));
        engine.apply(posted(record(1, "com.x", "Download", "100%")));

        // An in-place update: one live record, the new content.
        assert_eq!(engine.len(), 1);
        let snap = engine.snapshot();
        assert!(!snap.contains(&record(1, "com.x", "Download", "0%").identity()));
        assert!(snap.contains(&record(1, "com.x", "Download", "100%").identity()));

        engine.apply(removed(1));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_same_id_repost_keeps_index_consistent() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "A", "a")));
        engine.apply(posted(record(2, "com.x", "B", "b")));
        // B moves onto id 1, superseding A entirely.
        engine.apply(posted(record(1, "com.x", "B", "b")));

        assert_eq!(engine.len(), 1);
        let snap = engine.snapshot();
        assert!(!snap.contains(&record(0, "com.x", "A", "a").identity()));
        assert_eq!(
            snap.get(&record(0, "com.x", "B", "b").identity())
                .unwrap()
                .source_id,
            SourceId::from_raw(1)
        );

        // B's abandoned id is dead, its live id removes it.
        engine.apply(removed(2));
        assert_eq!(engine.len(), 1);
        engine.apply(removed(1));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_id_reuse_never_duplicates_or_orphans() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "app", "T", "B")));
        engine.apply(removed(1));
        assert!(engine.is_empty());

        engine.apply(posted(record(2, "app", "T", "B")));
        assert_eq!(engine.len(), 1);
        engine.apply(removed(2));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_resync_replaces() {
        let mut engine = Reconciler::new();
        let a = record(1, "com.x", "A", "a");
        let b = record(2, "com.x", "B", "b");
        engine.apply(posted(a.clone()));
        engine.apply(posted(b.clone()));

        let b_again = record(5, "com.x", "B", "b");
        let c = record(6, "com.x", "C", "c");
        engine.apply(SourceEvent::Resynced {
            snapshot: vec![b_again.clone(), c.clone()],
        });

        let snap = engine.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(!snap.contains(&a.identity()));
        assert!(snap.contains(&c.identity()));
        // B was refreshed: its transport id now comes from the snapshot.
        assert_eq!(snap.get(&b.identity()).unwrap().source_id, b_again.source_id);
    }

    #[test]
    fn test_resync_deduplicates_snapshot() {
        let mut engine = Reconciler::new();
        let early = record(1, "com.x", "T", "B");
        let late = record(2, "com.x", "T", "B");
        engine.apply(SourceEvent::Resynced {
            snapshot: vec![early.clone(), late.clone()],
        });

        assert_eq!(engine.len(), 1);
        let snap = engine.snapshot();
        assert_eq!(snap.get(&early.identity()).unwrap().source_id, late.source_id);
    }

    #[test]
    fn test_resync_rebuilds_source_id_index() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "A", "a")));
        engine.apply(SourceEvent::Resynced {
            snapshot: vec![record(7, "com.x", "A", "a")],
        });

        // Pre-resync ids are dead, snapshot ids are live.
        engine.apply(removed(1));
        assert_eq!(engine.len(), 1);
        engine.apply(removed(7));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_clear_empties_then_resync_repopulates() {
        let mut engine = Reconciler::new();
        engine.apply(posted(record(1, "com.x", "A", "a")));
        engine.apply(posted(record(2, "com.x", "B", "b")));
        engine.apply(SourceEvent::Cleared);
        assert!(engine.is_empty());

        let x = record(3, "com.y", "X", "x");
        engine.apply(SourceEvent::Resynced {
            snapshot: vec![x.clone()],
        });
        assert_eq!(engine.len(), 1);
        assert!(engine.snapshot().contains(&x.identity()));
    }

    #[test]
    fn test_clear_on_empty_is_noop() {
        let mut engine = Reconciler::new();
        engine.apply(SourceEvent::Cleared);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_from_engine() {
        let mut engine = Reconciler::new();
        let a = record(1, "com.x", "A", "a");
        engine.apply(posted(a.clone()));
        let snap = engine.snapshot();

        engine.apply(SourceEvent::Cleared);
        assert!(engine.is_empty());
        // The earlier snapshot is unaffected.
        assert_eq!(snap.len(), 1);
        assert!(snap.contains(&a.identity()));
    }
}
