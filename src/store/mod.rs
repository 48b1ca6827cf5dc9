//! Observable store for committed snapshots.
//!
//! Single-writer, multi-reader: commits serialize through the store's
//! mutex and publish immutable [`Snapshot`]s; readers either clone the
//! latest published value or drain their own per-subscriber channel.
//! Fan-out uses unbounded channels so a slow subscriber never blocks
//! the committing writer and no commit is ever dropped.

mod stream;

pub use stream::{SnapshotStream, SubscriberId};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Sender};
use log::{trace, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::snapshot::Snapshot;

#[derive(Debug)]
pub(crate) struct StoreState {
    current: Snapshot,
    subscribers: HashMap<SubscriberId, Sender<Snapshot>>,
}

/// Holds the committed authoritative set and fans commits out to
/// subscribers.
///
/// Subscribers registered after a commit observe the latest committed
/// value immediately upon registration, then every subsequent commit in
/// commit order. Cancelling one subscription affects neither other
/// subscribers nor the committed state.
#[derive(Debug)]
pub struct ObservableStore {
    state: Arc<Mutex<StoreState>>,
}

impl ObservableStore {
    /// Creates a store holding the empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                current: Snapshot::empty(),
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Atomically replaces the held snapshot and notifies every
    /// registered subscriber.
    ///
    /// Subscribers whose receiving end is gone are pruned during
    /// fan-out.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if a previous writer
    /// panicked while holding the store lock.
    pub fn commit(&self, snapshot: Snapshot) -> NotifyResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::LockPoisoned { context: "store.commit" })?;

        state.current = snapshot.clone();

        let before = state.subscribers.len();
        state
            .subscribers
            .retain(|_, tx| tx.send(snapshot.clone()).is_ok());
        let pruned = before - state.subscribers.len();
        if pruned > 0 {
            warn!("pruned {pruned} dead subscriber(s) during commit");
        }

        trace!(
            "committed snapshot size={} subscribers={}",
            snapshot.len(),
            state.subscribers.len()
        );
        Ok(())
    }

    /// Registers a new subscriber.
    ///
    /// The returned stream is seeded with the currently committed
    /// snapshot, atomically with registration: the subscriber observes
    /// the current value plus every future commit, with no gap and no
    /// replay of earlier commits.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if the store lock is
    /// poisoned.
    pub fn subscribe(&self) -> NotifyResult<SnapshotStream> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::LockPoisoned { context: "store.subscribe" })?;

        let id = SubscriberId::new();
        let (tx, rx) = unbounded::<Snapshot>();

        // Seed before registering so the first receive is the value
        // committed at registration time.
        let _ = tx.send(state.current.clone());
        state.subscribers.insert(id, tx);

        trace!("subscriber {id} registered ({} total)", state.subscribers.len());
        Ok(SnapshotStream::new(id, rx, Arc::downgrade(&self.state)))
    }

    /// Synchronous point-in-time read of the committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if the store lock is
    /// poisoned.
    pub fn current(&self) -> NotifyResult<Snapshot> {
        let state = self
            .state
            .lock()
            .map_err(|_| NotifyError::LockPoisoned { context: "store.current" })?;
        Ok(state.current.clone())
    }

    /// Number of currently registered subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if the store lock is
    /// poisoned.
    pub fn subscriber_count(&self) -> NotifyResult<usize> {
        let state = self
            .state
            .lock()
            .map_err(|_| NotifyError::LockPoisoned { context: "store.subscriber_count" })?;
        Ok(state.subscribers.len())
    }

    pub(crate) fn unregister(state: &Arc<Mutex<StoreState>>, id: SubscriberId) {
        // Best-effort: a poisoned lock means the store is unusable
        // anyway, and Drop must not panic.
        if let Ok(mut state) = state.lock() {
            state.subscribers.remove(&id);
        }
    }
}

impl Default for ObservableStore {
    fn default() -> Self {
        Self::new()
    }
}
