//! Subscriber stream handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NotifyError, NotifyResult};
use crate::snapshot::Snapshot;

use super::{ObservableStore, StoreState};

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new random subscriber id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A per-subscriber stream of committed snapshots.
///
/// The first value received is the snapshot committed at registration
/// time; every value after that is one subsequent commit, in commit
/// order. The stream never terminates on its own: it ends only when the
/// subscriber cancels (or the store itself is dropped).
///
/// Dropping the stream performs best-effort unregistration.
#[derive(Debug)]
pub struct SnapshotStream {
    id: SubscriberId,
    rx: Receiver<Snapshot>,
    store: Weak<Mutex<StoreState>>,
    unregistered: AtomicBool,
}

impl SnapshotStream {
    pub(crate) fn new(id: SubscriberId, rx: Receiver<Snapshot>, store: Weak<Mutex<StoreState>>) -> Self {
        Self {
            id,
            rx,
            store,
            unregistered: AtomicBool::new(false),
        }
    }

    /// The subscriber id backing this stream.
    #[must_use]
    pub const fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    /// Receive the next snapshot (blocking).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Disconnected`] once the store side is gone
    /// and the queue has been drained.
    pub fn recv(&self) -> NotifyResult<Snapshot> {
        self.rx.recv().map_err(|_| NotifyError::Disconnected {
            context: "snapshot_stream",
        })
    }

    /// Receive the next snapshot with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Timeout`] when no commit arrives in time,
    /// or [`NotifyError::Disconnected`] once the store side is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> NotifyResult<Snapshot> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => NotifyError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            RecvTimeoutError::Disconnected => NotifyError::Disconnected {
                context: "snapshot_stream",
            },
        })
    }

    /// Receive the next snapshot without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Timeout`] (with a zero duration) when the
    /// queue is currently empty, or [`NotifyError::Disconnected`] once
    /// the store side is gone.
    pub fn try_recv(&self) -> NotifyResult<Snapshot> {
        self.rx.try_recv().map_err(|err| match err {
            TryRecvError::Empty => NotifyError::Timeout { duration_ms: 0 },
            TryRecvError::Disconnected => NotifyError::Disconnected {
                context: "snapshot_stream",
            },
        })
    }

    /// Best-effort explicit unregistration.
    ///
    /// Non-blocking and idempotent. After unregistration the subscriber
    /// receives no further commits; values already queued remain
    /// readable.
    pub fn unsubscribe(&self) {
        if self.unregistered.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(state) = self.store.upgrade() {
            ObservableStore::unregister(&state, self.id);
        }
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        if !self.unregistered.swap(true, Ordering::AcqRel) {
            if let Some(state) = self.store.upgrade() {
                ObservableStore::unregister(&state, self.id);
            }
        }
    }
}
