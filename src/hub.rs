//! External interface tying the engine to the store.
//!
//! The platform's notification listener drives a [`NotificationHub`]
//! with one event per callback; presentation layers read from it via
//! [`NotificationHub::subscribe`] or [`NotificationHub::current`]. The
//! hub serializes writers through a mutex, so a source that delivers
//! events serially observes strict arrival-order application, and even
//! overlapping callers can never interleave two applies.

use std::fmt::Display;
use std::sync::Mutex;

use log::warn;

use crate::error::{NotifyError, NotifyResult};
use crate::event::SourceEvent;
use crate::record::{NotificationRecord, SourceId};
use crate::reconcile::Reconciler;
use crate::snapshot::Snapshot;
use crate::store::{ObservableStore, SnapshotStream};

/// The reconciliation engine and observable store behind one facade.
///
/// # Examples
///
/// ```
/// use notistate::{NotificationHub, NotificationRecord};
///
/// let hub = NotificationHub::new();
/// let record = NotificationRecord::builder(1, "com.example.mail")
///     .title("New message")
///     .build()?;
/// let snapshot = hub.on_posted(record)?;
/// assert_eq!(snapshot.len(), 1);
/// # Ok::<(), notistate::NotifyError>(())
/// ```
#[derive(Debug)]
pub struct NotificationHub {
    reconciler: Mutex<Reconciler>,
    store: ObservableStore,
}

impl NotificationHub {
    /// Creates a hub holding the empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reconciler: Mutex::new(Reconciler::new()),
            store: ObservableStore::new(),
        }
    }

    /// Applies one source event and commits the resulting snapshot.
    ///
    /// Events are applied strictly in arrival order; the write lock
    /// serializes overlapping callers. No event kind is an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if a previous writer
    /// panicked mid-apply. When the poisoning is on the store side, the
    /// engine has already absorbed the event: subscribers were not
    /// notified, but the next successful apply commits a snapshot that
    /// includes it.
    pub fn apply(&self, event: SourceEvent) -> NotifyResult<Snapshot> {
        let mut reconciler = self
            .reconciler
            .lock()
            .map_err(|_| NotifyError::LockPoisoned { context: "hub.apply" })?;

        reconciler.apply(event);
        let snapshot = reconciler.snapshot();
        self.store.commit(snapshot.clone())?;
        Ok(snapshot)
    }

    /// A notification appeared (or was re-posted).
    ///
    /// # Errors
    ///
    /// See [`NotificationHub::apply`].
    pub fn on_posted(&self, record: NotificationRecord) -> NotifyResult<Snapshot> {
        self.apply(SourceEvent::Posted { record })
    }

    /// A notification disappeared, keyed by transport id. Unknown ids
    /// are a no-op.
    ///
    /// # Errors
    ///
    /// See [`NotificationHub::apply`].
    pub fn on_removed(&self, source_id: impl Into<SourceId>) -> NotifyResult<Snapshot> {
        self.apply(SourceEvent::Removed {
            source_id: source_id.into(),
        })
    }

    /// The source reported its full set of active items; replaces the
    /// authoritative set.
    ///
    /// # Errors
    ///
    /// See [`NotificationHub::apply`].
    pub fn on_resynced(&self, snapshot: Vec<NotificationRecord>) -> NotifyResult<Snapshot> {
        self.apply(SourceEvent::Resynced { snapshot })
    }

    /// The source disconnected; the set becomes empty.
    ///
    /// # Errors
    ///
    /// See [`NotificationHub::apply`].
    pub fn on_cleared(&self) -> NotifyResult<Snapshot> {
        self.apply(SourceEvent::Cleared)
    }

    /// The source (re)connected: enumerate its active items and resync.
    ///
    /// An enumeration failure leaves the prior set untouched, because an
    /// empty result here is ambiguous between "no notifications" and
    /// "enumeration unavailable". A failure is logged and the unchanged
    /// current snapshot is returned. This differs from
    /// [`NotificationHub::on_cleared`], which is an explicit,
    /// unambiguous disconnect signal.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if an internal lock is
    /// poisoned. Enumeration failures are *not* surfaced as errors.
    pub fn on_connected<E, F>(&self, enumerate: F) -> NotifyResult<Snapshot>
    where
        E: Display,
        F: FnOnce() -> Result<Vec<NotificationRecord>, E>,
    {
        match enumerate() {
            Ok(snapshot) => self.on_resynced(snapshot),
            Err(err) => {
                warn!("resync enumeration failed, keeping prior state: {err}");
                self.current()
            }
        }
    }

    /// Registers a subscriber; see [`crate::SnapshotStream`] for the
    /// replay contract.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if the store lock is
    /// poisoned.
    pub fn subscribe(&self) -> NotifyResult<SnapshotStream> {
        self.store.subscribe()
    }

    /// Synchronous point-in-time read of the committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::LockPoisoned`] if the store lock is
    /// poisoned.
    pub fn current(&self) -> NotifyResult<Snapshot> {
        self.store.current()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
