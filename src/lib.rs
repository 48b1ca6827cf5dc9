//! # notistate - a live, deduplicated notification state store
//!
//! notistate maintains the authoritative in-memory view of "currently
//! active" notifications surfaced by an external event source (an OS
//! notification stream), keeping that view consistent across incremental
//! events (an item appears or disappears) and lifecycle events (the
//! source resynchronizes or disconnects).
//!
//! ## Core Concepts
//!
//! - **`NotificationRecord`**: one observed notification
//! - **`IdentityKey`**: the `(title, body, origin)` triple two
//!   observations deduplicate under, independent of transport id
//! - **`Snapshot`**: an immutable committed view of the authoritative set
//! - **`NotificationHub`**: the engine + store facade the platform
//!   listener drives and presentation layers subscribe to
//!
//! ## Usage
//!
//! ```rust
//! use notistate::{NotificationHub, NotificationRecord};
//!
//! let hub = NotificationHub::new();
//!
//! let record = NotificationRecord::builder(1, "com.example.mail")
//!     .source_name("Mail")
//!     .title("New message")
//!     .body("You have 3 unread messages")
//!     .build()?;
//!
//! let stream = hub.subscribe()?;
//! hub.on_posted(record)?;
//!
//! let initial = stream.recv()?; // the value at registration time
//! let updated = stream.recv()?; // the post
//! assert!(initial.is_empty());
//! assert_eq!(updated.len(), 1);
//! # Ok::<(), notistate::NotifyError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod hub;
pub mod logging;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod store;

// Re-export primary types at crate root for convenience
pub use error::{NotifyError, NotifyResult};
pub use event::SourceEvent;
pub use hub::NotificationHub;
pub use reconcile::Reconciler;
pub use record::{IdentityKey, NotificationRecord, OriginId, RecordBuilder, SourceId};
pub use snapshot::Snapshot;
pub use store::{ObservableStore, SnapshotStream, SubscriberId};
