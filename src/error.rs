//! Error types for notistate.
//!
//! The reconciliation core is deliberately non-fatal: malformed or
//! late-arriving source events are absorbed as no-ops rather than
//! surfaced as errors. What remains is a small taxonomy of plumbing
//! failures, strongly typed with thiserror.

use thiserror::Error;

/// Top-level error type for notistate operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A record was built with an empty origin identifier.
    #[error("origin identifier cannot be empty")]
    EmptyOrigin,

    /// An internal lock was poisoned by a panicking writer.
    #[error("poisoned lock: {context}")]
    LockPoisoned {
        /// Which lock acquisition failed.
        context: &'static str,
    },

    /// The other end of a subscription stream is gone.
    #[error("stream disconnected: {context}")]
    Disconnected {
        /// Which stream endpoint disconnected.
        context: &'static str,
    },

    /// A blocking receive timed out.
    #[error("receive timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout duration that elapsed, in milliseconds.
        duration_ms: u64,
    },
}

impl NotifyError {
    /// Returns true if this error reports a poisoned lock.
    #[must_use]
    pub const fn is_lock_poisoned(&self) -> bool {
        matches!(self, Self::LockPoisoned { .. })
    }

    /// Returns true if this error reports a disconnected stream.
    #[must_use]
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }

    /// Returns true if this error reports a receive timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for notistate operations.
pub type NotifyResult<T> = Result<T, NotifyError>;
