//! Notification records and identity management.
//!
//! The identity model is the prerequisite for everything in notistate.
//! The external source assigns a transport-level id to each notification
//! instance, but that id is reused and reassigned across reconnects, so
//! it cannot serve as a dedup key. Two observations are the *same logical
//! notification* iff `(title, body, origin)` are equal; everything else
//! is payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, NotifyResult};

/// Transport-level handle assigned by the external event source.
///
/// Source ids identify a notification *instance* on the wire, not a
/// logical notification: the source may reuse or reassign them across
/// disconnect/reconnect. They are carried for removal routing only and
/// are excluded from identity.
///
/// # Examples
///
/// ```
/// use notistate::SourceId;
///
/// let id = SourceId::from_raw(42);
/// assert_eq!(id.as_i64(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(i64);

impl SourceId {
    /// Wraps a raw source-assigned id.
    #[must_use]
    pub const fn from_raw(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying raw id.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SourceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for SourceId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl From<SourceId> for i64 {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

/// Stable namespace identifying a notification's origin.
///
/// Typically an application identifier (e.g. a reverse-DNS package
/// name). Unlike [`SourceId`], an origin id survives source reconnects
/// and participates in identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(String);

impl OriginId {
    /// Wraps an origin identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OriginId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OriginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The dedup key: `(title, body, origin)`.
///
/// Equality and hashing are defined over exactly these three fields.
/// Transport id, timestamps, icons, and display names never participate.
/// Title and body are a reasonable proxy for "the same underlying
/// condition reported again", which the source's own ids are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Notification title, if the source supplied one.
    pub title: Option<String>,
    /// Notification body text, if the source supplied one.
    pub body: Option<String>,
    /// Stable origin namespace.
    pub origin: OriginId,
}

impl IdentityKey {
    /// Builds a key from raw parts.
    #[must_use]
    pub fn new(title: Option<String>, body: Option<String>, origin: OriginId) -> Self {
        Self { title, body, origin }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.origin,
            self.title.as_deref().unwrap_or(""),
            self.body.as_deref().unwrap_or("")
        )
    }
}

/// One observed notification.
///
/// Records are immutable once built: a later observation with the same
/// identity *replaces* the record rather than mutating it, with the most
/// recent observation winning for payload fields.
///
/// # Examples
///
/// ```
/// use notistate::NotificationRecord;
///
/// let record = NotificationRecord::builder(1, "com.example.mail")
///     .title("New message")
///     .body("You have 3 unread messages")
///     .build()?;
/// assert_eq!(record.source_name, "com.example.mail");
/// # Ok::<(), notistate::NotifyError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Transport handle for the most recent observation.
    pub source_id: SourceId,

    /// Stable origin namespace.
    pub origin: OriginId,

    /// Human-readable origin name. Falls back to the raw origin
    /// identifier when no lookup result was supplied.
    pub source_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Binary icon payload, absent when the platform could not load one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,

    /// When this observation was made.
    pub observed_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Starts building a record for the given transport id and origin.
    #[must_use]
    pub fn builder(source_id: impl Into<SourceId>, origin: impl Into<OriginId>) -> RecordBuilder {
        RecordBuilder::new(source_id.into(), origin.into())
    }

    /// Returns the identity key this record deduplicates under.
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            title: self.title.clone(),
            body: self.body.clone(),
            origin: self.origin.clone(),
        }
    }

    /// Returns true if this record carries an icon payload.
    #[must_use]
    pub fn has_icon(&self) -> bool {
        self.icon.is_some()
    }
}

impl PartialEq for NotificationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.body == other.body && self.origin == other.origin
    }
}

impl Eq for NotificationRecord {}

impl std::hash::Hash for NotificationRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.body.hash(state);
        self.origin.hash(state);
    }
}

/// Builder for [`NotificationRecord`].
#[derive(Debug)]
pub struct RecordBuilder {
    source_id: SourceId,
    origin: OriginId,
    source_name: Option<String>,
    title: Option<String>,
    body: Option<String>,
    icon: Option<Vec<u8>>,
    observed_at: Option<DateTime<Utc>>,
}

impl RecordBuilder {
    fn new(source_id: SourceId, origin: OriginId) -> Self {
        Self {
            source_id,
            origin,
            source_name: None,
            title: None,
            body: None,
            icon: None,
            observed_at: None,
        }
    }

    /// Sets the resolved human-readable origin name.
    #[must_use]
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Sets the notification title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the notification body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the binary icon payload.
    #[must_use]
    pub fn icon(mut self, icon: Vec<u8>) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Sets the observation timestamp. Defaults to now.
    #[must_use]
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    /// Builds the record.
    ///
    /// When no `source_name` was supplied (the platform's origin-name
    /// lookup failed or was skipped), the raw origin identifier is used
    /// as the display name rather than failing the event.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EmptyOrigin`] when the origin identifier
    /// is empty, since such a record could never be deduplicated or
    /// attributed.
    pub fn build(self) -> NotifyResult<NotificationRecord> {
        if self.origin.is_empty() {
            return Err(NotifyError::EmptyOrigin);
        }

        let source_name = self
            .source_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.origin.as_str().to_string());

        Ok(NotificationRecord {
            source_id: self.source_id,
            origin: self.origin,
            source_name,
            title: self.title,
            body: self.body,
            icon: self.icon,
            observed_at: self.observed_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source_id: i64, origin: &str, title: &str, body: &str) -> NotificationRecord {
        NotificationRecord::builder(source_id, origin)
            .title(title)
            .body(body)
            .build()
            .unwrap()
    }

    #[test]
    fn test_source_id_roundtrip() {
        let id = SourceId::from_raw(7);
        assert_eq!(i64::from(id), 7);
        assert_eq!(format!("{id}"), "7");
    }

    #[test]
    fn test_identity_ignores_source_id_and_time() {
        let a = record(1, "com.x", "T", "B");
        let b = record(2, "com.x", "T", "B");
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_distinguishes_fields() {
        let base = record(1, "com.x", "T", "B");
        assert_ne!(base.identity(), record(1, "com.x", "T2", "B").identity());
        assert_ne!(base.identity(), record(1, "com.x", "T", "B2").identity());
        assert_ne!(base.identity(), record(1, "com.y", "T", "B").identity());
    }

    #[test]
    fn test_absent_title_and_body_still_identify() {
        let a = NotificationRecord::builder(1, "com.x").build().unwrap();
        let b = NotificationRecord::builder(9, "com.x").build().unwrap();
        assert_eq!(a.identity(), b.identity());
        assert!(a.title.is_none());
        assert!(a.body.is_none());
    }

    #[test]
    fn test_source_name_falls_back_to_origin() {
        let r = NotificationRecord::builder(1, "com.example.app")
            .title("T")
            .build()
            .unwrap();
        assert_eq!(r.source_name, "com.example.app");

        let named = NotificationRecord::builder(1, "com.example.app")
            .source_name("Example App")
            .build()
            .unwrap();
        assert_eq!(named.source_name, "Example App");
    }

    #[test]
    fn test_blank_source_name_falls_back_to_origin() {
        let r = NotificationRecord::builder(1, "com.example.app")
            .source_name("   ")
            .build()
            .unwrap();
        assert_eq!(r.source_name, "com.example.app");
    }

    #[test]
    fn test_empty_origin_rejected() {
        let err = NotificationRecord::builder(1, "").build().unwrap_err();
        assert!(matches!(err, NotifyError::EmptyOrigin));
    }

    #[test]
    fn test_record_serialization() {
        let r = record(3, "com.x", "Hi", "there");
        let json = serde_json::to_string(&r).unwrap();
        let back: NotificationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r.identity(), back.identity());
        assert_eq!(r.source_id, back.source_id);
    }

    #[test]
    fn test_icon_payload_excluded_from_identity() {
        let plain = record(1, "com.x", "T", "B");
        let iconed = NotificationRecord::builder(1, "com.x")
            .title("T")
            .body("B")
            .icon(vec![0xDE, 0xAD])
            .build()
            .unwrap();
        assert!(iconed.has_icon());
        assert_eq!(plain, iconed);
    }
}
