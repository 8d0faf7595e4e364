//! Event envelope types delivered by a [`crate::broker::Broker`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle tag carried by every [`Event`].
///
/// The taxonomy is closed for this crate's own use (`Created`/`Updated`/
/// `Deleted`) but extensible by a host: `Other` carries any tag a consumer
/// must accept without failing, matching spec.md's requirement that unknown
/// kinds never be rejected. Serializes/deserializes as a plain lowercase
/// string rather than a tagged enum so an unrecognized wire value round
/// trips into `Other` instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    /// A host-defined kind outside the closed set above.
    Other(String),
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "created" => EventKind::Created,
            "updated" => EventKind::Updated,
            "deleted" => EventKind::Deleted,
            _ => EventKind::Other(tag),
        })
    }
}

impl EventKind {
    /// The normative wire name for this kind (`created`, `updated`,
    /// `deleted`, or the host-supplied tag verbatim).
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Other(tag) => tag,
        }
    }
}

/// An immutable `(kind, payload)` pair delivered by the broker.
///
/// `Event` carries no identity of its own; identity, if needed, lives in
/// `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T> {
    pub kind: EventKind,
    pub payload: T,
}

impl<T> Event<T> {
    pub fn new(kind: EventKind, payload: T) -> Self {
        Self { kind, payload }
    }

    pub fn created(payload: T) -> Self {
        Self::new(EventKind::Created, payload)
    }

    pub fn updated(payload: T) -> Self {
        Self::new(EventKind::Updated, payload)
    }

    pub fn deleted(payload: T) -> Self {
        Self::new(EventKind::Deleted, payload)
    }
}
