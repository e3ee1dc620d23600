use crate::model::signaling::SessionDescription;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque room identifier. Rooms created locally get a random UUID, but any
/// id handed out by the shared store is accepted as-is.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted record of one broadcast session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub offer: Option<SessionDescription>,
    pub answer: Option<SessionDescription>,
    pub viewer_count: u32,
}

impl Room {
    /// A fresh room holding the broadcaster's offer and no viewers.
    pub fn with_offer(id: RoomId, offer: SessionDescription) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id,
            created_at,
            offer: Some(offer),
            answer: None,
            viewer_count: 0,
        }
    }

    pub fn has_answer(&self) -> bool {
        self.answer.is_some()
    }
}
