use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which peer discovered a candidate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateDirection {
    Broadcaster,
    Viewer,
}

impl CandidateDirection {
    /// The direction a peer listens on when it publishes under `self`.
    pub fn opposite(self) -> Self {
        match self {
            Self::Broadcaster => Self::Viewer,
            Self::Viewer => Self::Broadcaster,
        }
    }
}

impl fmt::Display for CandidateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcaster => f.write_str("broadcaster"),
            Self::Viewer => f.write_str("viewer"),
        }
    }
}

/// Candidate descriptor in the browser's `RTCIceCandidateInit` JSON shape.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidatePayload {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// A candidate as stored in the room's candidate sub-collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateRecord {
    pub room_id: RoomId,
    pub direction: CandidateDirection,
    pub payload: IceCandidatePayload,
    /// Insertion order within one room/direction pair. Only used to detect
    /// gaps and duplicates, never to order application.
    pub sequence: u64,
}
