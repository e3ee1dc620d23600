use crate::negotiation::NegotiationState;
use periscope_core::RoomId;

/// Errors reported by the shared document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found")]
    NotFound,

    /// A conditional write found the slot already filled.
    #[error("write conflict")]
    Conflict,
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing store could not be reached. The whole create/join call can
    /// be retried.
    #[error("signaling store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room's single answer slot is already taken by another viewer.
    #[error("room {0} already has a viewer")]
    RoomAlreadyHasViewer(RoomId),

    #[error("`{operation}` is not valid in negotiation state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: NegotiationState,
    },

    #[error("peer transport lost")]
    TransportLost,

    /// No outbound tracks to broadcast (capture denied or never started).
    #[error("local media unavailable")]
    LocalMediaUnavailable,

    #[error("negotiation failed: {0:#}")]
    Negotiation(#[from] anyhow::Error),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::StoreUnavailable(_))
    }

    /// Short text suitable for showing to the person at the screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::StoreUnavailable(_) => "connection problem, please try again",
            SessionError::RoomNotFound(_) => "stream ended or invalid link",
            SessionError::RoomAlreadyHasViewer(_) => "unable to join",
            SessionError::LocalMediaUnavailable => "camera or microphone is not available",
            SessionError::TransportLost => "connection to the stream was lost",
            SessionError::InvalidState { .. } | SessionError::Negotiation(_) => {
                "unable to connect to the stream"
            }
        }
    }

    /// Maps a store failure observed while operating on `room_id`.
    pub(crate) fn from_store(err: StoreError, room_id: &RoomId) -> Self {
        match err {
            StoreError::Unavailable(reason) => SessionError::StoreUnavailable(reason),
            StoreError::NotFound => SessionError::RoomNotFound(room_id.clone()),
            StoreError::Conflict => SessionError::RoomAlreadyHasViewer(room_id.clone()),
        }
    }
}
