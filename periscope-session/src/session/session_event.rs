use crate::store::RoomChange;
use periscope_core::{IceCandidatePayload, RoomId};

/// Store-side input to the session loop.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Room(RoomChange),
    RemoteCandidate(IceCandidatePayload),
}

/// Why a session stopped without the caller asking it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The room document was deleted, usually because the broadcaster left.
    RoomDeleted,
    /// The peer transport failed or disconnected. Join again to recover.
    TransportLost,
    /// Applying the remote description failed.
    NegotiationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnded {
    pub room_id: RoomId,
    pub reason: EndReason,
}
