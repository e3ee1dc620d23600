use periscope_core::IceCandidatePayload;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Events the peer transport raises for the session that owns it.
pub enum TransportEvent {
    /// A local candidate was gathered and should be relayed to the other peer.
    CandidateGenerated(IceCandidatePayload),

    /// The remote peer started sending a media track.
    TrackReceived(Arc<TrackRemote>),

    /// The underlying connection reached the connected state.
    Connected,

    /// The underlying connection failed or the remote side went away.
    Lost,
}

impl std::fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CandidateGenerated(c) => f.debug_tuple("CandidateGenerated").field(c).finish(),
            Self::TrackReceived(t) => f.debug_tuple("TrackReceived").field(&t.id()).finish(),
            Self::Connected => f.write_str("Connected"),
            Self::Lost => f.write_str("Lost"),
        }
    }
}
