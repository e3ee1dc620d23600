mod candidate;
mod room;
mod signaling;

#[cfg(not(target_arch = "wasm32"))]
mod conversions;

pub use candidate::{CandidateDirection, IceCandidatePayload, IceCandidateRecord};
pub use room::{Room, RoomId};
pub use signaling::{IceServerConfig, SdpType, SessionDescription};
