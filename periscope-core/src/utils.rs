/// Public STUN endpoints used when no relay/reflection servers are configured.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun2.l.google.com:19302";

/// Candidate pool size requested from the transport by default.
pub const DEFAULT_ICE_CANDIDATE_POOL_SIZE: u8 = 10;
