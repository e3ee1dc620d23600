use periscope_core::IceServerConfig;
use periscope_core::utils::{DEFAULT_ICE_CANDIDATE_POOL_SIZE, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use serde::{Deserialize, Serialize};

/// Settings handed to every peer transport at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// STUN/TURN endpoints. Empty means host candidates only.
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_candidate_pool_size: u8,
    /// Gather 127.0.0.1 host candidates, so two peers on one machine can
    /// connect without any other interface.
    pub include_loopback_candidates: bool,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// No relay or reflection servers. Used for loopback and tests.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
            ice_candidate_pool_size: 0,
            include_loopback_candidates: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun([DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2])],
            ice_candidate_pool_size: DEFAULT_ICE_CANDIDATE_POOL_SIZE,
            include_loopback_candidates: false,
        }
    }
}
