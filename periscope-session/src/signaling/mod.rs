mod candidate_relay;
mod subscription;

pub use candidate_relay::*;
pub use subscription::*;
