//! Signaling and session orchestration for one broadcaster and one viewer
//! per room, using a shared document store in place of a signaling server.

mod error;
mod media;
mod negotiation;
mod room;
mod session;
mod signaling;
mod store;
mod transport;

pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use room::*;
pub use session::*;
pub use signaling::*;
pub use store::*;
pub use transport::*;
