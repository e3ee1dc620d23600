mod observers;
mod peer_session;
mod session_controller;
mod session_event;
mod session_loop;
mod store_undo;

pub use peer_session::Role;
pub use session_controller::*;
pub use session_event::{EndReason, SessionEnded};
