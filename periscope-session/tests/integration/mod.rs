//! Integration tests for periscope_session.
//!
//! Tests are organized by functionality:
//! - `room_tests` - room documents and viewer counting against the store
//! - `signaling_tests` - candidate relay and negotiation over the store
//! - `session_tests` - broadcaster and viewer controllers end to end

pub mod session_tests;
pub mod signaling_tests;
