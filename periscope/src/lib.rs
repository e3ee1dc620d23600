pub use periscope_core::model::RoomId;

pub mod model {
    pub use periscope_core::model::*;
}

pub mod defaults {
    pub use periscope_core::utils::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use periscope_session::*;
}
