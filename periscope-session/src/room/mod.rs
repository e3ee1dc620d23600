mod room_registry;
mod viewer_counter;

pub use room_registry::*;
pub use viewer_counter::*;
