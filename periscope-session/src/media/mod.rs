mod local_media;
mod remote_media;

pub use local_media::*;
pub use remote_media::*;
