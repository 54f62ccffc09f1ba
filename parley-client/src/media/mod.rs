mod media_source;
mod static_source;

pub use media_source::*;
pub use static_source::StaticMediaSource;
