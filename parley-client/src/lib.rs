mod call;
mod config;
mod error;
pub mod media;
pub mod peer;
pub mod signaling;

pub use call::*;
pub use config::*;
pub use error::CallError;
pub use media::{MediaConstraints, MediaSource, StaticMediaSource};
pub use peer::{PeerConnection, PeerConnector, WebrtcConnector};
pub use signaling::{RelayClient, SignalingOutput};
