use crate::media::LocalMedia;
use crate::peer::{PeerEvent, SignalingState};
use anyhow::Result;
use async_trait::async_trait;
use parley_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// Label of the data channel the offerer opens before creating its offer.
pub const DATA_CHANNEL_LABEL: &str = "dataChannel";

/// The media engine's view of one peer-to-peer session.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn create_data_channel(&self, label: &str) -> Result<()>;

    fn signaling_state(&self) -> SignalingState;

    async fn has_remote_description(&self) -> bool;

    async fn close(&self) -> Result<()>;
}

/// Builds a [`PeerConnection`] for each call membership.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// `media` tracks are attached before returning. Callbacks from the new
    /// connection are delivered through `events`.
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>>;
}
