use anyhow::Result;
use async_trait::async_trait;
use parley_core::{IceCandidate, RoomId, SessionDescription, SignalMessage};

/// Outgoing half of the relay link.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, msg: SignalMessage) -> Result<()>;

    async fn send_join(&self, room: &RoomId) -> Result<()> {
        self.send_signal(SignalMessage::join(room.clone())).await
    }

    async fn send_offer(&self, room: &RoomId, offer: SessionDescription) -> Result<()> {
        self.send_signal(SignalMessage::Offer {
            room: room.clone(),
            payload: Some(offer),
        })
        .await
    }

    async fn send_answer(&self, room: &RoomId, answer: SessionDescription) -> Result<()> {
        self.send_signal(SignalMessage::Answer {
            room: room.clone(),
            payload: Some(answer),
        })
        .await
    }

    async fn send_ice(&self, room: &RoomId, candidate: IceCandidate) -> Result<()> {
        self.send_signal(SignalMessage::ice(room.clone(), candidate))
            .await
    }
}
