use anyhow::Result;
use async_trait::async_trait;
use parley_client::SignalingOutput;
use parley_core::{SignalKind, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// SignalingOutput that records everything a coordinator sends.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<SignalMessage>,
    signals: Arc<Mutex<Vec<SignalMessage>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Signals are only stored.
    pub fn new_stored_only() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn get_signals(&self) -> Vec<SignalMessage> {
        self.signals.lock().await.clone()
    }

    pub async fn count(&self, kind: SignalKind) -> usize {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| s.kind() == kind)
            .count()
    }

    /// First signal of `kind`, polling until `timeout_ms` elapses.
    pub async fn wait_for(&self, kind: SignalKind, timeout_ms: u64) -> Option<SignalMessage> {
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        loop {
            if let Some(msg) = self
                .signals
                .lock()
                .await
                .iter()
                .find(|s| s.kind() == kind)
                .cloned()
            {
                return Some(msg);
            }
            if start.elapsed() > timeout {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_signal(&self, msg: SignalMessage) -> Result<()> {
        tracing::debug!("[MockSignaling] send {} to '{}'", msg.kind(), msg.room());

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_join() {
        let (signaling, mut rx) = MockSignalingOutput::new();

        signaling.send_join(&"x".into()).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg, SignalMessage::join("x"));
        assert_eq!(signaling.count(SignalKind::Join).await, 1);
    }
}
