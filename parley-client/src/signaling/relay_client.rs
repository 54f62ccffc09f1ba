use crate::config::ReconnectPolicy;
use crate::signaling::SignalingOutput;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::SignalMessage;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// WebSocket link to a signaling relay.
///
/// Cloning shares the link. It closes once every clone is dropped.
#[derive(Clone)]
pub struct RelayClient {
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl RelayClient {
    /// Connects to `url`, retrying per `policy`. Messages from the relay
    /// arrive on the returned receiver, which closes with the socket.
    pub async fn connect(
        url: &str,
        policy: &ReconnectPolicy,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>)> {
        let (ws, _) = retry_with_backoff(|| connect_async(url), policy, "connect to relay").await?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<SignalMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize {} message: {}", msg.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!("Relay send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match SignalMessage::from_json(text.as_str()) {
                        Ok(msg) => {
                            if in_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid message from relay: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay connection error: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl SignalingOutput for RelayClient {
    async fn send_signal(&self, msg: SignalMessage) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|e| anyhow!("relay link closed, dropped {} message", e.0.kind()))
    }
}

/// Runs `operation` up to `policy.max_attempts` times, sleeping with
/// exponential backoff between attempts.
pub(crate) async fn retry_with_backoff<T, E, F, Fut>(
    operation: F,
    policy: &ReconnectPolicy,
    operation_name: &str,
) -> Result<T>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if policy.max_attempts == 0 {
        bail!("max_attempts must be > 0 to {}", operation_name);
    }

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_attempts => {
                bail!(
                    "Failed to {} after {} attempts: {}",
                    operation_name,
                    attempt,
                    e
                );
            }
            Err(e) => {
                let delay = policy.backoff(attempt);
                warn!(
                    "Attempt {}/{} to {} failed: {}. Retrying in {:?}",
                    attempt, policy.max_attempts, operation_name, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
