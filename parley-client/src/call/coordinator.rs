use crate::CallError;
use crate::call::call_session::{CallSession, SessionChannels};
use crate::call::{CallEvent, CallState};
use crate::config::CoordinatorConfig;
use crate::media::MediaSource;
use crate::peer::PeerConnector;
use crate::signaling::SignalingOutput;
use parley_core::{RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Relay messages buffered per membership before `handle_signal` waits.
const SIGNAL_QUEUE_DEPTH: usize = 256;

struct ActiveCall {
    room: RoomId,
    signal_tx: mpsc::Sender<SignalMessage>,
    cancel_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Drives the local side of a two-party call.
///
/// At most one membership is active. Each runs as its own session task;
/// the coordinator routes relay messages to it and tears it down.
pub struct Coordinator {
    config: CoordinatorConfig,
    connector: Arc<dyn PeerConnector>,
    media: Arc<dyn MediaSource>,
    signaling: Arc<dyn SignalingOutput>,
    events_tx: mpsc::UnboundedSender<CallEvent>,
    state_tx: watch::Sender<CallState>,
    active: Mutex<Option<ActiveCall>>,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        connector: Arc<dyn PeerConnector>,
        media: Arc<dyn MediaSource>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> (Self, mpsc::UnboundedReceiver<CallEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(CallState::Idle);

        let coordinator = Self {
            config,
            connector,
            media,
            signaling,
            events_tx,
            state_tx,
            active: Mutex::new(None),
        };
        (coordinator, events_rx)
    }

    pub fn state(&self) -> CallState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<CallState> {
        self.state_tx.subscribe()
    }

    pub async fn room(&self) -> Option<RoomId> {
        self.active.lock().await.as_ref().map(|call| call.room.clone())
    }

    /// Joins `room`. Repeating the call for the room already joined is a
    /// no-op; a different room ends the current call first.
    ///
    /// Only failures to acquire media or build the peer connection are
    /// returned. Everything after that is reported through [`CallEvent`].
    pub async fn start_call(&self, room: impl Into<RoomId>) -> Result<(), CallError> {
        let room = room.into();
        if room.is_empty() {
            return Err(CallError::EmptyRoom);
        }

        let mut active = self.active.lock().await;

        if let Some(call) = active.as_ref()
            && call.room == room
            && !call.task.is_finished()
        {
            debug!("Already in room '{}', ignoring start_call", room);
            return Ok(());
        }

        if let Some(previous) = active.take() {
            info!("Leaving '{}' to join '{}'", previous.room, room);
            teardown(previous).await;
        }

        self.set_state(CallState::Joining);

        let media = match self.media.acquire(&self.config.media).await {
            Ok(media) => media,
            Err(e) => return Err(self.abort_start(e)),
        };

        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let peer = match self.connector.connect(&media, peer_tx).await {
            Ok(peer) => peer,
            Err(e) => {
                let err = CallError::negotiation("create peer connection", e);
                return Err(self.abort_start(err));
            }
        };

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE_DEPTH);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let session = CallSession::new(
            room.clone(),
            peer,
            Arc::clone(&self.signaling),
            SessionChannels {
                signal_rx,
                peer_rx,
                events: self.events_tx.clone(),
                state_tx: self.state_tx.clone(),
            },
            self.config.handshake_timeout,
        );
        let task = tokio::spawn(session.run(cancel_rx));

        *active = Some(ActiveCall {
            room,
            signal_tx,
            cancel_tx,
            task,
        });
        Ok(())
    }

    /// Ends the active call, if any, and waits for it to release its peer
    /// connection. Later messages for that room are ignored.
    pub async fn end_call(&self) {
        let Some(call) = self.active.lock().await.take() else {
            debug!("end_call with no active call");
            return;
        };
        info!("Ending call in '{}'", call.room);
        teardown(call).await;
    }

    /// Routes a relay message to the membership for its room.
    pub async fn handle_signal(&self, msg: SignalMessage) {
        let signal_tx = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(call) if call.room == *msg.room() => call.signal_tx.clone(),
                _ => {
                    debug!("No call in '{}', ignoring {}", msg.room(), msg.kind());
                    return;
                }
            }
        };

        if let Err(e) = signal_tx.send(msg).await {
            debug!("Call already closed, ignoring {}", e.0.kind());
        }
    }

    fn set_state(&self, state: CallState) {
        self.state_tx.send_replace(state);
        let _ = self.events_tx.send(CallEvent::StateChanged(state));
    }

    fn abort_start(&self, err: CallError) -> CallError {
        error!("Failed to start call: {}", err);
        self.set_state(CallState::Closed);
        let _ = self.events_tx.send(CallEvent::Closed(Some(err.clone())));
        err
    }
}

async fn teardown(call: ActiveCall) {
    let _ = call.cancel_tx.send(());
    if let Err(e) = call.task.await
        && e.is_panic()
    {
        error!("Call session for '{}' panicked", call.room);
    }
}

/// Feeds relay messages into `coordinator` until `incoming` closes.
pub fn spawn_signal_pump(
    coordinator: Arc<Coordinator>,
    mut incoming: mpsc::UnboundedReceiver<SignalMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = incoming.recv().await {
            coordinator.handle_signal(msg).await;
        }
        debug!("Signal pump finished");
    })
}
