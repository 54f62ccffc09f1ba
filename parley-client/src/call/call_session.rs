use crate::CallError;
use crate::call::{CallEvent, CallState, CandidateQueue};
use crate::peer::{
    DATA_CHANNEL_LABEL, PeerConnection, PeerEvent, SignalingState, TransportState,
};
use crate::signaling::SignalingOutput;
use parley_core::{IceCandidate, RoomId, SdpType, SessionDescription, SignalKind, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

enum Input {
    Signal(SignalMessage),
    Peer(PeerEvent),
    Deadline,
}

/// Actor driving one room membership through the handshake.
///
/// Relay messages and peer callbacks are handled one at a time, so no two
/// handshake steps overlap. Cancellation drops whichever step is in flight.
pub(crate) struct CallSession {
    room: RoomId,
    state: CallState,
    peer: Box<dyn PeerConnection>,
    candidates: CandidateQueue,
    signaling: Arc<dyn SignalingOutput>,

    signal_rx: mpsc::Receiver<SignalMessage>,
    peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    peer_events_open: bool,

    events: mpsc::UnboundedSender<CallEvent>,
    state_tx: watch::Sender<CallState>,

    handshake_timeout: Option<Duration>,
    deadline: Option<Instant>,
    close_reason: Option<CallError>,
}

pub(crate) struct SessionChannels {
    pub signal_rx: mpsc::Receiver<SignalMessage>,
    pub peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    pub events: mpsc::UnboundedSender<CallEvent>,
    pub state_tx: watch::Sender<CallState>,
}

impl CallSession {
    pub(crate) fn new(
        room: RoomId,
        peer: Box<dyn PeerConnection>,
        signaling: Arc<dyn SignalingOutput>,
        channels: SessionChannels,
        handshake_timeout: Option<Duration>,
    ) -> Self {
        Self {
            room,
            state: CallState::Joining,
            peer,
            candidates: CandidateQueue::new(),
            signaling,
            signal_rx: channels.signal_rx,
            peer_rx: channels.peer_rx,
            peer_events_open: true,
            events: channels.events,
            state_tx: channels.state_tx,
            handshake_timeout,
            deadline: None,
            close_reason: None,
        }
    }

    /// Runs until the membership closes or `cancel` fires (or its sender is
    /// dropped).
    pub(crate) async fn run(mut self, mut cancel: oneshot::Receiver<()>) {
        info!("Call session for '{}' started", self.room);

        tokio::select! {
            _ = &mut cancel => {
                info!("Call for '{}' cancelled before join", self.room);
                self.close().await;
                return;
            }
            _ = self.join() => {}
        }

        while self.state != CallState::Closed {
            let deadline = self.deadline;
            let input = tokio::select! {
                _ = &mut cancel => {
                    info!("Ending call in '{}'", self.room);
                    break;
                }
                _ = sleep_until(deadline) => Input::Deadline,
                msg = self.signal_rx.recv() => match msg {
                    Some(msg) => Input::Signal(msg),
                    None => {
                        info!("Signal channel closed. Ending call in '{}'", self.room);
                        break;
                    }
                },
                evt = self.peer_rx.recv(), if self.peer_events_open => match evt {
                    Some(evt) => Input::Peer(evt),
                    None => {
                        debug!("Peer event channel closed");
                        self.peer_events_open = false;
                        continue;
                    }
                },
            };

            tokio::select! {
                _ = &mut cancel => {
                    info!("Ending call in '{}' mid-step", self.room);
                    break;
                }
                _ = self.handle(input) => {}
            }
        }

        self.close().await;
    }

    async fn join(&mut self) {
        match self.signaling.send_join(&self.room).await {
            Ok(()) => self.set_state(CallState::WaitingForPeer),
            Err(e) => self.fail(CallError::Signaling(format!("{e:#}"))),
        }
    }

    async fn handle(&mut self, input: Input) {
        match input {
            Input::Signal(msg) => self.handle_signal(msg).await,
            Input::Peer(evt) => self.handle_peer_event(evt).await,
            Input::Deadline => {
                let timeout = self.handshake_timeout.unwrap_or_default();
                self.fail(CallError::NegotiationTimeout(timeout));
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        if msg.room() != &self.room {
            debug!(
                "Ignoring {} for room '{}' while in '{}'",
                msg.kind(),
                msg.room(),
                self.room
            );
            return;
        }

        match msg {
            SignalMessage::Welcome { .. } => self.on_welcome().await,
            SignalMessage::Offer { payload, .. } => self.on_offer(payload).await,
            SignalMessage::Answer { payload, .. } => self.on_answer(payload).await,
            SignalMessage::IceCandidate { payload, .. } => self.on_remote_candidate(payload).await,
            SignalMessage::Join { .. } => {
                self.drop_message(CallError::violation(
                    SignalKind::Join,
                    "join is never delivered to clients",
                ));
            }
        }
    }

    /// Another member was already present: this side offers.
    async fn on_welcome(&mut self) {
        if !self.state.awaits_handshake() {
            self.drop_message(CallError::violation(
                SignalKind::Welcome,
                format!("call is already {}", self.state),
            ));
            return;
        }

        info!("Peer present in '{}', creating offer", self.room);
        match self.make_offer().await {
            Ok(()) => {
                self.set_state(CallState::Offering);
                self.arm_deadline();
            }
            Err(e) => self.fail(e),
        }
    }

    async fn make_offer(&mut self) -> Result<(), CallError> {
        self.peer
            .create_data_channel(DATA_CHANNEL_LABEL)
            .await
            .map_err(|e| CallError::negotiation("create data channel", e))?;
        let offer = self
            .peer
            .create_offer()
            .await
            .map_err(|e| CallError::negotiation("create offer", e))?;
        self.peer
            .set_local_description(offer.clone())
            .await
            .map_err(|e| CallError::negotiation("set local offer", e))?;
        self.signaling
            .send_offer(&self.room, offer)
            .await
            .map_err(|e| CallError::Signaling(format!("{e:#}")))
    }

    /// The other member offered first: this side answers.
    async fn on_offer(&mut self, payload: Option<SessionDescription>) {
        let offer = match validate_description(SignalKind::Offer, payload, SdpType::Offer) {
            Ok(offer) => offer,
            Err(e) => return self.drop_message(e),
        };

        let signaling = self.peer.signaling_state();
        if signaling != SignalingState::Stable {
            self.drop_message(CallError::violation(
                SignalKind::Offer,
                format!("signaling state is {signaling}"),
            ));
            return;
        }
        if !self.state.awaits_handshake() {
            self.drop_message(CallError::violation(
                SignalKind::Offer,
                format!("call is already {}", self.state),
            ));
            return;
        }

        info!("Received offer in '{}', answering", self.room);
        match self.make_answer(offer).await {
            Ok(()) => {
                self.set_state(CallState::Negotiating);
                self.arm_deadline();
            }
            Err(e) => self.fail(e),
        }
    }

    async fn make_answer(&mut self, offer: SessionDescription) -> Result<(), CallError> {
        self.peer
            .set_remote_description(offer)
            .await
            .map_err(|e| CallError::negotiation("set remote offer", e))?;
        self.drain_candidates().await;

        let answer = self
            .peer
            .create_answer()
            .await
            .map_err(|e| CallError::negotiation("create answer", e))?;
        self.peer
            .set_local_description(answer.clone())
            .await
            .map_err(|e| CallError::negotiation("set local answer", e))?;
        self.signaling
            .send_answer(&self.room, answer)
            .await
            .map_err(|e| CallError::Signaling(format!("{e:#}")))
    }

    async fn on_answer(&mut self, payload: Option<SessionDescription>) {
        let answer = match validate_description(SignalKind::Answer, payload, SdpType::Answer) {
            Ok(answer) => answer,
            Err(e) => return self.drop_message(e),
        };

        let signaling = self.peer.signaling_state();
        if signaling != SignalingState::HaveLocalOffer {
            self.drop_message(CallError::violation(
                SignalKind::Answer,
                format!("stale answer while signaling state is {signaling}"),
            ));
            return;
        }

        if let Err(e) = self.peer.set_remote_description(answer).await {
            self.fail(CallError::negotiation("set remote answer", e));
            return;
        }
        self.drain_candidates().await;

        info!("Answer applied in '{}'", self.room);
        self.set_state(CallState::Connected);
        self.deadline = None;
    }

    async fn on_remote_candidate(&mut self, payload: Option<IceCandidate>) {
        let Some(candidate) = payload else {
            self.drop_message(CallError::malformed(
                SignalKind::IceCandidate,
                "missing candidate",
            ));
            return;
        };

        if self.peer.has_remote_description().await {
            self.apply_candidate(candidate).await;
            return;
        }

        if self.candidates.push(candidate).is_err() {
            self.drop_message(CallError::CandidateApplication(
                "candidate queue is full".into(),
            ));
        } else {
            debug!(
                "Queued remote candidate ({} pending)",
                self.candidates.len()
            );
        }
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) {
        if let Err(e) = self.peer.add_ice_candidate(candidate).await {
            self.drop_message(CallError::CandidateApplication(format!("{e:#}")));
        }
    }

    /// Applies queued candidates in arrival order. A failure is reported for
    /// that candidate only.
    async fn drain_candidates(&mut self) {
        let pending = self.candidates.drain();
        if pending.is_empty() {
            return;
        }
        debug!("Applying {} queued candidate(s)", pending.len());
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
    }

    async fn handle_peer_event(&mut self, evt: PeerEvent) {
        match evt {
            PeerEvent::LocalCandidate(candidate) => {
                if let Err(e) = self.signaling.send_ice(&self.room, candidate).await {
                    warn!("Failed to send local candidate: {:#}", e);
                }
            }
            PeerEvent::GatheringState(state) => {
                debug!("ICE gathering state: {:?}", state);
            }
            PeerEvent::TransportState(TransportState::Connected) => {
                if self.state == CallState::Negotiating {
                    self.set_state(CallState::Connected);
                    self.deadline = None;
                }
            }
            PeerEvent::TransportState(TransportState::Failed) => {
                self.fail(CallError::Negotiation {
                    step: "ice connectivity",
                    reason: "peer connection failed".into(),
                });
            }
            PeerEvent::TransportState(TransportState::Disconnected) => {
                warn!("Peer transport disconnected in '{}'", self.room);
            }
            PeerEvent::TransportState(state) => {
                debug!("Peer transport state: {:?}", state);
            }
            PeerEvent::RemoteTrack(track) => {
                info!("Remote {} track {} arrived", track.kind, track.id);
                let _ = self.events.send(CallEvent::RemoteMedia(track));
            }
            PeerEvent::DataChannel(label) => {
                debug!("Remote data channel '{}' opened", label);
            }
        }
    }

    fn arm_deadline(&mut self) {
        self.deadline = self.handshake_timeout.map(|t| Instant::now() + t);
    }

    fn set_state(&mut self, state: CallState) {
        if self.state == state {
            return;
        }
        info!("Call in '{}': {} -> {}", self.room, self.state, state);
        self.state = state;
        self.state_tx.send_replace(state);
        let _ = self.events.send(CallEvent::StateChanged(state));
    }

    /// Reports a message that was not acted on. The call continues.
    fn drop_message(&mut self, err: CallError) {
        warn!("Dropped message in '{}': {}", self.room, err);
        let _ = self.events.send(CallEvent::Dropped(err));
    }

    fn fail(&mut self, err: CallError) {
        error!("Call in '{}' failed: {}", self.room, err);
        self.close_reason = Some(err);
        self.set_state(CallState::Closed);
    }

    async fn close(&mut self) {
        if let Err(e) = self.peer.close().await {
            warn!("Error closing peer connection: {:#}", e);
        }
        self.candidates.clear();
        self.deadline = None;
        self.set_state(CallState::Closed);
        let _ = self.events.send(CallEvent::Closed(self.close_reason.take()));
        info!("Call session for '{}' finished", self.room);
    }
}

/// Checks an offer or answer carries both a type and a body of the
/// expected type.
fn validate_description(
    kind: SignalKind,
    payload: Option<SessionDescription>,
    expected: SdpType,
) -> Result<SessionDescription, CallError> {
    let Some(desc) = payload else {
        return Err(CallError::malformed(kind, "missing description"));
    };
    let Some(sdp_type) = desc.sdp_type else {
        return Err(CallError::malformed(kind, "missing description type"));
    };
    if desc.body().is_none() {
        return Err(CallError::malformed(kind, "missing description body"));
    }
    if sdp_type != expected {
        return Err(CallError::malformed(
            kind,
            format!("expected {expected} description, got {sdp_type}"),
        ));
    }
    Ok(desc)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
