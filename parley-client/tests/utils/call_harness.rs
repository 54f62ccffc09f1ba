use crate::utils::{MockConnector, MockSignalingOutput};
use parley_client::{
    CallEvent, CallState, Coordinator, CoordinatorConfig, SignalingOutput, StaticMediaSource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Timeout for something that should happen (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

/// How long to wait before concluding nothing more will happen (ms).
pub const SETTLE_MS: u64 = 200;

/// Local candidates each mock peer generates.
pub const LOCAL_CANDIDATES: usize = 5;

/// A coordinator wired to mock collaborators.
pub struct TestCall {
    pub coordinator: Arc<Coordinator>,
    pub events: mpsc::UnboundedReceiver<CallEvent>,
    pub state: watch::Receiver<CallState>,
    pub signaling: MockSignalingOutput,
    pub connector: MockConnector,
}

pub fn create_test_call() -> TestCall {
    create_test_call_with(CoordinatorConfig::default())
}

pub fn create_test_call_with(config: CoordinatorConfig) -> TestCall {
    let signaling = MockSignalingOutput::new_stored_only();
    let connector = MockConnector::new("local", LOCAL_CANDIDATES);
    create_call(
        config,
        connector.clone(),
        Arc::new(signaling.clone()),
        signaling,
    )
}

pub fn create_call(
    config: CoordinatorConfig,
    connector: MockConnector,
    output: Arc<dyn SignalingOutput>,
    signaling: MockSignalingOutput,
) -> TestCall {
    let (coordinator, events) = Coordinator::new(
        config,
        Arc::new(connector.clone()),
        Arc::new(StaticMediaSource::default()),
        output,
    );
    let state = coordinator.watch_state();

    TestCall {
        coordinator: Arc::new(coordinator),
        events,
        state,
        signaling,
        connector,
    }
}

impl TestCall {
    /// Waits until the call is in `target`. Returns false on timeout.
    pub async fn wait_for_state(&mut self, target: CallState) -> bool {
        tokio::time::timeout(
            Duration::from_millis(EVENT_TIMEOUT_MS),
            self.state.wait_for(|s| *s == target),
        )
        .await
        .is_ok_and(|r| r.is_ok())
    }

    /// Events received until nothing new arrives for [`SETTLE_MS`].
    pub async fn drain_events(&mut self) -> Vec<CallEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(SETTLE_MS), self.events.recv()).await
        {
            events.push(event);
        }
        events
    }

    /// Next event matching `pred`, skipping others.
    pub async fn wait_for_event<F>(&mut self, pred: F) -> Option<CallEvent>
    where
        F: Fn(&CallEvent) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) if pred(&event) => return Some(event),
                Ok(Some(_)) => continue,
                _ => return None,
            }
        }
    }
}

pub fn dropped(events: &[CallEvent]) -> Vec<&CallEvent> {
    events
        .iter()
        .filter(|e| matches!(e, CallEvent::Dropped(_)))
        .collect()
}
