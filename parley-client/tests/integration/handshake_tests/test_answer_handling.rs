use parley_client::{CallError, CallEvent, CallState};
use parley_core::{SdpType, SessionDescription, SignalKind, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{PeerCall, create_test_call, dropped};

#[tokio::test]
async fn test_stale_answer_is_dropped() {
    init_tracing();

    let mut call = create_test_call();
    call.coordinator.start_call("x").await.expect("start_call");
    assert!(call.wait_for_state(CallState::WaitingForPeer).await);
    let _ = call.drain_events().await;

    // No offer was sent, so the peer is still stable.
    call.coordinator
        .handle_signal(SignalMessage::answer("x", "answer-from-remote"))
        .await;

    let events = call.drain_events().await;
    assert_eq!(events.len(), 1, "{events:?}");
    assert!(matches!(
        events[0],
        CallEvent::Dropped(CallError::ProtocolViolation {
            kind: SignalKind::Answer,
            ..
        })
    ));

    let peer = call.connector.last_peer();
    assert!(peer.calls().is_empty(), "{:?}", peer.calls());
    assert_eq!(call.coordinator.state(), CallState::WaitingForPeer);
}

#[tokio::test]
async fn test_malformed_answer_is_reported_once() {
    init_tracing();

    let mut call = create_test_call();
    call.coordinator.start_call("x").await.expect("start_call");
    call.coordinator
        .handle_signal(SignalMessage::welcome("x"))
        .await;
    assert!(call.wait_for_state(CallState::Offering).await);
    let _ = call.drain_events().await;

    call.coordinator
        .handle_signal(SignalMessage::Answer {
            room: "x".into(),
            payload: Some(SessionDescription {
                sdp_type: Some(SdpType::Answer),
                sdp: Some(String::new()),
            }),
        })
        .await;

    let events = call.drain_events().await;
    assert_eq!(events.len(), 1, "{events:?}");
    assert!(matches!(
        events[0],
        CallEvent::Dropped(CallError::MalformedMessage {
            kind: SignalKind::Answer,
            ..
        })
    ));
    assert_eq!(call.coordinator.state(), CallState::Offering);

    let peer = call.connector.last_peer();
    assert_eq!(peer.count(&PeerCall::SetRemote(SdpType::Answer)), 0);

    // A well-formed answer still completes the handshake.
    call.coordinator
        .handle_signal(SignalMessage::answer("x", "answer-from-remote"))
        .await;
    assert!(call.wait_for_state(CallState::Connected).await);
}

#[tokio::test]
async fn test_duplicate_answer_is_dropped() {
    init_tracing();

    let mut call = create_test_call();
    call.coordinator.start_call("x").await.expect("start_call");
    call.coordinator
        .handle_signal(SignalMessage::welcome("x"))
        .await;
    call.coordinator
        .handle_signal(SignalMessage::answer("x", "answer-from-remote"))
        .await;
    assert!(call.wait_for_state(CallState::Connected).await);
    let _ = call.drain_events().await;

    call.coordinator
        .handle_signal(SignalMessage::answer("x", "answer-from-remote"))
        .await;

    let events = call.drain_events().await;
    assert_eq!(dropped(&events).len(), 1, "{events:?}");

    let peer = call.connector.last_peer();
    assert_eq!(peer.count(&PeerCall::SetRemote(SdpType::Answer)), 1);
    assert_eq!(call.coordinator.state(), CallState::Connected);
}
