use parley_client::{
    CallState, CoordinatorConfig, ReconnectPolicy, RelayClient, spawn_signal_pump,
};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    EVENT_TIMEOUT_MS, LOCAL_CANDIDATES, MockConnector, MockPeer, MockSignalingOutput, PeerCall,
    TestCall, create_call, spawn_relay, wait_for_members,
};

async fn join_relay(url: &str, tag: &str) -> (TestCall, tokio::task::JoinHandle<()>) {
    let (client, incoming) = RelayClient::connect(url, &ReconnectPolicy::default())
        .await
        .expect("Failed to connect to relay");
    let call = create_call(
        CoordinatorConfig::default(),
        MockConnector::new(tag, LOCAL_CANDIDATES),
        Arc::new(client),
        MockSignalingOutput::new_stored_only(),
    );
    let pump = spawn_signal_pump(Arc::clone(&call.coordinator), incoming);
    (call, pump)
}

async fn wait_for_applied(peer: &MockPeer, count: usize) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(EVENT_TIMEOUT_MS);
    loop {
        let applied = peer.applied();
        if applied.len() >= count || tokio::time::Instant::now() > deadline {
            return applied;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_two_parties_connect_through_relay() {
    init_tracing();

    let relay = spawn_relay().await.expect("Failed to start relay");
    let (mut alice, alice_pump) = join_relay(&relay.url, "alice").await;
    let (mut bob, bob_pump) = join_relay(&relay.url, "bob").await;

    alice.coordinator.start_call("x").await.expect("alice start");
    assert!(alice.wait_for_state(CallState::WaitingForPeer).await);
    wait_for_members(&relay.relay, "x", 1).await.expect("alice not in room");

    tokio::time::sleep(Duration::from_millis(100)).await;
    bob.coordinator.start_call("x").await.expect("bob start");

    assert!(alice.wait_for_state(CallState::Connected).await);
    assert!(bob.wait_for_state(CallState::Connected).await);

    // Bob's join welcomes alice, so she offers and he answers.
    let alice_peer = alice.connector.last_peer();
    let bob_peer = bob.connector.last_peer();
    assert_eq!(alice_peer.count(&PeerCall::CreateOffer), 1);
    assert_eq!(alice_peer.count(&PeerCall::CreateAnswer), 0);
    assert_eq!(bob_peer.count(&PeerCall::CreateOffer), 0);
    assert_eq!(bob_peer.count(&PeerCall::CreateAnswer), 1);

    let expected_from_bob: Vec<String> = (0..LOCAL_CANDIDATES)
        .map(|n| MockPeer::candidate_name("bob", n))
        .collect();
    let expected_from_alice: Vec<String> = (0..LOCAL_CANDIDATES)
        .map(|n| MockPeer::candidate_name("alice", n))
        .collect();

    assert_eq!(
        wait_for_applied(&alice_peer, LOCAL_CANDIDATES).await,
        expected_from_bob
    );
    assert_eq!(
        wait_for_applied(&bob_peer, LOCAL_CANDIDATES).await,
        expected_from_alice
    );

    // Nothing is applied twice.
    tokio::time::sleep(Duration::from_millis(crate::utils::SETTLE_MS)).await;
    assert_eq!(alice_peer.applied().len(), LOCAL_CANDIDATES);
    assert_eq!(bob_peer.applied().len(), LOCAL_CANDIDATES);

    alice.coordinator.end_call().await;
    bob.coordinator.end_call().await;
    relay.stop().await.expect("Relay failed");

    alice_pump.await.expect("alice pump panicked");
    bob_pump.await.expect("bob pump panicked");
}
