use parley_core::{IceCandidate, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{
    SIGNAL_TIMEOUT_MS, SILENCE_TIMEOUT_MS, TestClient, spawn_relay, wait_for_members,
};

#[tokio::test]
async fn test_peer_leaves_others_stay() {
    init_tracing();

    let relay = spawn_relay().await.expect("Failed to start relay");
    let mut client1 = TestClient::connect(&relay.url).await.expect("connect 1");
    let mut client2 = TestClient::connect(&relay.url).await.expect("connect 2");
    let mut client3 = TestClient::connect(&relay.url).await.expect("connect 3");

    for client in [&mut client1, &mut client2, &mut client3] {
        client.send(&SignalMessage::join("x")).await.expect("join");
    }
    wait_for_members(&relay.relay, "x", 3).await.expect("joins lost");

    client1.close().await.expect("close 1");
    wait_for_members(&relay.relay, "x", 2)
        .await
        .expect("Peer 1 should have left");

    // No departure notice: the remaining members only ever saw welcomes.
    while let Some(msg) = client2.recv_timeout(SILENCE_TIMEOUT_MS).await {
        assert!(matches!(msg, SignalMessage::Welcome { .. }));
    }
    while let Some(msg) = client3.recv_timeout(SILENCE_TIMEOUT_MS).await {
        assert!(matches!(msg, SignalMessage::Welcome { .. }));
    }

    let ice = SignalMessage::ice("x", IceCandidate::new("candidate:after-leave"));
    client2.send(&ice).await.expect("send ice");
    assert_eq!(client3.recv_timeout(SIGNAL_TIMEOUT_MS).await, Some(ice));

    client2.close().await.expect("close 2");
    client3.close().await.expect("close 3");
    wait_for_members(&relay.relay, "x", 0).await.expect("room not emptied");
    assert_eq!(relay.relay.room_count(), 0);

    relay.stop().await.expect("Relay failed");
}
