use parley_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{SILENCE_TIMEOUT_MS, TestClient, spawn_relay, wait_for_members};

#[tokio::test]
async fn test_separate_rooms_are_isolated() {
    init_tracing();

    let relay = spawn_relay().await.expect("Failed to start relay");
    let mut client1 = TestClient::connect(&relay.url).await.expect("connect 1");
    let mut client2 = TestClient::connect(&relay.url).await.expect("connect 2");

    client1.send(&SignalMessage::join("red")).await.expect("join red");
    client2.send(&SignalMessage::join("blue")).await.expect("join blue");
    wait_for_members(&relay.relay, "red", 1).await.expect("red lost");
    wait_for_members(&relay.relay, "blue", 1).await.expect("blue lost");

    client1
        .send(&SignalMessage::offer("red", "v=0"))
        .await
        .expect("send offer");

    assert!(client1.recv_timeout(SILENCE_TIMEOUT_MS).await.is_none());
    assert!(client2.recv_timeout(SILENCE_TIMEOUT_MS).await.is_none());
    assert_eq!(relay.relay.room_count(), 2);

    client1.close().await.expect("close 1");
    client2.close().await.expect("close 2");
    relay.stop().await.expect("Relay failed");
}
