use parley_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{
    SIGNAL_TIMEOUT_MS, SILENCE_TIMEOUT_MS, TestClient, spawn_relay, wait_for_members,
};

#[tokio::test]
async fn test_second_peer_welcomes_first() {
    init_tracing();

    let relay = spawn_relay().await.expect("Failed to start relay");
    let mut client1 = TestClient::connect(&relay.url).await.expect("connect 1");
    let mut client2 = TestClient::connect(&relay.url).await.expect("connect 2");

    client1.send(&SignalMessage::join("x")).await.expect("join 1");
    wait_for_members(&relay.relay, "x", 1).await.expect("join 1 lost");

    client2.send(&SignalMessage::join("x")).await.expect("join 2");
    wait_for_members(&relay.relay, "x", 2).await.expect("join 2 lost");

    assert_eq!(
        client1.recv_timeout(SIGNAL_TIMEOUT_MS).await,
        Some(SignalMessage::welcome("x"))
    );
    assert!(client1.recv_timeout(SILENCE_TIMEOUT_MS).await.is_none());
    assert!(client2.recv_timeout(SILENCE_TIMEOUT_MS).await.is_none());

    client1.close().await.expect("close 1");
    client2.close().await.expect("close 2");
    relay.stop().await.expect("Relay failed");
}

#[tokio::test]
async fn test_repeated_join_is_silent() {
    init_tracing();

    let relay = spawn_relay().await.expect("Failed to start relay");
    let mut client1 = TestClient::connect(&relay.url).await.expect("connect 1");
    let mut client2 = TestClient::connect(&relay.url).await.expect("connect 2");

    client1.send(&SignalMessage::join("x")).await.expect("join 1");
    wait_for_members(&relay.relay, "x", 1).await.expect("join 1 lost");
    client2.send(&SignalMessage::join("x")).await.expect("join 2");
    client2.send(&SignalMessage::join("x")).await.expect("join 2 again");

    assert_eq!(
        client1.recv_timeout(SIGNAL_TIMEOUT_MS).await,
        Some(SignalMessage::welcome("x"))
    );
    assert!(client1.recv_timeout(SILENCE_TIMEOUT_MS).await.is_none());

    client1.close().await.expect("close 1");
    client2.close().await.expect("close 2");
    relay.stop().await.expect("Relay failed");
}
