//! Sustained reliable traffic against an echo server

mod common;

use common::{make_client, start_echo_server};
use enet_tokio::{Event, EventKind, LoopbackNetwork};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const MESSAGE_COUNT: usize = 1000;
const PAYLOAD_SIZE: usize = 512;

#[tokio::test]
async fn thousand_reliable_messages_all_echoed() {
    let network = LoopbackNetwork::new();
    let (server_task, server_stop) = start_echo_server(&network, 18011);

    let mut client = make_client(&network, 18011);
    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    client.on(EventKind::Receive, move |_ctx, event| {
        if let Event::Receive { data, .. } = event {
            assert_eq!(data.len(), PAYLOAD_SIZE);
        }
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    });

    client
        .connect_with_timeout(Duration::from_secs(5))
        .await
        .expect("connection not confirmed");

    let payload = vec![0x61u8; PAYLOAD_SIZE];
    let mut accepted = 0usize;
    for _ in 0..MESSAGE_COUNT {
        if client.send_to_server(0, &payload, true) >= 0 {
            accepted += 1;
        }
    }
    assert_eq!(accepted, MESSAGE_COUNT, "sends were rejected");

    // drain until every echo came back
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while received.load(Ordering::Relaxed) < MESSAGE_COUNT {
        assert!(
            tokio::time::Instant::now() < deadline,
            "only {} of {} echoes arrived",
            received.load(Ordering::Relaxed),
            MESSAGE_COUNT
        );
        client.service(1).expect("client service failed");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(received.load(Ordering::Relaxed), MESSAGE_COUNT);
    let stats = client.stats();
    assert_eq!(stats.send_errors, 0);
    assert_eq!(stats.packets_sent, MESSAGE_COUNT as u64);
    assert_eq!(stats.packets_received, MESSAGE_COUNT as u64);
    assert_eq!(stats.bytes_sent, (MESSAGE_COUNT * PAYLOAD_SIZE) as u64);

    server_stop.stop();
    let _ = timeout(Duration::from_secs(5), server_task).await;
}
