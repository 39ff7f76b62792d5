//! End-to-end echo scenarios over the loopback engine

mod common;

use common::{make_client, start_echo_server};
use enet_tokio::{Event, EventKind, LoopbackNetwork};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

#[derive(Default)]
struct EchoProbe {
    connected: bool,
    connected_before_echo: bool,
    registry_connected_at_event: bool,
    received: Option<Vec<u8>>,
}

#[tokio::test]
async fn echo_roundtrip_on_dedicated_port() {
    let network = LoopbackNetwork::new();
    let (server_task, server_stop) = start_echo_server(&network, 18001);

    let mut client = make_client(&network, 18001);
    let probe = Arc::new(Mutex::new(EchoProbe::default()));

    let on_connect = probe.clone();
    client.on(EventKind::Connect, move |ctx, event| {
        let mut probe = on_connect.lock().unwrap();
        probe.connected = true;
        if let Event::Connect { peer } = event {
            // the registry must already reflect the event
            probe.registry_connected_at_event =
                ctx.peer(*peer).map(|record| record.connected) == Some(true);
            ctx.send(*peer, 0, b"ping", true);
        }
        Ok(())
    });

    let on_receive = probe.clone();
    client.on(EventKind::Receive, move |ctx, event| {
        if let Event::Receive { data, .. } = event {
            let mut probe = on_receive.lock().unwrap();
            probe.connected_before_echo = probe.connected;
            probe.received = Some(data.to_vec());
        }
        ctx.stop();
        Ok(())
    });

    client.connect().expect("connect failed");
    timeout(Duration::from_secs(10), client.listen())
        .await
        .expect("echo did not arrive in time")
        .expect("client loop failed");

    let probe = probe.lock().unwrap();
    assert!(probe.connected, "client never saw the connect event");
    assert!(
        probe.connected_before_echo,
        "echo arrived before the connect event"
    );
    assert!(probe.registry_connected_at_event);
    assert_eq!(probe.received.as_deref(), Some(&b"ping"[..]));

    server_stop.stop();
    let _ = timeout(Duration::from_secs(5), server_task).await;
}

#[tokio::test]
async fn multiple_messages_echo_in_order() {
    let network = LoopbackNetwork::new();
    let (server_task, server_stop) = start_echo_server(&network, 18002);

    let mut client = make_client(&network, 18002);
    let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    client.on(EventKind::Receive, move |_ctx, event| {
        if let Event::Receive { data, .. } = event {
            sink.lock().unwrap().push(data.to_vec());
        }
        Ok(())
    });

    client
        .connect_with_timeout(Duration::from_secs(5))
        .await
        .expect("connection not confirmed");
    assert!(client.is_connected());

    let messages: [&[u8]; 3] = [b"first", b"second", b"third"];
    for message in &messages {
        assert!(client.send_to_server(0, message, true) >= 0);
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while received.lock().unwrap().len() < messages.len() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "echoes did not all arrive"
        );
        client.service(1).expect("client service failed");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0], b"first");
    assert_eq!(received[1], b"second");
    assert_eq!(received[2], b"third");

    server_stop.stop();
    let _ = timeout(Duration::from_secs(5), server_task).await;
}
