//! Client-role conveniences and failure reporting

mod common;

use common::{make_client, start_echo_server};
use enet_tokio::{Client, Event, EventKind, HostConfig, HostError, LoopbackNetwork, Server};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

fn collect_errors(
    client: &mut Client<enet_tokio::LoopbackEngine>,
) -> Arc<Mutex<Vec<HostError>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    client.on(EventKind::Error, move |_ctx, event| {
        if let Event::Error(err) = event {
            sink.lock().unwrap().push(err.clone());
        }
        Ok(())
    });
    errors
}

#[test]
fn send_to_server_before_connect_reports_not_connected() {
    let network = LoopbackNetwork::new();
    let mut client = make_client(&network, 18031);
    let errors = collect_errors(&mut client);

    assert_eq!(client.send_to_server(0, b"hello", true), -1);
    assert_eq!(client.send_raw_to_server(0, b"hello", 1), -1);

    let errors = errors.lock().unwrap();
    assert!(matches!(
        errors.as_slice(),
        [HostError::NotConnected, HostError::NotConnected]
    ));
}

#[test]
fn disconnect_from_server_without_peer_reports_not_connected() {
    let network = LoopbackNetwork::new();
    let mut client = make_client(&network, 18032);
    let errors = collect_errors(&mut client);

    client.disconnect_from_server(0);
    assert!(matches!(
        errors.lock().unwrap().as_slice(),
        [HostError::NotConnected]
    ));
}

#[test]
fn connect_to_unbound_port_is_refused_and_reported() {
    let network = LoopbackNetwork::new();
    let mut client = make_client(&network, 18033);
    let errors = collect_errors(&mut client);

    let err = client.connect().expect_err("nothing is bound on the port");
    assert!(matches!(err, HostError::Engine { .. }));
    assert!(client.server_peer().is_none());
    assert!(matches!(
        errors.lock().unwrap().as_slice(),
        [HostError::Engine { .. }]
    ));
}

#[tokio::test]
async fn connect_with_timeout_reports_elapsed_deadline() {
    let network = LoopbackNetwork::new();
    // bound but never listening: the handshake is never serviced, so the
    // confirmation cannot arrive
    let _server = Server::create(network.engine(), HostConfig::new().port(18034))
        .expect("server should bind");

    let mut client = make_client(&network, 18034);
    let err = client
        .connect_with_timeout(Duration::from_millis(50))
        .await
        .expect_err("confirmation cannot arrive");
    assert!(matches!(err, HostError::Timeout { .. }));

    // the outbound request itself was issued and is still tracked
    assert!(client.server_peer().is_some());
    assert!(!client.is_connected());
}

#[tokio::test]
async fn disconnect_from_server_clears_tracking() {
    let network = LoopbackNetwork::new();
    let (server_task, server_stop) = start_echo_server(&network, 18035);

    let mut client = make_client(&network, 18035);
    let errors = collect_errors(&mut client);

    client
        .connect_with_timeout(Duration::from_secs(5))
        .await
        .expect("connection not confirmed");
    assert!(client.is_connected());
    assert_eq!(client.peer_count(), 1);

    client.disconnect_from_server(0);
    assert!(client.server_peer().is_none());
    assert!(!client.is_connected());
    assert_eq!(client.peer_count(), 0);
    assert!(errors.lock().unwrap().is_empty());

    // conveniences now fail through the not-connected path again
    assert_eq!(client.send_to_server(0, b"late", true), -1);
    assert!(matches!(
        errors.lock().unwrap().as_slice(),
        [HostError::NotConnected]
    ));

    server_stop.stop();
    let _ = timeout(Duration::from_secs(5), server_task).await;
}
