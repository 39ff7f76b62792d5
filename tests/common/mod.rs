//! Shared helpers for host integration tests

use enet_tokio::{
    Client, Event, EventKind, HostConfig, LoopbackEngine, LoopbackNetwork, Server, StopHandle,
};
use tokio::task::JoinHandle;

/// Spawn an echo server on `port`, returning its loop task and stop handle.
pub fn start_echo_server(network: &LoopbackNetwork, port: u16) -> (JoinHandle<()>, StopHandle) {
    let mut server = Server::create(network.engine(), HostConfig::new().port(port))
        .expect("failed to create echo server");

    server.on(EventKind::Receive, |ctx, event| {
        if let Event::Receive {
            peer,
            channel,
            data,
        } = event
        {
            ctx.send(*peer, *channel, data, true);
        }
        Ok(())
    });

    let stop = server.stop_handle();
    let task = tokio::spawn(async move {
        let _ = server.listen().await;
    });
    (task, stop)
}

/// Create a client pointed at `port` on the shared network.
pub fn make_client(network: &LoopbackNetwork, port: u16) -> Client<LoopbackEngine> {
    Client::create(network.engine(), HostConfig::new().port(port))
        .expect("failed to create client")
}
