//! In-process echo demo: a server and a client sharing a loopback network.
//!
//! Run with: cargo run --example echo

use enet_tokio::{Client, Event, EventKind, HostConfig, LoopbackNetwork, Server};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let network = LoopbackNetwork::new();

    let mut server = Server::create(network.engine(), HostConfig::new().port(17091))?;
    server
        .on(EventKind::Ready, |ctx, _event| {
            info!(
                "server ready on {}:{}",
                ctx.config().address,
                ctx.config().port
            );
            Ok(())
        })
        .on(EventKind::Connect, |ctx, event| {
            if let Event::Connect { peer } = event {
                info!(%peer, "client connected");
                ctx.send(*peer, 0, b"Welcome to the server!", true);
            }
            Ok(())
        })
        .on(EventKind::Receive, |ctx, event| {
            if let Event::Receive {
                peer,
                channel,
                data,
            } = event
            {
                info!(%peer, "received: {}", String::from_utf8_lossy(data));
                ctx.send(*peer, *channel, data, true);
            }
            Ok(())
        })
        .on(EventKind::Disconnect, |_ctx, event| {
            if let Event::Disconnect { peer, reason } = event {
                info!(%peer, reason, "client disconnected");
            }
            Ok(())
        })
        .on(EventKind::Error, |_ctx, event| {
            if let Event::Error(err) = event {
                error!(error = %err, "server error");
            }
            Ok(())
        });

    let server_stop = server.stop_handle();
    let server_task = tokio::spawn(async move {
        let _ = server.listen().await;
    });

    let mut client = Client::create(network.engine(), HostConfig::new().port(17091))?;
    let echoes = Arc::new(AtomicUsize::new(0));
    let counter = echoes.clone();
    client
        .on(EventKind::Connect, |ctx, event| {
            if let Event::Connect { peer } = event {
                info!(%peer, "connected to server");
                ctx.send(*peer, 0, b"Hello, world!", true);
            }
            Ok(())
        })
        .on(EventKind::Receive, move |ctx, event| {
            if let Event::Receive { data, .. } = event {
                info!("server says: {}", String::from_utf8_lossy(data));
            }
            // stop after the welcome message and the echo
            if counter.fetch_add(1, Ordering::Relaxed) + 1 >= 2 {
                ctx.stop();
            }
            Ok(())
        })
        .on(EventKind::Error, |_ctx, event| {
            if let Event::Error(err) = event {
                error!(error = %err, "client error");
            }
            Ok(())
        });

    client.connect()?;
    tokio::time::timeout(Duration::from_secs(5), client.listen()).await??;

    client.disconnect_from_server(0);
    client.destroy();
    client.deinitialize();

    server_stop.stop();
    let _ = server_task.await;
    info!("done, {} messages echoed", echoes.load(Ordering::Relaxed));
    Ok(())
}
