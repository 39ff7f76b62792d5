//! # enet-tokio — host/peer lifecycle over a reliable-UDP engine
//!
//! An async host and event-dispatch layer for ENet-style transport engines.
//! The engine (an external collaborator behind the [`TransportEngine`]
//! trait) owns connection establishment, sequencing, retransmission,
//! congestion control, compression, and checksums; this crate decides when
//! the engine is polled, how its raw events become structured application
//! events, and what peer state is tracked between polls.
//!
//! ## Features
//!
//! - **Role objects**: [`Server`] (bind, accept, `ready` event) and
//!   [`Client`] (single outbound connection with convenience send/disconnect)
//!   composing a shared [`Host`] core
//! - **Chainable subscriptions**: `on`/`once` per event kind, dispatched in
//!   registration order with per-callback failure isolation
//! - **Cooperative polling**: a bounded service call plus a scheduler yield
//!   per iteration; `stop()` takes effect at the next iteration boundary
//! - **Peer registry**: engine-assigned opaque handles mapped to
//!   address/port/connected records, updated before subscribers run
//! - **Raw packets**: a fixed-capacity little-endian [`PacketBuilder`] for
//!   structured payloads, reusable via `reset()`
//! - **In-process engine**: [`LoopbackEngine`] for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enet_tokio::{Client, Event, EventKind, HostConfig, LoopbackNetwork, Server};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let network = LoopbackNetwork::new();
//!
//!     // echo server
//!     let mut server = Server::create(network.engine(), HostConfig::new().port(17091))?;
//!     server.on(EventKind::Receive, |ctx, event| {
//!         if let Event::Receive { peer, channel, data } = event {
//!             ctx.send(*peer, *channel, data, true);
//!         }
//!         Ok(())
//!     });
//!     let server_stop = server.stop_handle();
//!     tokio::spawn(async move {
//!         let _ = server.listen().await;
//!     });
//!
//!     // client: ping once, stop after the echo arrives
//!     let mut client = Client::create(network.engine(), HostConfig::new().port(17091))?;
//!     client
//!         .on(EventKind::Connect, |ctx, event| {
//!             if let Event::Connect { peer } = event {
//!                 ctx.send(*peer, 0, b"ping", true);
//!             }
//!             Ok(())
//!         })
//!         .on(EventKind::Receive, |ctx, _event| {
//!             ctx.stop();
//!             Ok(())
//!         });
//!     client.connect()?;
//!     tokio::time::timeout(Duration::from_secs(5), client.listen()).await??;
//!
//!     server_stop.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │   Roles                   │  Server, Client
//! ├───────────────────────────┤
//! │   Host Core               │  state machine, service loop,
//! │                           │  peer registry, event dispatch
//! ├───────────────────────────┤
//! │   Engine Boundary         │  TransportEngine trait
//! ├───────────────────────────┤
//! │   Reliable-UDP Engine     │  external (LoopbackEngine in-process)
//! └───────────────────────────┘
//! ```
//!
//! One logical thread of control drives each host: the registry, dispatcher,
//! and state are owned exclusively by the host instance, and all mutation
//! funnels through `service`, `send`, `disconnect`, and `destroy`. Because
//! dispatch is synchronous within the poll that produced the event,
//! subscribers must not block, or they stall all traffic on that host.

pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod loopback;
pub mod packet;

// Re-exports
pub use common::{flags, Event, EventKind, HostState, HostStats, PeerId};
pub use config::HostConfig;
pub use engine::{BindConfig, HostOptions, TransportEngine, TransportEvent};
pub use error::{HostError, Result};
pub use host::{Client, Host, HostContext, PeerRecord, PeerRegistry, Server, StopHandle};
pub use loopback::{LoopbackEngine, LoopbackNetwork};
pub use packet::PacketBuilder;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
