//! Client role: unbound host with a single tracked server peer

use crate::common::{
    Event, EventKind, HostState, HostStats, PeerId, POLL_INTERVAL, SERVICE_TIMEOUT_MS,
};
use crate::config::HostConfig;
use crate::engine::TransportEngine;
use crate::error::{HostError, Result};
use crate::host::core::{Host, HostContext, StopHandle};
use crate::host::registry::PeerRecord;
use std::time::Duration;
use tracing::info;

/// A client host: creates an unbound transport host, initiates one outbound
/// connection, and tracks that connection as the server peer.
pub struct Client<E: TransportEngine> {
    host: Host<E>,
    server_peer: Option<PeerId>,
}

impl<E: TransportEngine> Client<E> {
    /// Construct, initialize, and create the unbound host in one step,
    /// reporting failure only through `error` events. Prefer
    /// [`create`](Self::create) to observe failures.
    pub fn new(engine: E, config: HostConfig) -> Self {
        let mut client = Self {
            host: Host::new(engine, config),
            server_peer: None,
        };
        if client.host.initialize() {
            let _ = client.create_host();
        }
        client
    }

    /// Factory combining construction and host creation, surfacing failure
    /// to the caller in addition to the `error` event.
    pub fn create(engine: E, config: HostConfig) -> Result<Self> {
        let mut client = Self {
            host: Host::new(engine, config),
            server_peer: None,
        };
        if !client.host.initialize() {
            return Err(HostError::initialization(
                "transport engine failed to initialize",
            ));
        }
        client.create_host()?;
        Ok(client)
    }

    /// Create the unbound (ephemeral) transport host. Usable again after
    /// [`destroy`](Self::destroy).
    pub fn create_host(&mut self) -> Result<()> {
        self.host.create_host(None)
    }

    /// Issue the single outbound connection to the configured address/port.
    /// On success the peer is recorded (unconnected until the `connect`
    /// event arrives) and tracked as the server peer.
    pub fn connect(&mut self) -> Result<PeerId> {
        let (address, port, channel_count) = {
            let config = self.host.config();
            (config.address.clone(), config.port, config.channel_limit)
        };
        let peer = self.host.connect_peer(&address, port, channel_count, 0)?;
        self.server_peer = Some(peer);
        info!(peer = %peer, address = %address, port, "connecting to server");
        Ok(peer)
    }

    /// Connect and drive the service loop until the server peer is
    /// confirmed or `timeout` elapses. On timeout the failure is dispatched
    /// as an `error` event and returned.
    pub async fn connect_with_timeout(&mut self, timeout: Duration) -> Result<PeerId> {
        let peer = match self.server_peer {
            Some(peer) => peer,
            None => self.connect()?,
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.host.service(SERVICE_TIMEOUT_MS)?;
            if self
                .host
                .peer(peer)
                .map_or(false, |record| record.connected)
            {
                return Ok(peer);
            }
            if tokio::time::Instant::now() >= deadline {
                let err = HostError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                };
                self.host.emit(Event::Error(err.clone()));
                return Err(err);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Connect (unless already connected) and run the polling loop until
    /// [`stop`](Self::stop), so the loop only ever observes the server
    /// peer's events.
    pub async fn listen(&mut self) -> Result<()> {
        if self.server_peer.is_none() {
            self.connect()?;
        }
        self.host.run().await;
        Ok(())
    }

    /// Send framed data to the tracked server peer. Fails with a
    /// "not connected" `error` event and `-1` when no server peer is set.
    pub fn send_to_server(&mut self, channel: u8, data: &[u8], reliable: bool) -> i32 {
        match self.server_peer {
            Some(peer) => self.host.send(peer, channel, data, reliable),
            None => {
                self.host.emit(Event::Error(HostError::NotConnected));
                -1
            }
        }
    }

    /// Send a pre-built payload to the server peer with explicit flags.
    /// Same failure contract as [`send_to_server`](Self::send_to_server).
    pub fn send_raw_to_server(&mut self, channel: u8, data: &[u8], packet_flags: u32) -> i32 {
        match self.server_peer {
            Some(peer) => self.host.send_raw(peer, channel, data, packet_flags),
            None => {
                self.host.emit(Event::Error(HostError::NotConnected));
                -1
            }
        }
    }

    /// Disconnect from the tracked server peer and clear the tracking.
    /// Fails with a "not connected" `error` event when no peer is set.
    pub fn disconnect_from_server(&mut self, reason: u32) {
        match self.server_peer.take() {
            Some(peer) => self.host.disconnect(peer, reason),
            None => self.host.emit(Event::Error(HostError::NotConnected)),
        }
    }

    /// The tracked server peer, if a connection was initiated
    pub fn server_peer(&self) -> Option<PeerId> {
        self.server_peer
    }

    /// Whether the server peer's connection has been confirmed
    pub fn is_connected(&self) -> bool {
        self.server_peer
            .and_then(|peer| self.host.peer(peer))
            .map_or(false, |record| record.connected)
    }

    /// Register a callback. Returns the client for chaining.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> &mut Self
    where
        F: FnMut(&mut HostContext<E>, &Event) -> Result<()> + Send + 'static,
    {
        self.host.on(kind, callback);
        self
    }

    /// Register a callback removed after its first invocation
    pub fn once<F>(&mut self, kind: EventKind, callback: F) -> &mut Self
    where
        F: FnMut(&mut HostContext<E>, &Event) -> Result<()> + Send + 'static,
    {
        self.host.once(kind, callback);
        self
    }

    /// Dispatch a synthetic event to subscribers
    pub fn emit(&mut self, event: Event) {
        self.host.emit(event);
    }

    /// Poll the engine once; see [`Host::service`]
    pub fn service(&mut self, timeout_ms: u32) -> Result<Option<Event>> {
        self.host.service(timeout_ms)
    }

    /// Send framed data to an arbitrary peer; see [`Host::send`]
    pub fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], reliable: bool) -> i32 {
        self.host.send(peer, channel, data, reliable)
    }

    /// Send a pre-built payload to an arbitrary peer; see [`Host::send_raw`]
    pub fn send_raw(&mut self, peer: PeerId, channel: u8, data: &[u8], packet_flags: u32) -> i32 {
        self.host.send_raw(peer, channel, data, packet_flags)
    }

    /// Disconnect an arbitrary peer; see [`Host::disconnect`]
    pub fn disconnect(&mut self, peer: PeerId, reason: u32) {
        self.host.disconnect(peer, reason);
    }

    /// Push queued packets out
    pub fn flush(&mut self) {
        self.host.flush();
    }

    /// Stop the polling loop at its next iteration boundary
    pub fn stop(&self) {
        self.host.stop();
    }

    /// A cloneable stop flag for loops owned by another task
    pub fn stop_handle(&self) -> StopHandle {
        self.host.stop_handle()
    }

    /// Release the transport host; see [`Host::destroy`]
    pub fn destroy(&mut self) {
        self.host.destroy();
        self.server_peer = None;
    }

    /// Tear down the engine subsystem
    pub fn deinitialize(&mut self) {
        self.host.deinitialize();
        self.server_peer = None;
    }

    pub fn state(&self) -> HostState {
        self.host.state()
    }

    pub fn config(&self) -> &HostConfig {
        self.host.config()
    }

    pub fn stats(&self) -> &HostStats {
        self.host.stats()
    }

    /// Look up a peer record
    pub fn peer(&self, peer: PeerId) -> Option<&PeerRecord> {
        self.host.peer(peer)
    }

    /// Number of known peers
    pub fn peer_count(&self) -> usize {
        self.host.peer_count()
    }

    /// Read-only access to the engine handle
    pub fn engine(&self) -> &E {
        self.host.engine()
    }

    /// The shared host core, for operations without a role-level delegate
    pub fn host(&self) -> &Host<E> {
        &self.host
    }

    /// Mutable access to the shared host core
    pub fn host_mut(&mut self) -> &mut Host<E> {
        &mut self.host
    }
}
