//! Server role: bound host accepting inbound peers

use crate::common::{Event, EventKind, HostState, HostStats, PeerId};
use crate::config::HostConfig;
use crate::engine::TransportEngine;
use crate::error::{HostError, Result};
use crate::host::core::{Host, HostContext, StopHandle};
use crate::host::registry::PeerRecord;
use tracing::info;

/// A server host: binds to the configured address/port, accepts inbound
/// peers, and emits `ready` once before its polling loop starts.
///
/// Composes [`Host`] rather than extending it; role-specific behavior wraps
/// the shared core explicitly.
pub struct Server<E: TransportEngine> {
    host: Host<E>,
    ready_emitted: bool,
}

impl<E: TransportEngine> Server<E> {
    /// Construct, initialize, and bind in one step, reporting failure only
    /// through `error` events (which have no subscribers yet at this point —
    /// prefer [`create`](Self::create) to observe failures).
    pub fn new(engine: E, config: HostConfig) -> Self {
        let mut server = Self {
            host: Host::new(engine, config),
            ready_emitted: false,
        };
        if server.host.initialize() {
            let _ = server.create_host();
        }
        server
    }

    /// Factory combining construction and host creation, surfacing failure
    /// to the caller in addition to the `error` event.
    pub fn create(engine: E, config: HostConfig) -> Result<Self> {
        let mut server = Self {
            host: Host::new(engine, config),
            ready_emitted: false,
        };
        if !server.host.initialize() {
            return Err(HostError::initialization(
                "transport engine failed to initialize",
            ));
        }
        server.create_host()?;
        Ok(server)
    }

    /// Bind the transport host to the configured address/port, probing
    /// availability first when enabled. Usable again after
    /// [`destroy`](Self::destroy).
    pub fn create_host(&mut self) -> Result<()> {
        let bind = self.host.config().bind_config();
        self.host.create_host(Some(bind))?;
        info!(
            address = %self.host.config().address,
            port = self.host.config().port,
            max_peers = self.host.config().max_peers,
            "server host bound"
        );
        Ok(())
    }

    /// Run the polling loop until [`stop`](Self::stop). Emits `ready`
    /// exactly once, after successful host creation and immediately before
    /// the first iteration.
    pub async fn listen(&mut self) -> Result<()> {
        if self.host.state().has_host() && !self.ready_emitted {
            // deferred one scheduler tick so subscribers registered after
            // the listen() future was created still observe the event
            tokio::task::yield_now().await;
            self.ready_emitted = true;
            self.host.emit(Event::Ready);
        }
        self.host.run().await;
        Ok(())
    }

    /// Register a callback. Returns the server for chaining.
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

    /// Send framed data to a peer; see [`Host::send`]
    pub fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], reliable: bool) -> i32 {
        self.host.send(peer, channel, data, reliable)
    }

    /// Send a pre-built payload with explicit flags; see [`Host::send_raw`]
    pub fn send_raw(&mut self, peer: PeerId, channel: u8, data: &[u8], packet_flags: u32) -> i32 {
        self.host.send_raw(peer, channel, data, packet_flags)
    }

    /// Disconnect a peer; see [`Host::disconnect`]
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
    }

    /// Tear down the engine subsystem
    pub fn deinitialize(&mut self) {
        self.host.deinitialize();
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
