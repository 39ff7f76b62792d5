//! Host core: state machine, peer bookkeeping, and the service loop
//!
//! [`Host`] is the role-neutral center shared by [`Server`](crate::Server)
//! and [`Client`](crate::Client). It owns the engine handle, the peer
//! registry, and the event dispatcher; all mutation funnels through
//! `service`, `send`, `disconnect`, and `destroy` on one logical thread of
//! control.

use crate::common::{
    flags, Event, EventKind, HostState, HostStats, PeerId, POLL_INTERVAL, SERVICE_TIMEOUT_MS,
};
use crate::config::HostConfig;
use crate::engine::{BindConfig, TransportEngine, TransportEvent};
use crate::error::{HostError, Result};
use crate::host::dispatcher::EventDispatcher;
use crate::host::registry::{PeerRecord, PeerRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Cloneable handle for stopping a polling loop owned by another task.
///
/// `stop()` flips the running flag; the loop exits at its next iteration
/// boundary, never mid-service-call.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request cooperative loop termination
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Whether the loop is still marked running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// The mutable host state reachable from event callbacks.
///
/// Operations used inside a callback do not dispatch further events
/// themselves; failures they raise are queued and re-dispatched as `error`
/// events once the current emit completes, preserving dispatch order
/// without reentrancy.
pub struct HostContext<E: TransportEngine> {
    engine: E,
    registry: PeerRegistry,
    config: HostConfig,
    state: HostState,
    running: Arc<AtomicBool>,
    stats: HostStats,
    pending_errors: Vec<HostError>,
}

impl<E: TransportEngine> HostContext<E> {
    /// Send framed data to a peer. Returns the engine's non-negative result
    /// on success, `-1` on failure; the failure is reported through the
    /// `error` kind, never raised.
    pub fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], reliable: bool) -> i32 {
        let packet_flags = if reliable { flags::RELIABLE } else { 0 };
        self.send_raw(peer, channel, data, packet_flags)
    }

    /// Send a pre-built payload with an explicit flag set. Same failure
    /// contract as [`send`](Self::send).
    pub fn send_raw(&mut self, peer: PeerId, channel: u8, data: &[u8], packet_flags: u32) -> i32 {
        if !self.state.has_host() {
            self.stats.send_errors += 1;
            self.raise(HostError::InvalidState { state: self.state });
            return -1;
        }
        if !self.registry.contains(peer) {
            self.stats.send_errors += 1;
            self.raise(HostError::UnknownPeer { peer });
            return -1;
        }

        // zero-copy handoff must not cross this boundary
        let packet_flags = packet_flags & !flags::NO_ALLOCATE;

        match self.engine.send(peer, channel, data, packet_flags) {
            Ok(result) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += data.len() as u64;
                result
            }
            Err(err) => {
                self.stats.send_errors += 1;
                warn!(peer = %peer, channel, error = %err, "send rejected by engine");
                self.raise(err);
                -1
            }
        }
    }

    /// Request graceful teardown and remove the peer record immediately,
    /// without waiting for engine confirmation. Unknown peers are a silent
    /// no-op, which makes repeated disconnects idempotent.
    pub fn disconnect(&mut self, peer: PeerId, reason: u32) {
        if !self.state.has_host() || !self.registry.contains(peer) {
            return;
        }
        if let Err(err) = self.engine.disconnect(peer, reason) {
            self.raise(err);
        }
        self.registry.mark_disconnected(peer);
        self.stats.disconnects += 1;
        debug!(peer = %peer, reason, "peer disconnected");
    }

    /// Push queued packets out without servicing events
    pub fn flush(&mut self) {
        if self.state.has_host() {
            self.engine.flush();
        }
    }

    /// Stop the polling loop at its next iteration boundary
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Look up a peer record
    pub fn peer(&self, peer: PeerId) -> Option<&PeerRecord> {
        self.registry.get(peer)
    }

    /// Number of known peers
    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    /// Read-only access to the engine handle
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn raise(&mut self, err: HostError) {
        self.pending_errors.push(err);
    }

    fn drain_errors(&mut self) -> Vec<HostError> {
        std::mem::take(&mut self.pending_errors)
    }
}

/// One side of the transport engine: peer registry, event dispatch, and the
/// cooperative polling loop.
pub struct Host<E: TransportEngine> {
    ctx: HostContext<E>,
    dispatcher: EventDispatcher<E>,
}

impl<E: TransportEngine> Host<E> {
    /// Create a host around an engine handle. No engine call happens until
    /// [`initialize`](Self::initialize).
    pub fn new(engine: E, config: HostConfig) -> Self {
        Self {
            ctx: HostContext {
                engine,
                registry: PeerRegistry::new(),
                config,
                state: HostState::Uninitialized,
                running: Arc::new(AtomicBool::new(false)),
                stats: HostStats::default(),
                pending_errors: Vec::new(),
            },
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Register a callback for `kind`. Returns the host for chaining.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> &mut Self
    where
        F: FnMut(&mut HostContext<E>, &Event) -> Result<()> + Send + 'static,
    {
        self.dispatcher.on(kind, Box::new(callback));
        self
    }

    /// Register a callback removed after its first invocation
    pub fn once<F>(&mut self, kind: EventKind, callback: F) -> &mut Self
    where
        F: FnMut(&mut HostContext<E>, &Event) -> Result<()> + Send + 'static,
    {
        self.dispatcher.once(kind, Box::new(callback));
        self
    }

    /// Start the engine subsystem. Returns false (after dispatching an
    /// `error` event) if the engine could not be started; a second call
    /// re-attempts.
    pub fn initialize(&mut self) -> bool {
        match self.ctx.engine.initialize() {
            Ok(()) => {
                if matches!(
                    self.ctx.state,
                    HostState::Uninitialized | HostState::Destroyed
                ) {
                    self.ctx.state = HostState::Initialized;
                }
                true
            }
            Err(err) => {
                error!(error = %err, "engine initialization failed");
                self.emit(Event::Error(HostError::initialization(err.to_string())));
                false
            }
        }
    }

    /// Tear down the transport host (if any) and the engine subsystem
    pub fn deinitialize(&mut self) {
        if self.ctx.state.has_host() {
            let _ = self.ctx.engine.destroy_host();
            self.ctx.registry.clear();
        }
        self.ctx.engine.deinitialize();
        self.ctx.state = HostState::Destroyed;
        debug!("engine deinitialized");
    }

    /// Allocate the transport host. `bind = None` creates an unbound client
    /// host. On success the fixed policy is applied: compression and
    /// checksums always on, the alternate framing mode only when configured.
    /// Failure is dispatched as an `error` event and returned.
    pub fn create_host(&mut self, bind: Option<BindConfig>) -> Result<()> {
        if let Err(err) = self.ctx.config.validate() {
            self.emit(Event::Error(err.clone()));
            return Err(err);
        }
        if matches!(
            self.ctx.state,
            HostState::Uninitialized | HostState::Destroyed
        ) {
            let err = HostError::host_creation("engine not initialized");
            self.emit(Event::Error(err.clone()));
            return Err(err);
        }

        let is_server = bind.is_some();
        if let Some(target) = &bind {
            if self.ctx.config.probe_port {
                if let Err(err) = self.ctx.engine.probe_bind(&target.address, target.port) {
                    warn!(
                        address = %target.address,
                        port = target.port,
                        error = %err,
                        "port probe failed, refusing host creation"
                    );
                    self.emit(Event::Error(err.clone()));
                    return Err(err);
                }
            }
        }

        let peer_count = if is_server { self.ctx.config.max_peers } else { 1 };
        let options = self.ctx.config.host_options(peer_count);
        if let Err(engine_err) = self.ctx.engine.create_host(bind.as_ref(), &options) {
            let err = HostError::host_creation(engine_err.to_string());
            self.emit(Event::Error(err.clone()));
            return Err(err);
        }

        self.ctx.engine.set_compression(true);
        self.ctx.engine.set_checksum(true);
        if self.ctx.config.using_new_packet {
            self.ctx.engine.set_new_packet(true, is_server);
        }

        self.ctx.state = HostState::HostCreated;
        info!(server = is_server, "transport host created");
        Ok(())
    }

    /// Poll the engine once, classify the event, update the registry, and
    /// dispatch. Subscribers always observe registry state that already
    /// reflects the event. Returns the dispatched event, `None` when nothing
    /// was pending or no host exists yet. Engine-level service failure
    /// propagates as `Err`; the polling loop reports it and exits.
    pub fn service(&mut self, timeout_ms: u32) -> Result<Option<Event>> {
        if !self.ctx.state.has_host() {
            return Ok(None);
        }
        let Some(transport_event) = self.ctx.engine.host_service(timeout_ms)? else {
            return Ok(None);
        };

        let event = self.classify(transport_event);
        self.dispatch(&event);
        Ok(Some(event))
    }

    fn classify(&mut self, event: TransportEvent) -> Event {
        match event {
            TransportEvent::Connect {
                peer,
                address,
                port,
            } => {
                self.ctx.registry.upsert(peer, address, port);
                self.ctx.registry.mark_connected(peer);
                self.ctx.stats.connects += 1;
                debug!(peer = %peer, "peer connected");
                Event::Connect { peer }
            }
            TransportEvent::Disconnect { peer, reason } => {
                // tolerated for peers already removed by an explicit call
                if self.ctx.registry.mark_disconnected(peer).is_some() {
                    self.ctx.stats.disconnects += 1;
                    debug!(peer = %peer, reason, "peer disconnected");
                }
                Event::Disconnect { peer, reason }
            }
            TransportEvent::Receive {
                peer,
                channel,
                data,
            } => {
                self.ctx.stats.packets_received += 1;
                self.ctx.stats.bytes_received += data.len() as u64;
                Event::Receive {
                    peer,
                    channel,
                    data,
                }
            }
            TransportEvent::Unknown { kind } => Event::Error(HostError::UnknownEvent { kind }),
        }
    }

    /// Dispatch an event to subscribers. Public so applications and helpers
    /// can inject synthetic events, mirroring direct use of the dispatcher
    /// in the role objects.
    pub fn emit(&mut self, event: Event) {
        self.dispatch(&event);
    }

    fn dispatch(&mut self, event: &Event) {
        let mut failures = self.dispatcher.emit(&mut self.ctx, event);
        let mut raised = self.ctx.drain_errors();

        if event.kind() == EventKind::Error {
            // anything raised while handling an error is swallowed so error
            // dispatch cannot recurse
            for err in raised.into_iter().chain(failures) {
                warn!(error = %err, "error raised while dispatching an error event");
            }
            return;
        }

        raised.append(&mut failures);
        for err in raised {
            self.dispatch(&Event::Error(err));
        }
    }

    /// Report failures queued by context operations invoked outside a
    /// dispatch (direct `send`/`disconnect` calls on the host).
    fn report_pending(&mut self) {
        for err in self.ctx.drain_errors() {
            self.dispatch(&Event::Error(err));
        }
    }

    /// Initiate one outbound connection and create its unconnected peer
    /// record. The connection is confirmed later by a `Connect` event.
    pub fn connect_peer(
        &mut self,
        address: &str,
        port: u16,
        channel_count: usize,
        user_data: u32,
    ) -> Result<PeerId> {
        if !self.ctx.state.has_host() {
            let err = HostError::InvalidState {
                state: self.ctx.state,
            };
            self.emit(Event::Error(err.clone()));
            return Err(err);
        }
        match self
            .ctx
            .engine
            .connect(address, port, channel_count, user_data)
        {
            Ok(peer) => {
                self.ctx.registry.upsert(peer, address.to_string(), port);
                info!(peer = %peer, address, port, "outbound connection initiated");
                Ok(peer)
            }
            Err(err) => {
                self.emit(Event::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// See [`HostContext::send`]
    pub fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], reliable: bool) -> i32 {
        let result = self.ctx.send(peer, channel, data, reliable);
        self.report_pending();
        result
    }

    /// See [`HostContext::send_raw`]
    pub fn send_raw(&mut self, peer: PeerId, channel: u8, data: &[u8], packet_flags: u32) -> i32 {
        let result = self.ctx.send_raw(peer, channel, data, packet_flags);
        self.report_pending();
        result
    }

    /// See [`HostContext::disconnect`]
    pub fn disconnect(&mut self, peer: PeerId, reason: u32) {
        self.ctx.disconnect(peer, reason);
        self.report_pending();
    }

    /// See [`HostContext::flush`]
    pub fn flush(&mut self) {
        self.ctx.flush();
    }

    /// Release the transport host and clear the peer registry. Engine
    /// teardown failure is reported as an `error` event, never raised. The
    /// host returns to `Initialized`; a new host can be created without
    /// re-initializing the engine.
    pub fn destroy(&mut self) {
        if self.ctx.state.has_host() {
            if let Err(err) = self.ctx.engine.destroy_host() {
                self.emit(Event::Error(HostError::engine(err.to_string())));
            }
            self.ctx.state = HostState::Initialized;
            info!("transport host destroyed");
        }
        self.ctx.registry.clear();
    }

    /// The cooperative polling loop: service once with a short timeout,
    /// yield to the scheduler, repeat until [`stop`](Self::stop). Dispatch
    /// for a poll completes before the next poll begins. An engine-level
    /// service failure is reported as an `error` event and ends the loop.
    pub async fn run(&mut self) {
        self.ctx.running.store(true, Ordering::Relaxed);
        if self.ctx.state.has_host() {
            self.ctx.state = HostState::Listening;
        }
        debug!("service loop started");

        while self.ctx.running.load(Ordering::Relaxed) {
            match self.service(SERVICE_TIMEOUT_MS) {
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "service failed, stopping loop");
                    self.emit(Event::Error(err));
                    break;
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        self.ctx.running.store(false, Ordering::Relaxed);
        if self.ctx.state == HostState::Listening {
            self.ctx.state = HostState::Stopped;
        }
        debug!("service loop stopped");
    }

    /// Stop the polling loop at its next iteration boundary
    pub fn stop(&self) {
        self.ctx.stop();
    }

    /// A cloneable stop flag for loops owned by another task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.ctx.running.clone(),
        }
    }

    /// Whether the polling loop is currently marked running
    pub fn is_running(&self) -> bool {
        self.ctx.running.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> HostState {
        self.ctx.state
    }

    pub fn config(&self) -> &HostConfig {
        self.ctx.config()
    }

    pub fn stats(&self) -> &HostStats {
        self.ctx.stats()
    }

    /// Look up a peer record
    pub fn peer(&self, peer: PeerId) -> Option<&PeerRecord> {
        self.ctx.peer(peer)
    }

    /// Number of known peers
    pub fn peer_count(&self) -> usize {
        self.ctx.peer_count()
    }

    /// Read-only access to the engine handle
    pub fn engine(&self) -> &E {
        self.ctx.engine()
    }
}
