//! Abstract transport engine boundary
//!
//! The [`TransportEngine`] trait is the seam between this layer and the
//! reliable-UDP engine that provides connection establishment, sequencing,
//! retransmission, congestion control, compression, and checksums. The host
//! layer decides *when* the engine is polled and *what state* is kept between
//! polls; the engine owns the wire.
//!
//! An in-process implementation for tests and demos lives in
//! [`crate::loopback`].

use crate::common::PeerId;
use crate::error::{HostError, Result};
use bytes::Bytes;

/// Bind target for a server host. `None` at host creation signals the
/// client role (ephemeral, unbound).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindConfig {
    pub address: String,
    pub port: u16,
}

/// Engine-side host parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    /// Maximum simultaneous peers
    pub peer_count: usize,
    /// Channels allocated per connection
    pub channel_limit: usize,
    /// Inbound bandwidth cap in bytes/s, 0 = unlimited
    pub incoming_bandwidth: u32,
    /// Outbound bandwidth cap in bytes/s, 0 = unlimited
    pub outgoing_bandwidth: u32,
}

/// One raw event returned by the engine's service primitive.
///
/// `Connect` carries the remote address so the host layer can create the
/// peer record for inbound connections.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connect {
        peer: PeerId,
        address: String,
        port: u16,
    },
    Disconnect {
        peer: PeerId,
        reason: u32,
    },
    Receive {
        peer: PeerId,
        channel: u8,
        data: Bytes,
    },
    /// An event kind this layer does not recognize; classified as an error
    Unknown {
        kind: u32,
    },
}

/// Reliable-UDP engine consumed by [`Host`](crate::host::Host).
///
/// All methods are non-blocking apart from `host_service`, which may wait up
/// to `timeout_ms` for an event. Peer handles are assigned by the engine and
/// treated as opaque by the caller.
pub trait TransportEngine: Send + 'static {
    /// Start the engine subsystem. A second call re-attempts.
    fn initialize(&mut self) -> Result<()>;

    /// Tear down the engine subsystem
    fn deinitialize(&mut self);

    /// Allocate the transport host. `bind = None` creates an unbound
    /// (client) host.
    fn create_host(&mut self, bind: Option<&BindConfig>, options: &HostOptions) -> Result<()>;

    /// Release the transport host
    fn destroy_host(&mut self) -> Result<()>;

    /// Initiate one outbound connection, returning the new peer handle.
    /// Completion is reported later through a `Connect` event.
    fn connect(
        &mut self,
        address: &str,
        port: u16,
        channel_count: usize,
        user_data: u32,
    ) -> Result<PeerId>;

    /// Request graceful teardown of a connection
    fn disconnect(&mut self, peer: PeerId, reason: u32) -> Result<()>;

    /// Queue a packet for a peer. Returns the engine's non-negative result
    /// code on success.
    fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], flags: u32) -> Result<i32>;

    /// Poll for at most one pending event, waiting up to `timeout_ms`
    fn host_service(&mut self, timeout_ms: u32) -> Result<Option<TransportEvent>>;

    /// Push queued packets out without servicing events
    fn flush(&mut self);

    /// Enable or disable payload compression; applied before host use
    fn set_compression(&mut self, enabled: bool);

    /// Enable or disable packet checksums; applied before host use
    fn set_checksum(&mut self, enabled: bool);

    /// Toggle the alternate framing mode for the given side
    fn set_new_packet(&mut self, enabled: bool, server_side: bool);

    /// Check that `address:port` can be bound, without keeping the binding.
    ///
    /// The default attempts a transient UDP bind and drops the socket
    /// immediately. Engines over other media override this to consult their
    /// own notion of occupancy.
    fn probe_bind(&self, address: &str, port: u16) -> Result<()> {
        match std::net::UdpSocket::bind((address, port)) {
            Ok(socket) => {
                drop(socket);
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => Err(HostError::PortInUse {
                address: address.to_string(),
                port,
            }),
            Err(err) => Err(err.into()),
        }
    }
}
