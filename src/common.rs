//! Common types shared across the host layer

use crate::error::HostError;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Packet flag constants, bit-combinable on the raw send path.
pub mod flags {
    /// Guaranteed delivery and ordering
    pub const RELIABLE: u32 = 1;
    /// Deliver out of band with respect to sequenced packets
    pub const UNSEQUENCED: u32 = 2;
    /// Hand the engine caller-owned memory instead of copying.
    /// Stripped at the host boundary; nothing may alias caller memory past
    /// the send call.
    pub const NO_ALLOCATE: u32 = 4;
    /// Allow fragmentation of unreliable packets
    pub const UNRELIABLE_FRAGMENT: u32 = 8;
    /// Engine-side sent marker
    pub const SENT: u32 = 256;
}

/// Timeout handed to the engine's service primitive on each poll
pub const SERVICE_TIMEOUT_MS: u32 = 1;

/// Suspension between polling-loop iterations
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Opaque peer handle assigned by the transport engine.
///
/// The host layer only compares and stores these; it never generates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// Wrap a raw engine handle
    pub const fn new(raw: u64) -> Self {
        PeerId(raw)
    }

    /// The raw engine handle
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a host instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    /// Engine subsystem not started
    Uninitialized,
    /// Engine started, no transport host yet
    Initialized,
    /// Transport host allocated
    HostCreated,
    /// Polling loop running
    Listening,
    /// Polling loop exited after `stop()`
    Stopped,
    /// Engine subsystem torn down
    Destroyed,
}

impl HostState {
    /// Whether a transport host currently exists. Gates `service`, `send`,
    /// and `disconnect`.
    pub fn has_host(&self) -> bool {
        matches!(
            self,
            HostState::HostCreated | HostState::Listening | HostState::Stopped
        )
    }
}

/// Application-facing event kinds, fixed at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Connect,
    Disconnect,
    Receive,
    Error,
    Ready,
}

impl EventKind {
    /// Number of kinds, sizing the dispatcher's subscriber table
    pub const COUNT: usize = 5;

    pub(crate) fn index(&self) -> usize {
        match self {
            EventKind::Connect => 0,
            EventKind::Disconnect => 1,
            EventKind::Receive => 2,
            EventKind::Error => 3,
            EventKind::Ready => 4,
        }
    }
}

/// An event produced by one service poll and dispatched synchronously.
///
/// Events are transient; they are handed to subscribers by reference and
/// returned to the direct `service` caller, never stored.
#[derive(Debug, Clone)]
pub enum Event {
    /// A connection was confirmed by the engine
    Connect { peer: PeerId },
    /// A peer went away; `reason` is the engine-reported code
    Disconnect { peer: PeerId, reason: u32 },
    /// A payload arrived on a channel
    Receive {
        peer: PeerId,
        channel: u8,
        data: Bytes,
    },
    /// A failure anywhere in the layer
    Error(HostError),
    /// Server role only: the host is bound and about to start polling
    Ready,
}

impl Event {
    /// The kind used for subscriber lookup
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Connect { .. } => EventKind::Connect,
            Event::Disconnect { .. } => EventKind::Disconnect,
            Event::Receive { .. } => EventKind::Receive,
            Event::Error(_) => EventKind::Error,
            Event::Ready => EventKind::Ready,
        }
    }
}

/// Per-host traffic counters
#[derive(Debug, Default, Clone)]
pub struct HostStats {
    /// Packets handed to the engine successfully
    pub packets_sent: u64,
    /// Receive events classified
    pub packets_received: u64,
    /// Payload bytes sent
    pub bytes_sent: u64,
    /// Payload bytes received
    pub bytes_received: u64,
    /// Sends that returned the failure sentinel
    pub send_errors: u64,
    /// Confirmed connections
    pub connects: u64,
    /// Peers removed (event or explicit call)
    pub disconnects: u64,
}
