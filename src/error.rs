//! Error types for the host layer

use crate::common::{HostState, PeerId};
use thiserror::Error;

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors reported by hosts, roles, and the transport engine boundary.
///
/// The enum is `Clone` because several contracts require the same failure to
/// be dispatched as an `error` event *and* returned to the caller; I/O errors
/// are therefore carried as messages rather than as `std::io::Error` values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The transport engine subsystem could not be started
    #[error("initialization failed: {message}")]
    Initialization { message: String },

    /// The engine rejected host creation (bad config, resource exhaustion)
    #[error("host creation failed: {message}")]
    HostCreation { message: String },

    /// Invalid configuration
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The engine failed an operation after the host was created
    #[error("engine error: {message}")]
    Engine { message: String },

    /// The peer id is not present in the registry
    #[error("unknown peer {peer}")]
    UnknownPeer { peer: PeerId },

    /// A client convenience was used before a server peer was tracked
    #[error("not connected to server")]
    NotConnected,

    /// The pre-bind probe found the address/port occupied
    #[error("address {address}:{port} already in use")]
    PortInUse { address: String, port: u16 },

    /// The operation requires a created host
    #[error("host not available in state {state:?}")]
    InvalidState { state: HostState },

    /// A bounded wait elapsed
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// A subscriber returned an error during dispatch
    #[error("callback failed: {message}")]
    Callback { message: String },

    /// The engine reported an event kind this layer does not recognize
    #[error("unrecognized transport event kind {kind}")]
    UnknownEvent { kind: u32 },

    /// I/O failure, carried as text
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::Io {
            message: err.to_string(),
        }
    }
}

impl HostError {
    /// Create an initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        HostError::Initialization {
            message: message.into(),
        }
    }

    /// Create a host-creation error
    pub fn host_creation(message: impl Into<String>) -> Self {
        HostError::HostCreation {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        HostError::Config {
            message: message.into(),
        }
    }

    /// Create an engine error
    pub fn engine(message: impl Into<String>) -> Self {
        HostError::Engine {
            message: message.into(),
        }
    }

    /// Create a callback error
    pub fn callback(message: impl Into<String>) -> Self {
        HostError::Callback {
            message: message.into(),
        }
    }

    /// Check if retrying the operation can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HostError::Timeout { .. } | HostError::Engine { .. } | HostError::Io { .. }
        )
    }

    /// Check if this failure concerns a specific peer
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            HostError::UnknownPeer { .. } | HostError::NotConnected
        )
    }
}
