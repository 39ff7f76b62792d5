//! Host core and role objects

pub mod client;
pub mod core;
pub mod dispatcher;
pub mod registry;
pub mod server;

// Re-exports for convenience
pub use client::Client;
pub use core::{Host, HostContext, StopHandle};
pub use dispatcher::{EventCallback, EventDispatcher};
pub use registry::{PeerRecord, PeerRegistry};
pub use server::Server;
