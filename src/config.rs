//! Configuration types for hosts and roles

use crate::engine::{BindConfig, HostOptions};
use crate::error::{HostError, Result};

/// Host configuration, built once at role-object creation and immutable
/// afterward.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address to bind (server) or connect to (client)
    pub address: String,
    /// Port to bind or connect to
    pub port: u16,
    /// Maximum simultaneous peers, server role only
    pub max_peers: usize,
    /// Channels allocated per connection
    pub channel_limit: usize,
    /// Inbound bandwidth cap in bytes/s, 0 = unlimited
    pub incoming_bandwidth: u32,
    /// Outbound bandwidth cap in bytes/s, 0 = unlimited
    pub outgoing_bandwidth: u32,
    /// Toggle the engine's alternate framing mode
    pub using_new_packet: bool,
    /// Run the transient port-availability probe before binding (server)
    pub probe_port: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 17091,
            max_peers: 32,
            channel_limit: 2,
            incoming_bandwidth: 0,
            outgoing_bandwidth: 0,
            using_new_packet: false,
            probe_port: true,
        }
    }
}

impl HostConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the peer limit (server role)
    pub fn max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers;
        self
    }

    /// Set the channel count per connection
    pub fn channel_limit(mut self, channel_limit: usize) -> Self {
        self.channel_limit = channel_limit;
        self
    }

    /// Set bandwidth caps in bytes/s, 0 = unlimited
    pub fn bandwidth(mut self, incoming: u32, outgoing: u32) -> Self {
        self.incoming_bandwidth = incoming;
        self.outgoing_bandwidth = outgoing;
        self
    }

    /// Enable the engine's alternate framing mode
    pub fn using_new_packet(mut self, enabled: bool) -> Self {
        self.using_new_packet = enabled;
        self
    }

    /// Enable or disable the pre-bind port probe
    pub fn probe_port(mut self, enabled: bool) -> Self {
        self.probe_port = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(HostError::config("address must not be empty"));
        }

        if self.max_peers == 0 {
            return Err(HostError::config("max_peers must be at least 1"));
        }

        if self.channel_limit == 0 || self.channel_limit > u8::MAX as usize {
            return Err(HostError::config("channel_limit must be between 1 and 255"));
        }

        Ok(())
    }

    /// The bind target for a server host
    pub fn bind_config(&self) -> BindConfig {
        BindConfig {
            address: self.address.clone(),
            port: self.port,
        }
    }

    /// Project onto the engine's host options with an explicit peer count
    /// (`max_peers` for servers, 1 for clients)
    pub fn host_options(&self, peer_count: usize) -> HostOptions {
        HostOptions {
            peer_count,
            channel_limit: self.channel_limit,
            incoming_bandwidth: self.incoming_bandwidth,
            outgoing_bandwidth: self.outgoing_bandwidth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_conventions() {
        let config = HostConfig::new();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 17091);
        assert_eq!(config.max_peers, 32);
        assert_eq!(config.channel_limit, 2);
        assert_eq!(config.incoming_bandwidth, 0);
        assert!(!config.using_new_packet);
        assert!(config.probe_port);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chains() {
        let config = HostConfig::new()
            .address("0.0.0.0")
            .port(18000)
            .max_peers(64)
            .channel_limit(4)
            .bandwidth(1024, 2048)
            .using_new_packet(true)
            .probe_port(false);

        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 18000);
        assert_eq!(config.max_peers, 64);
        assert_eq!(config.channel_limit, 4);
        assert_eq!(config.incoming_bandwidth, 1024);
        assert_eq!(config.outgoing_bandwidth, 2048);
        assert!(config.using_new_packet);
        assert!(!config.probe_port);
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        assert!(HostConfig::new().max_peers(0).validate().is_err());
        assert!(HostConfig::new().channel_limit(0).validate().is_err());
        assert!(HostConfig::new().channel_limit(256).validate().is_err());
        assert!(HostConfig::new().address("").validate().is_err());
    }

    #[test]
    fn host_options_projection() {
        let config = HostConfig::new().channel_limit(4).bandwidth(100, 200);
        let options = config.host_options(1);
        assert_eq!(options.peer_count, 1);
        assert_eq!(options.channel_limit, 4);
        assert_eq!(options.incoming_bandwidth, 100);
        assert_eq!(options.outgoing_bandwidth, 200);
    }
}
