//! In-process transport engine
//!
//! [`LoopbackEngine`] implements [`TransportEngine`] entirely in memory:
//! hosts on the same [`LoopbackNetwork`] exchange events through shared
//! queues instead of sockets. It backs the integration tests and demos; it
//! performs no framing, retransmission, or compression — settings applied
//! through the trait are recorded and exposed for assertions.

use crate::common::PeerId;
use crate::engine::{BindConfig, HostOptions, TransportEngine, TransportEvent};
use crate::error::{HostError, Result};
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::trace;

struct HostEntry {
    queue: VecDeque<TransportEvent>,
    address: String,
    port: u16,
}

struct PeerLink {
    remote_host: u64,
    remote_peer: PeerId,
}

struct NetworkState {
    next_host_id: u64,
    next_peer_id: u64,
    next_ephemeral_port: u16,
    hosts: HashMap<u64, HostEntry>,
    bound: HashMap<(String, u16), u64>,
    links: HashMap<PeerId, PeerLink>,
    // acceptor-side peers whose connect event, once serviced, completes the
    // handshake and notifies the connector
    awaiting_confirm: HashSet<PeerId>,
}

impl NetworkState {
    fn new() -> Self {
        Self {
            next_host_id: 1,
            next_peer_id: 1,
            next_ephemeral_port: 49152,
            hosts: HashMap::new(),
            bound: HashMap::new(),
            links: HashMap::new(),
            awaiting_confirm: HashSet::new(),
        }
    }

    fn allocate_peer(&mut self) -> PeerId {
        let peer = PeerId::new(self.next_peer_id);
        self.next_peer_id += 1;
        peer
    }

    fn push(&mut self, host: u64, event: TransportEvent) {
        if let Some(entry) = self.hosts.get_mut(&host) {
            entry.queue.push_back(event);
        }
    }

    fn drop_host(&mut self, host: u64) {
        if let Some(entry) = self.hosts.remove(&host) {
            self.bound.remove(&(entry.address, entry.port));
        }
        // sever every link touching this host; the far side times out
        // silently, matching an abrupt host teardown
        let severed: Vec<PeerId> = self
            .links
            .values()
            .filter(|link| link.remote_host == host)
            .map(|link| link.remote_peer)
            .collect();
        self.links.retain(|_, link| link.remote_host != host);
        for peer in severed {
            self.links.remove(&peer);
        }
        let links = &self.links;
        self.awaiting_confirm.retain(|peer| links.contains_key(peer));
    }
}

/// Handle to a shared in-memory network. Cloning yields another handle to
/// the same network; engines created from any handle can reach each other.
#[derive(Clone)]
pub struct LoopbackNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState::new())),
        }
    }

    /// Create an engine attached to this network
    pub fn engine(&self) -> LoopbackEngine {
        LoopbackEngine {
            network: self.clone(),
            host_id: None,
            initialized: false,
            compression: false,
            checksum: false,
            new_packet_client: false,
            new_packet_server: false,
        }
    }

    /// Number of live transport hosts on the network
    pub fn host_count(&self) -> usize {
        self.state.lock().unwrap().hosts.len()
    }
}

/// A [`TransportEngine`] delivering packets through shared in-memory queues.
pub struct LoopbackEngine {
    network: LoopbackNetwork,
    host_id: Option<u64>,
    initialized: bool,
    compression: bool,
    checksum: bool,
    new_packet_client: bool,
    new_packet_server: bool,
}

impl LoopbackEngine {
    /// Whether compression was enabled through the trait
    pub fn compression_enabled(&self) -> bool {
        self.compression
    }

    /// Whether checksums were enabled through the trait
    pub fn checksum_enabled(&self) -> bool {
        self.checksum
    }

    /// Whether the alternate framing mode was enabled for the given side
    pub fn new_packet_enabled(&self, server_side: bool) -> bool {
        if server_side {
            self.new_packet_server
        } else {
            self.new_packet_client
        }
    }

    /// The address this engine's host occupies on the network
    pub fn local_addr(&self) -> Option<(String, u16)> {
        let host_id = self.host_id?;
        let state = self.network.state.lock().unwrap();
        state
            .hosts
            .get(&host_id)
            .map(|entry| (entry.address.clone(), entry.port))
    }

    fn require_host(&self) -> Result<u64> {
        self.host_id
            .ok_or_else(|| HostError::engine("no transport host created"))
    }
}

impl TransportEngine for LoopbackEngine {
    fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn deinitialize(&mut self) {
        let _ = self.destroy_host();
        self.initialized = false;
    }

    fn create_host(&mut self, bind: Option<&BindConfig>, _options: &HostOptions) -> Result<()> {
        if !self.initialized {
            return Err(HostError::engine("engine not initialized"));
        }
        let _ = self.destroy_host();

        let mut state = self.network.state.lock().unwrap();
        let (address, port) = match bind {
            Some(config) => {
                let key = (config.address.clone(), config.port);
                if state.bound.contains_key(&key) {
                    return Err(HostError::PortInUse {
                        address: config.address.clone(),
                        port: config.port,
                    });
                }
                (config.address.clone(), config.port)
            }
            None => {
                let port = state.next_ephemeral_port;
                state.next_ephemeral_port += 1;
                ("127.0.0.1".to_string(), port)
            }
        };

        let host_id = state.next_host_id;
        state.next_host_id += 1;
        state.hosts.insert(
            host_id,
            HostEntry {
                queue: VecDeque::new(),
                address: address.clone(),
                port,
            },
        );
        if bind.is_some() {
            state.bound.insert((address, port), host_id);
        }

        self.host_id = Some(host_id);
        Ok(())
    }

    fn destroy_host(&mut self) -> Result<()> {
        if let Some(host_id) = self.host_id.take() {
            self.network.state.lock().unwrap().drop_host(host_id);
        }
        Ok(())
    }

    fn connect(
        &mut self,
        address: &str,
        port: u16,
        _channel_count: usize,
        _user_data: u32,
    ) -> Result<PeerId> {
        let host_id = self.require_host()?;
        let mut state = self.network.state.lock().unwrap();

        let target = *state
            .bound
            .get(&(address.to_string(), port))
            .ok_or_else(|| {
                HostError::engine(format!("connection to {address}:{port} refused"))
            })?;

        let local_peer = state.allocate_peer();
        let remote_peer = state.allocate_peer();
        state.links.insert(
            local_peer,
            PeerLink {
                remote_host: target,
                remote_peer,
            },
        );
        state.links.insert(
            remote_peer,
            PeerLink {
                remote_host: host_id,
                remote_peer: local_peer,
            },
        );

        let (local_address, local_port) = {
            let entry = state.hosts.get(&host_id).expect("own host entry present");
            (entry.address.clone(), entry.port)
        };

        // only the acceptor learns of the new peer now; the connector's
        // confirmation arrives once the acceptor services the handshake
        state.awaiting_confirm.insert(remote_peer);
        state.push(
            target,
            TransportEvent::Connect {
                peer: remote_peer,
                address: local_address,
                port: local_port,
            },
        );

        trace!(peer = %local_peer, address, port, "loopback connection paired");
        Ok(local_peer)
    }

    fn disconnect(&mut self, peer: PeerId, reason: u32) -> Result<()> {
        let host_id = self.require_host()?;
        let mut state = self.network.state.lock().unwrap();

        let link = state
            .links
            .remove(&peer)
            .ok_or(HostError::UnknownPeer { peer })?;
        state.links.remove(&link.remote_peer);
        state.awaiting_confirm.remove(&peer);
        state.awaiting_confirm.remove(&link.remote_peer);

        state.push(
            link.remote_host,
            TransportEvent::Disconnect {
                peer: link.remote_peer,
                reason,
            },
        );
        // the local side is notified too, after teardown completes
        state.push(host_id, TransportEvent::Disconnect { peer, reason });
        Ok(())
    }

    fn send(&mut self, peer: PeerId, channel: u8, data: &[u8], _flags: u32) -> Result<i32> {
        self.require_host()?;
        let mut state = self.network.state.lock().unwrap();

        let (remote_host, remote_peer) = {
            let link = state
                .links
                .get(&peer)
                .ok_or(HostError::UnknownPeer { peer })?;
            (link.remote_host, link.remote_peer)
        };

        if !state.hosts.contains_key(&remote_host) {
            return Err(HostError::engine("remote host is gone"));
        }

        state.push(
            remote_host,
            TransportEvent::Receive {
                peer: remote_peer,
                channel,
                data: Bytes::copy_from_slice(data),
            },
        );
        Ok(0)
    }

    fn host_service(&mut self, _timeout_ms: u32) -> Result<Option<TransportEvent>> {
        let host_id = self.require_host()?;
        let mut state = self.network.state.lock().unwrap();
        let event = state
            .hosts
            .get_mut(&host_id)
            .and_then(|entry| entry.queue.pop_front());

        // servicing an inbound connect completes the handshake and delivers
        // the connector's confirmation
        if let Some(TransportEvent::Connect { peer, .. }) = &event {
            if state.awaiting_confirm.remove(peer) {
                if let Some(link) = state.links.get(peer) {
                    let remote_host = link.remote_host;
                    let remote_peer = link.remote_peer;
                    let (address, port) = {
                        let me = state.hosts.get(&host_id).expect("own host entry present");
                        (me.address.clone(), me.port)
                    };
                    state.push(
                        remote_host,
                        TransportEvent::Connect {
                            peer: remote_peer,
                            address,
                            port,
                        },
                    );
                }
            }
        }

        Ok(event)
    }

    fn flush(&mut self) {}

    fn set_compression(&mut self, enabled: bool) {
        self.compression = enabled;
    }

    fn set_checksum(&mut self, enabled: bool) {
        self.checksum = enabled;
    }

    fn set_new_packet(&mut self, enabled: bool, server_side: bool) {
        if server_side {
            self.new_packet_server = enabled;
        } else {
            self.new_packet_client = enabled;
        }
    }

    fn probe_bind(&self, address: &str, port: u16) -> Result<()> {
        let state = self.network.state.lock().unwrap();
        if state.bound.contains_key(&(address.to_string(), port)) {
            return Err(HostError::PortInUse {
                address: address.to_string(),
                port,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_engine(network: &LoopbackNetwork, port: u16) -> LoopbackEngine {
        let mut engine = network.engine();
        engine.initialize().unwrap();
        engine
            .create_host(
                Some(&BindConfig {
                    address: "127.0.0.1".to_string(),
                    port,
                }),
                &HostOptions {
                    peer_count: 32,
                    channel_limit: 2,
                    incoming_bandwidth: 0,
                    outgoing_bandwidth: 0,
                },
            )
            .unwrap();
        engine
    }

    fn client_engine(network: &LoopbackNetwork) -> LoopbackEngine {
        let mut engine = network.engine();
        engine.initialize().unwrap();
        engine
            .create_host(
                None,
                &HostOptions {
                    peer_count: 1,
                    channel_limit: 2,
                    incoming_bandwidth: 0,
                    outgoing_bandwidth: 0,
                },
            )
            .unwrap();
        engine
    }

    #[test]
    fn connect_pairs_both_sides() {
        let network = LoopbackNetwork::new();
        let mut server = bound_engine(&network, 19000);
        let mut client = client_engine(&network);

        let peer = client.connect("127.0.0.1", 19000, 2, 0).unwrap();

        match server.host_service(0).unwrap() {
            Some(TransportEvent::Connect { address, port, .. }) => {
                assert_eq!(address, "127.0.0.1");
                assert!(port >= 49152);
            }
            other => panic!("expected server connect event, got {other:?}"),
        }
        match client.host_service(0).unwrap() {
            Some(TransportEvent::Connect { peer: p, port, .. }) => {
                assert_eq!(p, peer);
                assert_eq!(port, 19000);
            }
            other => panic!("expected client connect event, got {other:?}"),
        }
    }

    #[test]
    fn send_reaches_remote_queue() {
        let network = LoopbackNetwork::new();
        let mut server = bound_engine(&network, 19001);
        let mut client = client_engine(&network);

        let peer = client.connect("127.0.0.1", 19001, 2, 0).unwrap();
        client.send(peer, 1, b"payload", 1).unwrap();

        // skip the connect event
        server.host_service(0).unwrap();
        match server.host_service(0).unwrap() {
            Some(TransportEvent::Receive { channel, data, .. }) => {
                assert_eq!(channel, 1);
                assert_eq!(data.as_ref(), b"payload");
            }
            other => panic!("expected receive event, got {other:?}"),
        }
    }

    #[test]
    fn disconnect_notifies_both_sides_and_severs_links() {
        let network = LoopbackNetwork::new();
        let mut server = bound_engine(&network, 19002);
        let mut client = client_engine(&network);

        let peer = client.connect("127.0.0.1", 19002, 2, 0).unwrap();
        client.disconnect(peer, 7).unwrap();

        assert!(matches!(
            client.disconnect(peer, 7),
            Err(HostError::UnknownPeer { .. })
        ));
        assert!(matches!(
            client.send(peer, 0, b"x", 0),
            Err(HostError::UnknownPeer { .. })
        ));

        server.host_service(0).unwrap(); // connect
        assert!(matches!(
            server.host_service(0).unwrap(),
            Some(TransportEvent::Disconnect { reason: 7, .. })
        ));
    }

    #[test]
    fn probe_and_create_respect_occupancy() {
        let network = LoopbackNetwork::new();
        let first = bound_engine(&network, 19003);
        assert_eq!(network.host_count(), 1);

        let second = network.engine();
        assert!(matches!(
            second.probe_bind("127.0.0.1", 19003),
            Err(HostError::PortInUse { port: 19003, .. })
        ));
        assert!(second.probe_bind("127.0.0.1", 19004).is_ok());
        drop(first);
    }

    #[test]
    fn destroy_unbinds_and_breaks_remote_sends() {
        let network = LoopbackNetwork::new();
        let mut server = bound_engine(&network, 19005);
        let mut client = client_engine(&network);

        let peer = client.connect("127.0.0.1", 19005, 2, 0).unwrap();
        server.destroy_host().unwrap();
        assert_eq!(network.host_count(), 1);

        assert!(client.send(peer, 0, b"x", 0).is_err());
        assert!(network.engine().probe_bind("127.0.0.1", 19005).is_ok());
    }
}
