//! Peer registry owned by a host instance

use crate::common::PeerId;
use std::collections::HashMap;

/// What a host knows about one remote endpoint.
///
/// `connected` flips to true only on a confirmed connect event. Records are
/// removed outright on disconnect; there is no tombstone state, so a removed
/// peer id is indistinguishable from one never seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub address: String,
    pub port: u16,
    pub connected: bool,
}

/// Mapping from engine-assigned peer handles to peer records.
///
/// Mutated only by the owning host in response to transport events or
/// explicit disconnect calls; at most one record per identifier.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, PeerRecord>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unconnected record if absent; refresh address/port if the
    /// id is already known.
    pub fn upsert(&mut self, peer: PeerId, address: String, port: u16) {
        self.peers
            .entry(peer)
            .and_modify(|record| {
                record.address = address.clone();
                record.port = port;
            })
            .or_insert(PeerRecord {
                address,
                port,
                connected: false,
            });
    }

    /// Flip the connected flag. Returns false if the id is unknown.
    pub fn mark_connected(&mut self, peer: PeerId) -> bool {
        match self.peers.get_mut(&peer) {
            Some(record) => {
                record.connected = true;
                true
            }
            None => false,
        }
    }

    /// Remove the record, returning it if present
    pub fn mark_disconnected(&mut self, peer: PeerId) -> Option<PeerRecord> {
        self.peers.remove(&peer)
    }

    pub fn get(&self, peer: PeerId) -> Option<&PeerRecord> {
        self.peers.get(&peer)
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.contains_key(&peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    /// Iterate over known peers in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (PeerId, &PeerRecord)> {
        self.peers.iter().map(|(peer, record)| (*peer, record))
    }
}
