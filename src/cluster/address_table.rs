//! Shared table mapping each peer to its active outbound address.

use crate::types::Endpoint;
use dashmap::DashMap;
use std::net::SocketAddr;

/// Mapping from endpoint to the address currently used for outbound
/// traffic to that peer.
///
/// Updated by the rehoming subscriber on membership events and read by the
/// networking layer on every send. Entries are individually locked, so a
/// reader never observes a torn address and churn on one peer does not
/// contend with another. At any instant each endpoint maps to exactly one
/// address, and only addresses the peer itself published are ever stored.
#[derive(Debug, Default)]
pub struct ConnectionAddressTable {
    entries: DashMap<Endpoint, SocketAddr>,
}

impl ConnectionAddressTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with the peer's public address (its endpoint) if the
    /// peer has not been observed before.
    pub fn ensure(&self, endpoint: Endpoint) {
        self.entries.entry(endpoint).or_insert(endpoint);
    }

    /// Point the peer's entry at `addr`.
    pub fn set(&self, endpoint: Endpoint, addr: SocketAddr) {
        self.entries.insert(endpoint, addr);
    }

    /// Revert the peer's entry to its public address.
    pub fn reset(&self, endpoint: Endpoint) {
        self.entries.insert(endpoint, endpoint);
    }

    /// Delete the peer's entry entirely.
    pub fn remove(&self, endpoint: Endpoint) -> Option<SocketAddr> {
        self.entries.remove(&endpoint).map(|(_, addr)| addr)
    }

    /// The address currently used to reach the peer, if known.
    pub fn active(&self, endpoint: Endpoint) -> Option<SocketAddr> {
        self.entries.get(&endpoint).map(|entry| *entry)
    }

    /// Number of tracked peers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peers are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
