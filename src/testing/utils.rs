//! In-memory stand-ins for the external collaborators.

use crate::cluster::events::{MembershipEvent, MembershipSubscriber};
use crate::cluster::state::{EndpointState, MembershipEngine};
use crate::error::MetadataError;
use crate::metadata::MetadataSource;
use crate::types::{Endpoint, VersionedValue};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory membership engine.
///
/// Records the local node's published state, holds per-peer state, and
/// fans events out to registered subscribers synchronously, one event at a
/// time, matching the single-threaded-per-peer delivery the real engine
/// guarantees.
#[derive(Default)]
pub struct InMemoryMembership {
    subscribers: RwLock<Vec<Arc<dyn MembershipSubscriber>>>,
    local: RwLock<EndpointState>,
    peers: RwLock<HashMap<Endpoint, EndpointState>>,
}

impl InMemoryMembership {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the local node's published state.
    pub fn local_state(&self) -> EndpointState {
        self.local.read().clone()
    }

    /// Set a peer's application-state entry without emitting an event.
    pub fn set_peer_state(&self, endpoint: Endpoint, key: &str, value: VersionedValue) {
        self.peers
            .write()
            .entry(endpoint)
            .or_default()
            .apply(key, value);
    }

    /// Deliver an event to every registered subscriber.
    pub fn emit(&self, event: MembershipEvent) {
        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.on_event(event.clone());
        }
    }

    /// Set a peer's state entry and deliver the matching change event.
    pub fn publish_peer(&self, endpoint: Endpoint, key: &str, value: VersionedValue) {
        self.set_peer_state(endpoint, key, value.clone());
        self.emit(MembershipEvent::Change {
            endpoint,
            key: key.to_string(),
            value,
        });
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl MembershipEngine for InMemoryMembership {
    fn register(&self, subscriber: Arc<dyn MembershipSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    fn add_local_application_state(&self, key: &str, value: VersionedValue) {
        self.local.write().apply(key, value);
    }

    fn endpoint_state(&self, endpoint: Endpoint) -> Option<EndpointState> {
        self.peers.read().get(&endpoint).cloned()
    }
}

/// Metadata source serving canned values.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    values: HashMap<String, String>,
}

impl StaticMetadata {
    /// Create an empty source; every fetch fails with a 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `path`.
    pub fn with(mut self, path: &str, value: &str) -> Self {
        self.values.insert(path.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn fetch(&self, path: &str) -> Result<String, MetadataError> {
        self.values
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::BadResponse {
                url: path.to_string(),
                status: 404,
            })
    }
}
