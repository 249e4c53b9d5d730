//! Consumed boundary to the external membership engine.
//!
//! The membership engine owns and mutates per-endpoint application state;
//! this crate only reads peer state, publishes the local node's entries
//! once at startup, and registers subscribers for event delivery.

use crate::cluster::events::MembershipSubscriber;
use crate::types::{Endpoint, VersionedValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot of one endpoint's published application-state entries.
#[derive(Debug, Clone, Default)]
pub struct EndpointState {
    entries: HashMap<String, VersionedValue>,
}

impl EndpointState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value published under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&VersionedValue> {
        self.entries.get(key)
    }

    /// Apply a value for `key`. Stale versions are ignored; equal versions
    /// are re-applied so at-least-once delivery converges.
    pub fn apply(&mut self, key: impl Into<String>, value: VersionedValue) {
        let key = key.into();
        match self.entries.get(&key) {
            Some(existing) if existing.version > value.version => {}
            _ => {
                self.entries.insert(key, value);
            }
        }
    }

    /// Whether no entries are published.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to the external membership engine.
///
/// Passed explicitly into constructors; there is no process-global
/// instance. Implementations disseminate local application state to peers
/// and deliver [`MembershipEvent`](crate::cluster::MembershipEvent)s to
/// registered subscribers, one at a time per peer.
pub trait MembershipEngine: Send + Sync {
    /// Register a subscriber for membership events.
    fn register(&self, subscriber: Arc<dyn MembershipSubscriber>);

    /// Publish an application-state entry for the local node.
    fn add_local_application_state(&self, key: &str, value: VersionedValue);

    /// Read a peer's published state, if the peer is known.
    fn endpoint_state(&self, endpoint: Endpoint) -> Option<EndpointState>;
}
