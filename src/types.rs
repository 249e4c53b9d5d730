//! Core types used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a cluster node: its broadcast (public) address.
///
/// Immutable for the lifetime of a membership; used as the key for all
/// topology and connection lookups.
pub type Endpoint = SocketAddr;

/// Well-known application-state keys published via the membership engine.
pub mod state_keys {
    /// The node's private, intra-region IP address.
    pub const INTERNAL_IP: &str = "internal_ip";

    /// The raw cloud availability zone the node runs in. Peers classify
    /// this themselves to derive the node's datacenter and rack.
    pub const ZONE: &str = "zone";
}

/// Derived (datacenter, rack) classification for an endpoint.
///
/// Deterministic given the same raw zone input and stable for the process
/// lifetime once computed. Neither field is ever empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopologyLabel {
    /// Datacenter name, derived from the cloud region.
    pub datacenter: String,
    /// Rack name, the availability-zone suffix verbatim.
    pub rack: String,
}

impl TopologyLabel {
    /// Create a new topology label.
    pub fn new(datacenter: impl Into<String>, rack: impl Into<String>) -> Self {
        Self {
            datacenter: datacenter.into(),
            rack: rack.into(),
        }
    }
}

impl fmt::Display for TopologyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.datacenter, self.rack)
    }
}

/// Opaque, versioned application-state value disseminated via gossip.
///
/// Higher versions supersede lower ones for the same key; versions are
/// assigned by the publishing node's [`ValueFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Monotonically increasing version for ordering out-of-order updates.
    pub version: u64,
    /// The raw value, e.g. a bare IP address or zone string.
    pub value: String,
}

impl VersionedValue {
    /// Create a versioned value.
    pub fn new(version: u64, value: impl Into<String>) -> Self {
        Self {
            version,
            value: value.into(),
        }
    }

    /// Serialize to bytes for gossip dissemination.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bincode::deserialize(bytes).ok()
    }
}

/// Factory producing versioned application-state values for the local node.
///
/// Versions are process-local and monotonically increasing across all keys.
#[derive(Debug, Default)]
pub struct ValueFactory {
    version: AtomicU64,
}

impl ValueFactory {
    /// Create a new factory starting at version 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Produce a value wrapping the node's private IP address.
    pub fn internal_ip(&self, ip: IpAddr) -> VersionedValue {
        VersionedValue::new(self.next_version(), ip.to_string())
    }

    /// Produce a value wrapping the node's raw availability zone.
    pub fn zone(&self, raw_zone: &str) -> VersionedValue {
        VersionedValue::new(self.next_version(), raw_zone)
    }
}
