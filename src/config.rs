//! Configuration types for topology resolution and rehoming.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the link-local cloud metadata service.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Base URL of the metadata service.
    pub base_url: String,

    /// Per-request timeout. The service is link-local and should answer in
    /// low single-digit milliseconds; anything past this is a failure.
    pub timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "http://169.254.169.254/latest/meta-data".to_string(),
            timeout: Duration::from_secs(2),
        }
    }
}

impl MetadataConfig {
    /// Override the base URL (mainly for tests against a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Per-node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address this node binds for intra-cluster traffic. The port is also
    /// the port peers use to reach the node on its broadcast address.
    pub listen_addr: SocketAddr,

    /// Port for the client-facing RPC surface.
    pub rpc_port: u16,

    /// Fixed datacenter label, used by the simple snitch variant.
    pub datacenter: String,

    /// Fixed rack label, used by the simple snitch variant.
    pub rack: String,

    /// Metadata service configuration.
    pub metadata: MetadataConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7000".parse().unwrap(),
            rpc_port: 9042,
            datacenter: "datacenter1".to_string(),
            rack: "rack1".to_string(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a new configuration with the given listen address.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    /// Set the client RPC port.
    pub fn with_rpc_port(mut self, port: u16) -> Self {
        self.rpc_port = port;
        self
    }

    /// Set the fixed (datacenter, rack) label for the simple snitch.
    pub fn with_fixed_label(
        mut self,
        datacenter: impl Into<String>,
        rack: impl Into<String>,
    ) -> Self {
        self.datacenter = datacenter.into();
        self.rack = rack.into();
        self
    }

    /// Set the metadata service configuration.
    pub fn with_metadata_config(mut self, metadata: MetadataConfig) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Default)]
struct ClusterConfigInner {
    broadcast_addr: Option<SocketAddr>,
    broadcast_rpc_addr: Option<SocketAddr>,
    gossip_started: bool,
}

/// Process-wide cluster configuration handle.
///
/// Created once at startup and passed explicitly into the components that
/// need it; there is no implicit global instance. Broadcast addresses are
/// set during identity resolution and frozen once gossip starts, since
/// endpoint identity is derived from them.
#[derive(Debug, Default)]
pub struct ClusterConfig {
    inner: RwLock<ClusterConfigInner>,
}

impl ClusterConfig {
    /// Create an empty cluster configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address this node advertises cluster-wide as its identity.
    ///
    /// Fails once gossip has started: peers key all state by this address.
    pub fn set_broadcast_addr(&self, addr: SocketAddr) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.gossip_started {
            return Err(Error::Config(
                "broadcast address cannot change after gossip has started".to_string(),
            ));
        }
        inner.broadcast_addr = Some(addr);
        Ok(())
    }

    /// Set the client-facing RPC address advertised cluster-wide.
    pub fn set_broadcast_rpc_addr(&self, addr: SocketAddr) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.gossip_started {
            return Err(Error::Config(
                "broadcast RPC address cannot change after gossip has started".to_string(),
            ));
        }
        inner.broadcast_rpc_addr = Some(addr);
        Ok(())
    }

    /// The node's broadcast address, if resolved.
    pub fn broadcast_addr(&self) -> Option<SocketAddr> {
        self.inner.read().broadcast_addr
    }

    /// The node's broadcast RPC address, if resolved.
    pub fn broadcast_rpc_addr(&self) -> Option<SocketAddr> {
        self.inner.read().broadcast_rpc_addr
    }

    /// Freeze the broadcast identity; called when the membership engine
    /// starts gossiping.
    pub fn mark_gossip_started(&self) {
        self.inner.write().gossip_started = true;
    }

    /// Whether gossip has started.
    pub fn gossip_started(&self) -> bool {
        self.inner.read().gossip_started
    }
}
