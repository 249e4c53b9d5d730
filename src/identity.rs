//! Startup resolution of the node's public and private identity.

use crate::cluster::state::MembershipEngine;
use crate::config::{ClusterConfig, NodeConfig};
use crate::error::{MetadataError, Result};
use crate::metadata::{MetadataSource, LOCAL_IPV4_PATH, PUBLIC_IPV4_PATH};
use crate::metrics::SnitchMetrics;
use crate::types::{state_keys, ValueFactory};
use std::net::{IpAddr, SocketAddr};
use tracing::info;

/// The node's resolved multi-region identity.
///
/// Resolved once during startup, strictly before the membership engine
/// starts: the public address becomes the node's cluster-wide broadcast
/// identity and must never change afterwards, since peers key all state by
/// it. The private address is published as application state once gossip
/// begins, for same-region peers to discover.
#[derive(Debug)]
pub struct MultiRegionIdentity {
    public_addr: SocketAddr,
    private_addr: SocketAddr,
    value_factory: ValueFactory,
}

impl MultiRegionIdentity {
    /// Resolve the node's identity from the metadata service and fix the
    /// broadcast addresses on the cluster configuration.
    ///
    /// Any fetch failure is fatal: a node that cannot determine its public
    /// identity must not join the cluster, because no peer could route to
    /// it. The operator re-runs startup once the metadata service is
    /// reachable again.
    pub async fn resolve(
        source: &dyn MetadataSource,
        node: &NodeConfig,
        cluster: &ClusterConfig,
        metrics: &SnitchMetrics,
    ) -> Result<Self> {
        let public_ip = fetch_ip(source, PUBLIC_IPV4_PATH, metrics).await?;
        let private_ip = fetch_ip(source, LOCAL_IPV4_PATH, metrics).await?;

        let public_addr = SocketAddr::new(public_ip, node.listen_addr.port());
        let private_addr = SocketAddr::new(private_ip, node.listen_addr.port());

        cluster.set_broadcast_addr(public_addr)?;
        cluster.set_broadcast_rpc_addr(SocketAddr::new(public_ip, node.rpc_port))?;

        info!(%public_addr, %private_addr, "using public address as cluster identity");

        Ok(Self {
            public_addr,
            private_addr,
            value_factory: ValueFactory::new(),
        })
    }

    /// The address advertised cluster-wide as this node's identity.
    pub fn public_addr(&self) -> SocketAddr {
        self.public_addr
    }

    /// The intra-region address peers in the same datacenter switch to.
    pub fn private_addr(&self) -> SocketAddr {
        self.private_addr
    }

    /// Publish the private address and raw zone as local application
    /// state. Called when the membership engine starts.
    pub fn publish(&self, membership: &dyn MembershipEngine, raw_zone: &str) {
        membership.add_local_application_state(
            state_keys::INTERNAL_IP,
            self.value_factory.internal_ip(self.private_addr.ip()),
        );
        membership.add_local_application_state(state_keys::ZONE, self.value_factory.zone(raw_zone));
    }
}

async fn fetch_ip(
    source: &dyn MetadataSource,
    path: &str,
    metrics: &SnitchMetrics,
) -> Result<IpAddr> {
    let value = match source.fetch(path).await {
        Ok(value) => value,
        Err(e) => {
            metrics.metadata_failures.inc();
            return Err(e.into());
        }
    };
    let ip = value.parse().map_err(|_| {
        metrics.metadata_failures.inc();
        MetadataError::Malformed {
            url: source.url_for(path),
            value: value.clone(),
        }
    })?;
    Ok(ip)
}
