//! Snitch variants: the polymorphic topology-classification capability.

use crate::cluster::address_table::ConnectionAddressTable;
use crate::cluster::rehoming::AddressRehomingSubscriber;
use crate::cluster::state::MembershipEngine;
use crate::config::{ClusterConfig, NodeConfig};
use crate::error::Result;
use crate::identity::MultiRegionIdentity;
use crate::metadata::{MetadataSource, AVAILABILITY_ZONE_PATH};
use crate::metrics::SnitchMetrics;
use crate::topology::classifier::classify;
use crate::types::{state_keys, Endpoint, TopologyLabel};
use std::sync::Arc;
use tracing::{info, warn};

/// Maps endpoints to (datacenter, rack) labels for replica placement and
/// request routing.
pub trait Snitch: Send + Sync {
    /// The local node's label.
    fn local_label(&self) -> &TopologyLabel;

    /// Resolve a cluster endpoint to its label. `None` means the peer's
    /// topology has not been learned yet, a valid transient condition.
    fn resolve(&self, endpoint: Endpoint) -> Option<TopologyLabel>;
}

/// Snitch reporting one fixed label for every endpoint. Suitable for
/// single-datacenter deployments and tests.
#[derive(Debug, Clone)]
pub struct SimpleSnitch {
    label: TopologyLabel,
}

impl SimpleSnitch {
    /// Build from the configured fixed label.
    pub fn new(node: &NodeConfig) -> Self {
        Self {
            label: TopologyLabel::new(node.datacenter.clone(), node.rack.clone()),
        }
    }
}

impl Snitch for SimpleSnitch {
    fn local_label(&self) -> &TopologyLabel {
        &self.label
    }

    fn resolve(&self, _endpoint: Endpoint) -> Option<TopologyLabel> {
        Some(self.label.clone())
    }
}

/// Snitch that classifies the local node from the cloud metadata service
/// and remote nodes from the zone they gossip.
pub struct CloudSnitch {
    local: TopologyLabel,
    raw_zone: String,
    cluster: Arc<ClusterConfig>,
    membership: Arc<dyn MembershipEngine>,
    metrics: Arc<SnitchMetrics>,
}

impl CloudSnitch {
    /// Classify the local node from the metadata service's availability
    /// zone. Fatal on fetch or classification failure: without a label the
    /// node cannot participate in placement.
    pub async fn new(
        source: &dyn MetadataSource,
        cluster: Arc<ClusterConfig>,
        membership: Arc<dyn MembershipEngine>,
        metrics: Arc<SnitchMetrics>,
    ) -> Result<Self> {
        let raw_zone = match source.fetch(AVAILABILITY_ZONE_PATH).await {
            Ok(zone) => zone,
            Err(e) => {
                metrics.metadata_failures.inc();
                return Err(e.into());
            }
        };
        let local = classify(&raw_zone)?;

        info!(zone = %raw_zone, label = %local, "classified local node topology");

        Ok(Self {
            local,
            raw_zone,
            cluster,
            membership,
            metrics,
        })
    }

    /// The raw availability zone the local node runs in.
    pub fn raw_zone(&self) -> &str {
        &self.raw_zone
    }
}

impl Snitch for CloudSnitch {
    fn local_label(&self) -> &TopologyLabel {
        &self.local
    }

    fn resolve(&self, endpoint: Endpoint) -> Option<TopologyLabel> {
        if self.cluster.broadcast_addr() == Some(endpoint) {
            return Some(self.local.clone());
        }

        let state = self.membership.endpoint_state(endpoint)?;
        let zone = state.get(state_keys::ZONE)?;
        match classify(&zone.value) {
            Ok(label) => Some(label),
            Err(_) => {
                self.metrics.malformed_zones.inc();
                warn!(%endpoint, zone = %zone.value, "peer gossiped an unclassifiable zone");
                None
            }
        }
    }
}

/// Cloud snitch extended for clusters spanning multiple network-isolated
/// regions.
///
/// Composes a [`CloudSnitch`] with startup identity resolution and an
/// [`AddressRehomingSubscriber`]; classification itself is untouched. The
/// node advertises its public address cluster-wide and switches same-region
/// peers onto their private addresses as they become known.
pub struct MultiRegionSnitch {
    cloud: CloudSnitch,
    identity: MultiRegionIdentity,
    table: Arc<ConnectionAddressTable>,
    membership: Arc<dyn MembershipEngine>,
    cluster: Arc<ClusterConfig>,
    metrics: Arc<SnitchMetrics>,
}

impl MultiRegionSnitch {
    /// Resolve topology and identity during node startup. Sequential and
    /// blocking: nothing else may advertise the node before the broadcast
    /// identity is fixed.
    pub async fn new(
        source: &dyn MetadataSource,
        node: &NodeConfig,
        cluster: Arc<ClusterConfig>,
        membership: Arc<dyn MembershipEngine>,
        table: Arc<ConnectionAddressTable>,
        metrics: Arc<SnitchMetrics>,
    ) -> Result<Self> {
        let cloud = CloudSnitch::new(
            source,
            cluster.clone(),
            membership.clone(),
            metrics.clone(),
        )
        .await?;
        let identity = MultiRegionIdentity::resolve(source, node, &cluster, &metrics).await?;

        Ok(Self {
            cloud,
            identity,
            table,
            membership,
            cluster,
            metrics,
        })
    }

    /// The node's resolved identity.
    pub fn identity(&self) -> &MultiRegionIdentity {
        &self.identity
    }

    /// Hook invoked when the membership engine starts gossiping: publishes
    /// the private address and zone, registers the rehoming subscriber,
    /// and freezes the broadcast identity.
    pub fn gossiper_starting(&self) {
        self.identity
            .publish(self.membership.as_ref(), self.cloud.raw_zone());

        let subscriber = Arc::new(AddressRehomingSubscriber::new(
            self.cloud.local_label().datacenter.clone(),
            self.table.clone(),
            self.membership.clone(),
            self.metrics.clone(),
        ));
        self.membership.register(subscriber);

        self.cluster.mark_gossip_started();
    }
}

impl Snitch for MultiRegionSnitch {
    fn local_label(&self) -> &TopologyLabel {
        self.cloud.local_label()
    }

    fn resolve(&self, endpoint: Endpoint) -> Option<TopologyLabel> {
        self.cloud.resolve(endpoint)
    }
}
