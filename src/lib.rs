//! Topology-aware peer address resolution for multi-region clusters.
//!
//! This crate resolves which datacenter and rack each cluster node belongs
//! to (the "snitch" contract) and uses that information to pick the most
//! efficient network path to a peer: once two nodes are discovered to
//! share a region, traffic to the peer is switched from its public,
//! cross-region address to the private, intra-region address it published.
//!
//! # Features
//!
//! - Pure, unit-testable zone classification with a legacy-region rename
//!   table, so clusters upgraded over time keep consistent labels
//! - Bounded-timeout lookups against the link-local cloud metadata service
//! - Startup identity resolution: public address as broadcast identity,
//!   private address published via gossip
//! - Event-driven connection rehoming that is idempotent under the
//!   at-least-once delivery of the membership engine
//!
//! # Example
//!
//! ```rust,no_run
//! use rackwise::{
//!     ClusterConfig, ConnectionAddressTable, MetadataFetcher, MultiRegionSnitch,
//!     NodeConfig, SnitchMetrics,
//! };
//! use std::sync::Arc;
//!
//! # async fn start(membership: Arc<dyn rackwise::MembershipEngine>) -> rackwise::Result<()> {
//! let node = NodeConfig::new("0.0.0.0:7000".parse().unwrap());
//! let cluster = Arc::new(ClusterConfig::new());
//! let table = Arc::new(ConnectionAddressTable::new());
//! let fetcher = MetadataFetcher::new(&node.metadata)?;
//!
//! // Fatal if the metadata service is unreachable: a node that cannot
//! // determine its public identity must not join the cluster.
//! let snitch = MultiRegionSnitch::new(
//!     &fetcher,
//!     &node,
//!     cluster.clone(),
//!     membership,
//!     table.clone(),
//!     Arc::new(SnitchMetrics::new()),
//! )
//! .await?;
//!
//! // Later, when the membership engine starts gossiping:
//! snitch.gossiper_starting();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! startup:      MetadataFetcher ─▶ TopologyClassifier ─▶ MultiRegionIdentity
//!                                                             │
//!                                                 broadcast addr fixed,
//!                                                 private addr published
//!
//! steady state: membership events ─▶ AddressRehomingSubscriber
//!                                            │
//!                                            ▼
//!                                 ConnectionAddressTable ◀── networking layer
//! ```
//!
//! The membership engine itself is an external collaborator, consumed
//! through the [`MembershipEngine`] trait; [`testing`] provides an
//! in-memory implementation.

pub mod cluster;
pub mod config;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod metrics;
pub mod testing;
pub mod topology;
pub mod types;

// Re-export main types for convenience
pub use cluster::{
    AddressRehomingSubscriber, ConnectionAddressTable, EndpointState, LoggingSubscriber,
    MembershipEngine, MembershipEvent, MembershipSubscriber, RegionState,
};
pub use config::{ClusterConfig, MetadataConfig, NodeConfig};
pub use error::{Error, MetadataError, Result, TopologyError};
pub use identity::MultiRegionIdentity;
pub use metadata::{MetadataFetcher, MetadataSource};
pub use metrics::{MetricsSnapshot, SnitchMetrics};
pub use topology::{classify, CloudSnitch, MultiRegionSnitch, SimpleSnitch, Snitch};
pub use types::{Endpoint, TopologyLabel, ValueFactory, VersionedValue};
