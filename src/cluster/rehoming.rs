//! Dynamic rehoming of peer connections onto intra-region addresses.
//!
//! For every peer whose topology classification places it in the local
//! node's datacenter, the subscriber redirects the peer's active connection
//! address from the public address it joined with to the private address it
//! published, and reverts the redirection when the peer restarts or leaves.

use crate::cluster::address_table::ConnectionAddressTable;
use crate::cluster::events::{MembershipEvent, MembershipSubscriber};
use crate::cluster::state::{EndpointState, MembershipEngine};
use crate::metrics::SnitchMetrics;
use crate::topology::classifier::classify;
use crate::types::{state_keys, Endpoint};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Classification of a peer relative to the local node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Topology unknown; the peer is reached at its public address.
    Unclassified,
    /// The peer shares the local datacenter; reached at its private address.
    SameRegion,
    /// The peer is in another datacenter; reached at its public address.
    DifferentRegion,
}

/// Table update produced by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehomeAction {
    /// Leave the table entry as it is.
    Keep,
    /// Point the entry at the peer's published private address.
    UsePrivate(SocketAddr),
    /// Revert the entry to the peer's public address.
    UsePublic,
    /// Delete the entry entirely.
    Forget,
}

/// Why a transition did not classify the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionNote {
    /// The peer's published zone failed classification.
    MalformedZone,
    /// The peer is in the local datacenter but has not yet published a
    /// usable private address.
    AwaitingPrivateAddr,
}

/// Outcome of applying one membership event to a peer's region state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The peer's next region state.
    pub next: RegionState,
    /// The table update to perform.
    pub action: RehomeAction,
    /// Diagnostic for the non-classified outcomes.
    pub note: Option<TransitionNote>,
}

impl Transition {
    fn new(next: RegionState, action: RehomeAction) -> Self {
        Self {
            next,
            action,
            note: None,
        }
    }

    fn with_note(mut self, note: TransitionNote) -> Self {
        self.note = Some(note);
        self
    }
}

/// Pure state-transition function over (current state, event) pairs.
///
/// Holds the entire rehoming policy; the subscriber only applies the
/// returned action. Re-applying the transition produced by the same event
/// yields the same table entry, which is what makes at-least-once event
/// delivery safe.
pub fn plan(
    local_dc: &str,
    current: RegionState,
    event: &MembershipEvent,
    peer_state: Option<&EndpointState>,
) -> Transition {
    match event {
        MembershipEvent::Remove { .. } => {
            Transition::new(RegionState::Unclassified, RehomeAction::Forget)
        }
        // A restart invalidates the previously learned private address; it
        // may have changed. Stay on the public address until re-classified.
        MembershipEvent::Restart { .. } => {
            Transition::new(RegionState::Unclassified, RehomeAction::UsePublic)
        }
        // A dead peer keeps its current address so reconnect attempts can
        // still reach it.
        MembershipEvent::Dead { .. } => Transition::new(current, RehomeAction::Keep),
        MembershipEvent::Join { endpoint }
        | MembershipEvent::Alive { endpoint }
        | MembershipEvent::Change { endpoint, .. } => {
            classify_peer(local_dc, current, *endpoint, peer_state)
        }
    }
}

fn classify_peer(
    local_dc: &str,
    current: RegionState,
    endpoint: Endpoint,
    peer_state: Option<&EndpointState>,
) -> Transition {
    // Zone not gossiped yet: a valid transient condition, not an error.
    let zone = match peer_state.and_then(|state| state.get(state_keys::ZONE)) {
        Some(zone) => zone.value.clone(),
        None => return Transition::new(current, RehomeAction::Keep),
    };

    let label = match classify(&zone) {
        Ok(label) => label,
        Err(_) => {
            let action = if current == RegionState::SameRegion {
                RehomeAction::UsePublic
            } else {
                RehomeAction::Keep
            };
            return Transition::new(RegionState::Unclassified, action)
                .with_note(TransitionNote::MalformedZone);
        }
    };

    if label.datacenter != local_dc {
        return Transition::new(RegionState::DifferentRegion, RehomeAction::UsePublic);
    }

    match private_addr(endpoint, peer_state) {
        // Same datacenter and the private address is known: rehome. A
        // republished address takes the same path, an idempotent overwrite.
        Some(addr) => Transition::new(RegionState::SameRegion, RehomeAction::UsePrivate(addr)),
        None if current == RegionState::SameRegion => {
            Transition::new(RegionState::SameRegion, RehomeAction::Keep)
        }
        None => Transition::new(RegionState::Unclassified, RehomeAction::Keep)
            .with_note(TransitionNote::AwaitingPrivateAddr),
    }
}

/// The peer's published private address, on the same port as its public
/// endpoint. Unparseable values are treated as not yet published.
fn private_addr(endpoint: Endpoint, peer_state: Option<&EndpointState>) -> Option<SocketAddr> {
    let raw = peer_state?.get(state_keys::INTERNAL_IP)?;
    let ip: IpAddr = raw.value.parse().ok()?;
    Some(SocketAddr::new(ip, endpoint.port()))
}

/// Membership subscriber that applies rehoming transitions to the shared
/// [`ConnectionAddressTable`].
pub struct AddressRehomingSubscriber {
    local_dc: String,
    table: Arc<ConnectionAddressTable>,
    membership: Arc<dyn MembershipEngine>,
    states: DashMap<Endpoint, RegionState>,
    metrics: Arc<SnitchMetrics>,
}

impl AddressRehomingSubscriber {
    /// Create a subscriber for a node in datacenter `local_dc`.
    pub fn new(
        local_dc: impl Into<String>,
        table: Arc<ConnectionAddressTable>,
        membership: Arc<dyn MembershipEngine>,
        metrics: Arc<SnitchMetrics>,
    ) -> Self {
        Self {
            local_dc: local_dc.into(),
            table,
            membership,
            states: DashMap::new(),
            metrics,
        }
    }

    /// The peer's current classification.
    pub fn region_state(&self, endpoint: Endpoint) -> RegionState {
        self.states
            .get(&endpoint)
            .map(|state| *state)
            .unwrap_or(RegionState::Unclassified)
    }
}

impl MembershipSubscriber for AddressRehomingSubscriber {
    fn on_event(&self, event: MembershipEvent) {
        let endpoint = event.endpoint();

        if !matches!(event, MembershipEvent::Remove { .. }) {
            self.table.ensure(endpoint);
        }

        let current = self.region_state(endpoint);
        let peer_state = self.membership.endpoint_state(endpoint);
        let transition = plan(&self.local_dc, current, &event, peer_state.as_ref());

        match transition.action {
            RehomeAction::Keep => {}
            RehomeAction::UsePrivate(addr) => {
                self.table.set(endpoint, addr);
                if current != RegionState::SameRegion {
                    self.metrics.peers_rehomed.inc();
                    info!(%endpoint, private = %addr, "rehomed peer onto intra-region address");
                }
            }
            RehomeAction::UsePublic => {
                self.table.reset(endpoint);
                if current == RegionState::SameRegion {
                    self.metrics.peers_reverted.inc();
                    info!(%endpoint, "reverted peer to public address");
                }
            }
            RehomeAction::Forget => {
                self.table.remove(endpoint);
                self.states.remove(&endpoint);
                debug!(%endpoint, "forgot removed peer");
                return;
            }
        }

        if transition.note == Some(TransitionNote::MalformedZone) {
            self.metrics.malformed_zones.inc();
            warn!(%endpoint, "peer published an unclassifiable zone, leaving unclassified");
        }

        self.states.insert(endpoint, transition.next);
    }
}
