#![cfg(test)]
//! Subscriber-level rehoming tests driven through the in-memory engine.

use crate::cluster::address_table::ConnectionAddressTable;
use crate::cluster::events::MembershipEvent;
use crate::cluster::rehoming::{AddressRehomingSubscriber, RegionState};
use crate::cluster::state::MembershipEngine;
use crate::metrics::SnitchMetrics;
use crate::testing::utils::InMemoryMembership;
use crate::types::{state_keys, Endpoint, VersionedValue};
use std::net::SocketAddr;
use std::sync::Arc;

const LOCAL_DC: &str = "us-east-1";

struct Fixture {
    membership: Arc<InMemoryMembership>,
    table: Arc<ConnectionAddressTable>,
    metrics: Arc<SnitchMetrics>,
    subscriber: Arc<AddressRehomingSubscriber>,
}

fn fixture() -> Fixture {
    let membership = Arc::new(InMemoryMembership::new());
    let table = Arc::new(ConnectionAddressTable::new());
    let metrics = Arc::new(SnitchMetrics::new());

    let subscriber = Arc::new(AddressRehomingSubscriber::new(
        LOCAL_DC,
        table.clone(),
        membership.clone() as Arc<dyn MembershipEngine>,
        metrics.clone(),
    ));
    membership.register(subscriber.clone());

    Fixture {
        membership,
        table,
        metrics,
        subscriber,
    }
}

fn peer() -> Endpoint {
    "203.0.113.20:7000".parse().unwrap()
}

fn private() -> SocketAddr {
    "10.0.0.7:7000".parse().unwrap()
}

/// Publish zone and private address for the peer, delivering change events.
fn publish_same_region(fixture: &Fixture) {
    fixture
        .membership
        .publish_peer(peer(), state_keys::ZONE, VersionedValue::new(1, "us-east-1b"));
    fixture.membership.publish_peer(
        peer(),
        state_keys::INTERNAL_IP,
        VersionedValue::new(2, "10.0.0.7"),
    );
}

#[test]
fn test_peer_stays_public_until_private_addr_gossiped() {
    let fixture = fixture();
    fixture.membership.emit(MembershipEvent::Join { endpoint: peer() });

    assert_eq!(fixture.table.active(peer()), Some(peer()));

    // Zone alone classifies the datacenter but cannot rehome yet.
    fixture
        .membership
        .publish_peer(peer(), state_keys::ZONE, VersionedValue::new(1, "us-east-1b"));
    assert_eq!(fixture.table.active(peer()), Some(peer()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::Unclassified);
    assert_eq!(fixture.metrics.snapshot().peers_rehomed, 0);
}

#[test]
fn test_same_region_peer_rehomes_to_private_addr() {
    let fixture = fixture();
    fixture.membership.emit(MembershipEvent::Join { endpoint: peer() });
    publish_same_region(&fixture);

    assert_eq!(fixture.table.active(peer()), Some(private()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::SameRegion);
    assert_eq!(fixture.metrics.snapshot().peers_rehomed, 1);
}

#[test]
fn test_different_region_peer_keeps_public_addr() {
    let fixture = fixture();
    fixture
        .membership
        .publish_peer(peer(), state_keys::ZONE, VersionedValue::new(1, "us-west-2a"));
    fixture.membership.publish_peer(
        peer(),
        state_keys::INTERNAL_IP,
        VersionedValue::new(2, "10.0.0.7"),
    );

    assert_eq!(fixture.table.active(peer()), Some(peer()));
    assert_eq!(
        fixture.subscriber.region_state(peer()),
        RegionState::DifferentRegion
    );
}

#[test]
fn test_repeated_change_delivery_is_idempotent() {
    let fixture = fixture();
    publish_same_region(&fixture);

    // At-least-once delivery: the same change event arrives again.
    for _ in 0..3 {
        fixture.membership.emit(MembershipEvent::Change {
            endpoint: peer(),
            key: state_keys::INTERNAL_IP.to_string(),
            value: VersionedValue::new(2, "10.0.0.7"),
        });
    }

    assert_eq!(fixture.table.active(peer()), Some(private()));
    assert_eq!(fixture.metrics.snapshot().peers_rehomed, 1);
}

#[test]
fn test_restart_reverts_to_public_addr() {
    let fixture = fixture();
    publish_same_region(&fixture);
    assert_eq!(fixture.table.active(peer()), Some(private()));

    fixture
        .membership
        .emit(MembershipEvent::Restart { endpoint: peer() });

    assert_eq!(fixture.table.active(peer()), Some(peer()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::Unclassified);
    assert_eq!(fixture.metrics.snapshot().peers_reverted, 1);
}

#[test]
fn test_remove_deletes_table_entry() {
    let fixture = fixture();
    publish_same_region(&fixture);

    fixture
        .membership
        .emit(MembershipEvent::Remove { endpoint: peer() });

    assert_eq!(fixture.table.active(peer()), None);
    assert!(fixture.table.is_empty());
}

#[test]
fn test_reclassification_after_restart() {
    let fixture = fixture();
    publish_same_region(&fixture);
    fixture
        .membership
        .emit(MembershipEvent::Restart { endpoint: peer() });

    // The peer comes back and its state is gossiped again.
    fixture.membership.emit(MembershipEvent::Alive { endpoint: peer() });

    assert_eq!(fixture.table.active(peer()), Some(private()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::SameRegion);
    assert_eq!(fixture.metrics.snapshot().peers_rehomed, 2);
}

#[test]
fn test_malformed_zone_is_counted_not_fatal() {
    let fixture = fixture();
    fixture
        .membership
        .publish_peer(peer(), state_keys::ZONE, VersionedValue::new(1, "garbage"));

    assert_eq!(fixture.table.active(peer()), Some(peer()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::Unclassified);
    assert_eq!(fixture.metrics.snapshot().malformed_zones, 1);
}

#[test]
fn test_dead_peer_keeps_private_addr() {
    let fixture = fixture();
    publish_same_region(&fixture);

    fixture.membership.emit(MembershipEvent::Dead { endpoint: peer() });

    assert_eq!(fixture.table.active(peer()), Some(private()));
    assert_eq!(fixture.subscriber.region_state(peer()), RegionState::SameRegion);
}

#[test]
fn test_unrelated_peers_do_not_interfere() {
    let fixture = fixture();
    let other: Endpoint = "203.0.113.30:7000".parse().unwrap();

    publish_same_region(&fixture);
    fixture
        .membership
        .publish_peer(other, state_keys::ZONE, VersionedValue::new(1, "us-west-2a"));

    assert_eq!(fixture.table.active(peer()), Some(private()));
    assert_eq!(fixture.table.active(other), Some(other));
    assert_eq!(fixture.table.len(), 2);
}
