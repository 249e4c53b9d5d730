//! Membership events delivered by the external membership engine.

use crate::types::{Endpoint, VersionedValue};

/// Events about a peer's membership, delivered by the membership engine.
///
/// Delivery is at-least-once and single-threaded per peer; subscribers must
/// be idempotent under re-delivery.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    /// A peer joined the cluster.
    Join {
        /// The peer's broadcast address.
        endpoint: Endpoint,
    },

    /// One of a peer's application-state entries changed.
    Change {
        /// The peer's broadcast address.
        endpoint: Endpoint,
        /// The application-state key that changed.
        key: String,
        /// The new value.
        value: VersionedValue,
    },

    /// A peer was marked alive by failure detection.
    Alive {
        /// The peer's broadcast address.
        endpoint: Endpoint,
    },

    /// A peer was marked dead by failure detection.
    Dead {
        /// The peer's broadcast address.
        endpoint: Endpoint,
    },

    /// A peer restarted; its previously published state is invalidated.
    Restart {
        /// The peer's broadcast address.
        endpoint: Endpoint,
    },

    /// A peer permanently left the cluster.
    Remove {
        /// The peer's broadcast address.
        endpoint: Endpoint,
    },
}

impl MembershipEvent {
    /// Get the endpoint this event concerns.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            MembershipEvent::Join { endpoint }
            | MembershipEvent::Change { endpoint, .. }
            | MembershipEvent::Alive { endpoint }
            | MembershipEvent::Dead { endpoint }
            | MembershipEvent::Restart { endpoint }
            | MembershipEvent::Remove { endpoint } => *endpoint,
        }
    }

    /// Whether this event invalidates previously learned peer state.
    pub fn is_reset(&self) -> bool {
        matches!(
            self,
            MembershipEvent::Restart { .. } | MembershipEvent::Remove { .. }
        )
    }
}

/// Subscriber for membership events.
pub trait MembershipSubscriber: Send + Sync + 'static {
    /// Called for every membership event.
    fn on_event(&self, event: MembershipEvent);
}

/// Subscriber that logs events.
pub struct LoggingSubscriber;

impl MembershipSubscriber for LoggingSubscriber {
    fn on_event(&self, event: MembershipEvent) {
        match &event {
            MembershipEvent::Join { endpoint } => {
                tracing::info!(%endpoint, "peer joined cluster");
            }
            MembershipEvent::Change { endpoint, key, .. } => {
                tracing::debug!(%endpoint, %key, "peer state changed");
            }
            MembershipEvent::Alive { endpoint } => {
                tracing::debug!(%endpoint, "peer marked alive");
            }
            MembershipEvent::Dead { endpoint } => {
                tracing::warn!(%endpoint, "peer marked dead");
            }
            MembershipEvent::Restart { endpoint } => {
                tracing::info!(%endpoint, "peer restarted");
            }
            MembershipEvent::Remove { endpoint } => {
                tracing::info!(%endpoint, "peer removed from cluster");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_endpoint() {
        let endpoint: Endpoint = "203.0.113.20:7000".parse().unwrap();
        let event = MembershipEvent::Join { endpoint };
        assert_eq!(event.endpoint(), endpoint);
    }

    #[test]
    fn test_reset_events() {
        let endpoint: Endpoint = "203.0.113.20:7000".parse().unwrap();

        assert!(MembershipEvent::Restart { endpoint }.is_reset());
        assert!(MembershipEvent::Remove { endpoint }.is_reset());
        assert!(!MembershipEvent::Alive { endpoint }.is_reset());
        assert!(!MembershipEvent::Dead { endpoint }.is_reset());
    }
}
