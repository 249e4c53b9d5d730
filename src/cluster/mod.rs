//! Cluster membership boundary and address rehoming.

pub mod address_table;
pub mod events;
pub mod rehoming;
pub mod state;

pub use address_table::ConnectionAddressTable;
pub use events::{LoggingSubscriber, MembershipEvent, MembershipSubscriber};
pub use rehoming::{plan, AddressRehomingSubscriber, RegionState, RehomeAction, Transition};
pub use state::{EndpointState, MembershipEngine};
