//! Topology classification: mapping endpoints to (datacenter, rack).

pub mod classifier;
pub mod snitch;

pub use classifier::classify;
pub use snitch::{CloudSnitch, MultiRegionSnitch, SimpleSnitch, Snitch};
