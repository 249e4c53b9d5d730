//! Testing utilities: in-memory stand-ins for the membership engine and
//! the metadata service, usable by embedders as well as this crate's own
//! scenario tests.

mod rehoming_tests;
mod utils;

pub use utils::{InMemoryMembership, StaticMetadata};
