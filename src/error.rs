//! Error types for topology resolution and address rehoming.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for topology and rehoming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Cloud metadata service errors.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Topology classification errors.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors from the link-local cloud metadata service.
///
/// Any of these during startup identity resolution is fatal: a node that
/// cannot determine its public identity must not join the cluster.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The metadata service could not be reached.
    #[error("metadata service unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The request exceeded the configured timeout. Metadata services are
    /// link-local and answer in milliseconds; a timeout is a failure, not
    /// congestion.
    #[error("metadata request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The service answered with a non-2xx status or an empty body.
    #[error("metadata service returned status {status} for {url}")]
    BadResponse { url: String, status: u16 },

    /// The service answered 2xx but the body was not usable as the
    /// requested value (e.g. an unparseable IP address).
    #[error("metadata service returned unparseable value {value:?} for {url}")]
    Malformed { url: String, value: String },
}

/// Topology classification errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The raw availability-zone string does not match the expected
    /// `<region><az-suffix>` format.
    #[error("malformed availability zone: {0:?}")]
    MalformedZone(String),
}
