//! Bounded-timeout lookups against the link-local cloud metadata service.

use crate::config::MetadataConfig;
use crate::error::{Error, MetadataError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Path returning the node's externally-routable IPv4 address.
pub const PUBLIC_IPV4_PATH: &str = "public-ipv4";

/// Path returning the node's internal IPv4 address.
pub const LOCAL_IPV4_PATH: &str = "local-ipv4";

/// Path returning the node's availability zone, e.g. `us-east-1a`.
pub const AVAILABILITY_ZONE_PATH: &str = "placement/availability-zone";

/// Source of node metadata values.
///
/// The production implementation is [`MetadataFetcher`]; tests substitute a
/// canned source so no network is needed.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch a single metadata value as a bare string.
    async fn fetch(&self, path: &str) -> std::result::Result<String, MetadataError>;

    /// Full location of `path`, for error reports.
    fn url_for(&self, path: &str) -> String {
        path.to_string()
    }
}

/// HTTP client for the cloud metadata service.
///
/// Each call is a fresh, uncached GET with a short bounded timeout. There
/// are no retries here: at startup a failure is fatal to node
/// initialization, and retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MetadataFetcher {
    /// Create a fetcher from the given configuration.
    pub fn new(config: &MetadataConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("metadata http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    fn full_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl MetadataSource for MetadataFetcher {
    async fn fetch(&self, path: &str) -> std::result::Result<String, MetadataError> {
        let url = self.full_url(path);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(MetadataError::Timeout {
                    url,
                    timeout: self.timeout,
                });
            }
            Err(e) => {
                return Err(MetadataError::Unreachable {
                    url,
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::BadResponse {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout {
                    url: url.clone(),
                    timeout: self.timeout,
                }
            } else {
                MetadataError::Unreachable {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let value = body.trim().to_string();
        if value.is_empty() {
            return Err(MetadataError::Malformed { url, value });
        }

        debug!(%url, %value, "fetched metadata value");
        Ok(value)
    }

    fn url_for(&self, path: &str) -> String {
        self.full_url(path)
    }
}
