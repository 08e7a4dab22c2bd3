//! Bounded polling for resources that exist before they can be read.
//!
//! A freshly dispatched search job answers `204 No Content` until the server
//! has materialized it. [`poll_entry`] retries such reads at a fixed interval
//! and gives up with [`ResourceError::TimedOut`] once the attempt budget is
//! spent.

use crate::atom::{self, ParsedEntry};
use crate::endpoint::Endpoint;
use crate::error::{ResourceError, Result};
use crate::transport::{Params, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Status a resource answers with while it is not ready to be read.
pub const NOT_READY: u16 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// GETs `relative` until it answers with something other than
/// [`NOT_READY`], sleeping `policy.interval` between attempts.
pub async fn poll(endpoint: &Endpoint, relative: &str, policy: &RetryPolicy) -> Result<Response> {
    let path = endpoint.join(relative);
    for attempt in 1..=policy.max_attempts {
        let response = endpoint.get(relative, &Params::new()).await?;
        if response.status != NOT_READY {
            return Ok(response);
        }
        debug!(%path, attempt, "Not ready");
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    warn!(%path, attempts = policy.max_attempts, "Gave up waiting");
    Err(ResourceError::TimedOut(path))
}

/// Polls the endpoint itself and decodes the entry at the document root.
pub async fn poll_entry(endpoint: &Endpoint, policy: &RetryPolicy) -> Result<ParsedEntry> {
    let response = poll(endpoint, "", policy).await?;
    Ok(atom::parse_entry(&atom::load_entry(&response.body)?))
}
