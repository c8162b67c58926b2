//! Probe client
//!
//! A probe is one authenticated GET against the configured URI. Probes never
//! retry; the poll governor decides what happens next.
//!
//! # Dependency Injection
//!
//! - [`Prober`]: issues a single probe
//! - [`ProberFactory`]: builds a prober from a validated connection config
//!
//! The lifecycle adapter only talks to these traits, so tests can script
//! probe outcomes without a server.

mod http;

pub use http::{HttpProber, HttpProberFactory};

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::Result;

/// Status and body of one probe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ProbeResult {
    /// Create a probe result
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as text, with invalid UTF-8 replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues a single probe against a fixed target
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// Perform one GET and return its status and body
    async fn probe(&self) -> Result<ProbeResult>;
}

/// Builds probers for a connection config
#[cfg_attr(test, mockall::automock)]
pub trait ProberFactory: Send + Sync {
    /// Build a prober; fails with a transport error if the client can't be set up
    fn build(&self, connection: &ConnectionConfig) -> Result<Arc<dyn Prober>>;
}

/// Run one probe, aborting it if `cancel` fires first
pub async fn probe_or_cancel(
    prober: &dyn Prober,
    cancel: &CancellationToken,
) -> Result<ProbeResult> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = prober.probe() => result,
    }
}
