//! Poll governor
//!
//! Drives the prober and classifier on a fixed interval until the resource is
//! ready, the server rejects the request, or the timeout passes.
//!
//! ```text
//!            ┌──────────── NotYetReady, budget left ───────────┐
//!            ▼                                                 │
//!        Polling ──Ready──▶ Succeeded                       Waiting
//!            │  └──Failed / transport / parse──▶ Failed        ▲
//!            │                                                 │
//!            └──NotYetReady, budget spent──▶ TimedOut          │
//!            └─────────────────────────────────────────────────┘
//! ```
//!
//! The timeout is only checked after a probe reports NotYetReady, so a
//! create can overrun its timeout by up to one poll interval plus one
//! round-trip. Cancellation is honored during both the probe and the sleep.

mod clock;

pub use clock::{Clock, ManualClock, TokioClock};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::{classify, ClassifiedOutcome};
use crate::config::AwaiterConfig;
use crate::error::Error;
use crate::probe::{probe_or_cancel, Prober};
use crate::Result;

/// What to do when a probe can't reach the server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportErrorPolicy {
    /// Fail the create immediately
    #[default]
    Fail,
    /// Treat like NotYetReady: wait and probe again until the timeout
    Retry,
}

/// Governor state
#[derive(Debug)]
pub enum PollState {
    /// About to issue a probe
    Polling,
    /// Resource absent, sleeping before the next probe
    Waiting,
    /// Resource observed ready
    Succeeded,
    /// Terminal failure
    Failed(Error),
    /// Budget spent while the resource was still absent
    TimedOut {
        /// Time spent since the first probe
        elapsed: Duration,
    },
}

/// Polling budget and behavior for one create
#[derive(Clone)]
pub struct PollGovernor {
    timeout: Duration,
    poll_interval: Duration,
    policy: TransportErrorPolicy,
    clock: Arc<dyn Clock>,
}

impl PollGovernor {
    /// Create a governor on wall-clock time that fails on transport errors
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            policy: TransportErrorPolicy::default(),
            clock: Arc::new(TokioClock),
        }
    }

    /// Create a governor from a validated config
    pub fn from_config(config: &AwaiterConfig) -> Self {
        Self::new(config.timeout, config.poll_interval)
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different transport error policy
    pub fn with_policy(mut self, policy: TransportErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Poll until a terminal state
    ///
    /// Returns `path` once the resource is ready. Probes are strictly
    /// sequential.
    pub async fn run(
        &self,
        prober: &dyn Prober,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started_at = self.clock.now();
        let mut attempt = 0u32;
        let mut state = PollState::Polling;

        loop {
            state = match state {
                PollState::Polling => {
                    attempt += 1;
                    let outcome = probe_or_cancel(prober, cancel)
                        .await
                        .and_then(|result| classify(&result));
                    let elapsed = self.clock.now() - started_at;
                    debug!(
                        path,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Probe classified"
                    );
                    self.transition(outcome, elapsed)
                }
                PollState::Waiting => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => PollState::Failed(Error::Cancelled),
                        _ = self.clock.sleep(self.poll_interval) => PollState::Polling,
                    }
                }
                PollState::Succeeded => {
                    info!(path, attempt, "Resource is available");
                    return Ok(path.to_string());
                }
                PollState::Failed(err) => {
                    warn!(path, attempt, error = %err, "Await failed");
                    return Err(err);
                }
                PollState::TimedOut { elapsed } => {
                    warn!(
                        path,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Timed out waiting for resource"
                    );
                    return Err(Error::Timeout {
                        path: path.to_string(),
                        elapsed,
                    });
                }
            };
        }
    }

    /// Next state after a probe, given time spent so far
    pub fn transition(&self, outcome: Result<ClassifiedOutcome>, elapsed: Duration) -> PollState {
        let not_ready = || {
            if elapsed >= self.timeout {
                PollState::TimedOut { elapsed }
            } else {
                PollState::Waiting
            }
        };

        match outcome {
            Ok(ClassifiedOutcome::Ready) => PollState::Succeeded,
            Ok(ClassifiedOutcome::NotYetReady) => not_ready(),
            Ok(ClassifiedOutcome::Failed {
                status,
                message,
                detail,
            }) => PollState::Failed(Error::Resource {
                status,
                message,
                detail,
            }),
            Err(err @ Error::Transport { .. }) if self.policy == TransportErrorPolicy::Retry => {
                warn!(error = %err, "Transport error, probing again");
                not_ready()
            }
            Err(err) => PollState::Failed(err),
        }
    }
}
