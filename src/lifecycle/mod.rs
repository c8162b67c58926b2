//! Lifecycle adapter
//!
//! The only surface the host sees. [`ResourceAwaiter`] exposes create, read,
//! update and delete for one declared awaiter resource, each returning
//! [`Diagnostics`]. The resource's only persisted state is its
//! [`ResourceIdentity`].
//!
//! - create: polls until the resource exists, then records its identity
//! - read: one probe, reconciles identity (no retry, no timeout)
//! - update: same as read; timing changes only affect future creates
//! - delete: forgets the identity, never touches the network
//!
//! The remote resource is never modified.

mod identity;

pub use identity::ResourceIdentity;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::classify::{classify, ClassifiedOutcome};
use crate::config::{AwaiterConfig, AwaiterSpec, ConnectionConfig};
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::Error;
use crate::poll::{Clock, PollGovernor, TokioClock, TransportErrorPolicy};
use crate::probe::{probe_or_cancel, HttpProberFactory, ProberFactory};
use crate::Result;

/// Create/read/update/delete for the awaiter resource
///
/// Holds only immutable collaborators, so one instance can serve any number
/// of independent resources concurrently.
#[derive(Clone)]
pub struct ResourceAwaiter {
    factory: Arc<dyn ProberFactory>,
    clock: Arc<dyn Clock>,
    transport_policy: TransportErrorPolicy,
}

impl Default for ResourceAwaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceAwaiter {
    /// Awaiter using real HTTP and wall-clock time
    pub fn new() -> Self {
        Self {
            factory: Arc::new(HttpProberFactory),
            clock: Arc::new(TokioClock),
            transport_policy: TransportErrorPolicy::default(),
        }
    }

    /// Use a different prober factory
    pub fn with_factory(mut self, factory: Arc<dyn ProberFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Use a different time source for create
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Change how create reacts to transport failures
    pub fn with_transport_policy(mut self, policy: TransportErrorPolicy) -> Self {
        self.transport_policy = policy;
        self
    }

    /// Wait for the resource to exist
    ///
    /// On success `identity` becomes the URI path. On any failure it is left
    /// untouched and exactly one error diagnostic is returned.
    #[instrument(skip_all, fields(uri = %spec.uri))]
    pub async fn create(
        &self,
        spec: &AwaiterSpec,
        identity: &mut ResourceIdentity,
        cancel: &CancellationToken,
    ) -> Diagnostics {
        let config = match AwaiterConfig::from_spec(spec) {
            Ok(config) => config,
            Err(e) => return e.into(),
        };

        let mut diags = Diagnostics::new();
        if config.poll_exceeds_timeout() {
            warn!(
                timeout = ?config.timeout,
                poll = ?config.poll_interval,
                "Poll interval is not shorter than timeout; at most one probe will run"
            );
            diags.push(Diagnostic::warning(
                "Poll interval is not shorter than timeout",
                format!(
                    "poll {:?} >= timeout {:?}: at most one probe will run",
                    config.poll_interval, config.timeout
                ),
            ));
        }

        info!(
            path = config.connection.path(),
            timeout = ?config.timeout,
            poll = ?config.poll_interval,
            "Waiting for resource"
        );

        match self.await_resource(&config, cancel).await {
            Ok(path) => {
                identity.set(path);
                diags
            }
            Err(e) => e.into(),
        }
    }

    async fn await_resource(
        &self,
        config: &AwaiterConfig,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let prober = self.factory.build(&config.connection)?;

        PollGovernor::from_config(config)
            .with_clock(self.clock.clone())
            .with_policy(self.transport_policy)
            .run(prober.as_ref(), config.connection.path(), cancel)
            .await
    }

    /// Reconcile identity with one probe
    ///
    /// 200 sets the identity, 404 clears it without error. Anything else is
    /// reported and leaves the identity unchanged. `timeout` and `poll` are
    /// not consulted.
    #[instrument(skip_all, fields(uri = %spec.uri))]
    pub async fn read(
        &self,
        spec: &AwaiterSpec,
        identity: &mut ResourceIdentity,
        cancel: &CancellationToken,
    ) -> Diagnostics {
        self.reconcile(spec, identity, cancel).await.into()
    }

    async fn reconcile(
        &self,
        spec: &AwaiterSpec,
        identity: &mut ResourceIdentity,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let connection = ConnectionConfig::from_spec(spec)?;
        let prober = self.factory.build(&connection)?;
        let result = probe_or_cancel(prober.as_ref(), cancel).await?;

        match classify(&result)? {
            ClassifiedOutcome::Ready => {
                debug!(path = connection.path(), "Resource present");
                identity.set(connection.path());
                Ok(())
            }
            ClassifiedOutcome::NotYetReady => {
                if identity.is_present() {
                    info!(path = connection.path(), "Resource gone, clearing identity");
                }
                identity.clear();
                Ok(())
            }
            ClassifiedOutcome::Failed {
                status,
                message,
                detail,
            } => Err(Error::Resource {
                status,
                message,
                detail,
            }),
        }
    }

    /// Reconcile after a configuration change
    ///
    /// Only `timeout` and `poll` can change in place and neither affects an
    /// existing instance, so this is a read.
    pub async fn update(
        &self,
        spec: &AwaiterSpec,
        identity: &mut ResourceIdentity,
        cancel: &CancellationToken,
    ) -> Diagnostics {
        self.read(spec, identity, cancel).await
    }

    /// Forget the resource
    ///
    /// Clears the identity and always succeeds. No network call is made.
    pub fn delete(&self, identity: &mut ResourceIdentity) -> Diagnostics {
        identity.clear();
        Diagnostics::new()
    }
}

#[cfg(test)]
mod tests;
