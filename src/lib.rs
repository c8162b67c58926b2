//! Kubernetes Awaiter - block a provisioning step until an API resource exists
//!
//! A declared awaiter resource names a Kubernetes API URI. Creating it polls
//! that URI with a bearer token until the server answers 200, the server
//! rejects the request, or the timeout passes. The remote resource is only
//! ever read.
//!
//! # Modules
//!
//! - [`config`] - Resource description and its validated form
//! - [`schema`] - Declarative field schema (descriptions, defaults, force-new)
//! - [`probe`] - Authenticated single-GET probe client
//! - [`classify`] - HTTP status classification (Ready / NotYetReady / Failed)
//! - [`poll`] - Poll governor state machine and time source
//! - [`lifecycle`] - Create/read/update/delete adapter for the host
//! - [`provider`] - Explicit provider construction
//! - [`diag`] - Diagnostics returned to the host
//! - [`telemetry`] - Tracing setup for the binary
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod classify;
pub mod config;
pub mod diag;
pub mod error;
pub mod lifecycle;
pub mod poll;
pub mod probe;
pub mod provider;
pub mod schema;
pub mod telemetry;

pub use config::{AwaiterConfig, AwaiterSpec, CaSource, ConnectionConfig};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::Error;
pub use lifecycle::{ResourceAwaiter, ResourceIdentity};
pub use provider::Provider;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
