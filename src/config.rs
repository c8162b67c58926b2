//! Awaiter configuration
//!
//! [`AwaiterSpec`] is the resource as the host describes it: plain strings,
//! defaults applied. It is parsed and validated once into
//! [`ConnectionConfig`] (what a probe needs) and [`AwaiterConfig`] (connection
//! plus polling budget). Nothing downstream sees an unvalidated value.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::schema::{self, DEFAULT_POLL, DEFAULT_TIMEOUT};
use crate::Result;

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_poll() -> String {
    DEFAULT_POLL.to_string()
}

/// Resource description as received from the host
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwaiterSpec {
    /// CA certificate content (PEM)
    #[serde(default)]
    pub cacert: Option<String>,
    /// Path to a CA certificate file (PEM)
    #[serde(default)]
    pub cacert_path: Option<String>,
    /// Bearer token for the service account
    pub token: String,
    /// Polling timeout, e.g. "2m30s"
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Polling interval, e.g. "1s"
    #[serde(default = "default_poll")]
    pub poll: String,
    /// Full URI to the Kubernetes API resource
    pub uri: String,
}

impl AwaiterSpec {
    /// Create a spec with default timeout and poll interval and no CA set
    pub fn new(uri: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            cacert: None,
            cacert_path: None,
            token: token.into(),
            timeout: default_timeout(),
            poll: default_poll(),
            uri: uri.into(),
        }
    }

    /// Trust the given PEM content
    pub fn with_cacert(mut self, pem: impl Into<String>) -> Self {
        self.cacert = Some(pem.into());
        self
    }

    /// Trust the PEM file at the given path
    pub fn with_cacert_path(mut self, path: impl Into<String>) -> Self {
        self.cacert_path = Some(path.into());
        self
    }

    /// Set the polling timeout
    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Set the polling interval
    pub fn with_poll(mut self, poll: impl Into<String>) -> Self {
        self.poll = poll.into();
        self
    }

    /// Raw value of a field by its schema name
    pub fn value(&self, field: &str) -> Option<&str> {
        match field {
            "cacert" => non_empty(&self.cacert),
            "cacert_path" => non_empty(&self.cacert_path),
            "token" => Some(&self.token),
            "timeout" => Some(&self.timeout),
            "poll" => Some(&self.poll),
            "uri" => Some(&self.uri),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` needs a new resource instance
    ///
    /// True if any force-new field differs. Changes to `timeout` and `poll`
    /// update in place and only affect future creates.
    pub fn requires_replacement(&self, next: &AwaiterSpec) -> bool {
        schema::force_new_fields().any(|name| self.value(name) != next.value(name))
    }
}

impl fmt::Debug for AwaiterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwaiterSpec")
            .field("cacert", &self.cacert.as_ref().map(|_| "<pem>"))
            .field("cacert_path", &self.cacert_path)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("poll", &self.poll)
            .field("uri", &self.uri)
            .finish()
    }
}

/// Host SDKs report empty strings for unset optional fields
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Where the trusted root CA comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaSource {
    /// Inline PEM content
    Inline(String),
    /// Path to a PEM file
    File(PathBuf),
}

/// Everything a probe needs: target, credentials, trust
///
/// All of these fields force a new instance when changed.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Trusted root CA
    pub ca: CaSource,
    /// Bearer token, zeroized on drop
    pub token: Zeroizing<String>,
    /// Target resource
    pub uri: Url,
}

impl ConnectionConfig {
    /// Validate the connection fields of a spec
    pub fn from_spec(spec: &AwaiterSpec) -> Result<Self> {
        let ca = match (non_empty(&spec.cacert), non_empty(&spec.cacert_path)) {
            (Some(pem), None) => CaSource::Inline(pem.to_string()),
            (None, Some(path)) => CaSource::File(PathBuf::from(path)),
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "cacert",
                    "only one of cacert and cacert_path may be set",
                ))
            }
            (None, None) => {
                return Err(Error::config(
                    "cacert",
                    "one of cacert and cacert_path must be set",
                ))
            }
        };

        if spec.token.is_empty() {
            return Err(Error::config("token", "token must not be empty"));
        }

        let uri = Url::parse(&spec.uri)
            .map_err(|e| Error::config("uri", format!("invalid uri {:?}: {}", spec.uri, e)))?;

        Ok(Self {
            ca,
            token: Zeroizing::new(spec.token.clone()),
            uri,
        })
    }

    /// Identity reported for this target: the URI path component
    ///
    /// The path is kept in its normalized, percent-encoded form, so a URI
    /// without a path reports `/` and `%20` stays encoded.
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ca = match &self.ca {
            CaSource::Inline(_) => "inline".to_string(),
            CaSource::File(path) => path.display().to_string(),
        };
        f.debug_struct("ConnectionConfig")
            .field("ca", &ca)
            .field("token", &"<redacted>")
            .field("uri", &self.uri.as_str())
            .finish()
    }
}

/// Validated configuration for one create
#[derive(Clone, Debug)]
pub struct AwaiterConfig {
    /// Probe target and credentials
    pub connection: ConnectionConfig,
    /// Maximum time to wait for the resource
    pub timeout: Duration,
    /// Delay between probes while the resource is absent
    pub poll_interval: Duration,
}

impl AwaiterConfig {
    /// Validate a full spec
    pub fn from_spec(spec: &AwaiterSpec) -> Result<Self> {
        let timeout = parse_positive("timeout", &spec.timeout)?;
        let poll_interval = parse_positive("poll", &spec.poll)?;
        let connection = ConnectionConfig::from_spec(spec)?;

        Ok(Self {
            connection,
            timeout,
            poll_interval,
        })
    }

    /// True when at most one probe fits in the budget
    pub fn poll_exceeds_timeout(&self) -> bool {
        self.poll_interval >= self.timeout
    }
}

fn parse_positive(field: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value).map_err(|msg| Error::config(field, msg))?;
    if duration.is_zero() {
        return Err(Error::config(field, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Parse a duration string such as "2m30s", "1.5h" or "500ms".
///
/// A duration is a sequence of decimal numbers, each with a unit suffix.
/// Valid units are "ns", "us" (or "µs"), "ms", "s", "m", "h". A bare "0"
/// is zero. Signs are not accepted.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("invalid duration \"\": expected e.g. 30s, 2m30s, 1h".to_string());
    }

    let invalid = || format!("invalid duration {:?}: expected e.g. 30s, 2m30s, 1h", s);

    let mut rest = s;
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", s))?;
        let (number, tail) = rest.split_at(num_end);
        if number.is_empty() || number == "." {
            return Err(invalid());
        }

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, s)),
        };

        let value: f64 = number.parse().map_err(|_| invalid())?;
        total_nanos += value * nanos_per_unit;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration {:?} is out of range", s));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
