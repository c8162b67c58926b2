//! Status classification
//!
//! Maps a probe result to Ready (200), NotYetReady (404) or Failed. Failure
//! bodies are expected to be Kubernetes `Status` objects; anything that isn't
//! JSON or lacks a string `message` is a parse error, never a panic.

use serde_json::Value;

use crate::error::Error;
use crate::probe::ProbeResult;
use crate::Result;

/// Outcome of one probe
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedOutcome {
    /// The resource exists
    Ready,
    /// The resource does not exist yet
    NotYetReady,
    /// The server rejected the request
    Failed {
        /// HTTP status code
        status: u16,
        /// The body's "message" field
        message: String,
        /// The raw body
        detail: String,
    },
}

impl ClassifiedOutcome {
    /// Convert a failure into its error, `None` otherwise
    pub fn into_error(self) -> Option<Error> {
        match self {
            Self::Failed {
                status,
                message,
                detail,
            } => Some(Error::Resource {
                status,
                message,
                detail,
            }),
            _ => None,
        }
    }
}

/// Classify a probe result
pub fn classify(result: &ProbeResult) -> Result<ClassifiedOutcome> {
    match result.status {
        200 => Ok(ClassifiedOutcome::Ready),
        404 => Ok(ClassifiedOutcome::NotYetReady),
        status => {
            let detail = result.body_text();
            let body: Value = serde_json::from_slice(&result.body).map_err(|e| {
                Error::parse(
                    format!("HTTP {} response body is not valid JSON: {}", status, e),
                    detail.clone(),
                )
            })?;

            let Some(fields) = body.as_object() else {
                return Err(Error::parse(
                    format!("HTTP {} response body is not a JSON object", status),
                    detail,
                ));
            };

            let message = match fields.get("message") {
                Some(Value::String(message)) => message.clone(),
                Some(_) => {
                    return Err(Error::parse(
                        format!("HTTP {} response field \"message\" is not a string", status),
                        detail,
                    ))
                }
                None => {
                    return Err(Error::parse(
                        format!("HTTP {} response has no \"message\" field", status),
                        detail,
                    ))
                }
            };

            Ok(ClassifiedOutcome::Failed {
                status,
                message,
                detail,
            })
        }
    }
}
