//! Resource identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an awaiter instance
///
/// The URI path of the awaited resource when it was last confirmed ready,
/// empty when absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    /// An absent identity
    pub fn absent() -> Self {
        Self::default()
    }

    /// Identity for the given path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// True once the resource has been observed ready
    pub fn is_present(&self) -> bool {
        !self.0.is_empty()
    }

    /// The identity string (empty when absent)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn set(&mut self, path: impl Into<String>) {
        self.0 = path.into();
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
