//! Provider construction
//!
//! The host asks the provider which resource types it serves and gets back a
//! schema and a lifecycle adapter for each. There is exactly one type,
//! [`RESOURCE_TYPE`]. Every call to [`Provider::new`] builds a self-contained
//! instance; nothing is registered globally.
//!
//! # Example
//!
//! ```text
//! let provider = Provider::new();
//! let resource = provider.resource("kubernetes_resource_awaiter")?;
//! let diags = resource.awaiter().create(&spec, &mut identity, &cancel).await;
//! ```

use std::collections::BTreeMap;

use crate::lifecycle::ResourceAwaiter;
use crate::schema::{FieldSchema, FIELDS, RESOURCE_TYPE};

/// Version reported by the binary
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One resource type: its schema plus its lifecycle adapter
#[derive(Clone)]
pub struct Resource {
    schema: &'static [FieldSchema],
    awaiter: ResourceAwaiter,
}

impl Resource {
    /// Field schema for the resource
    pub fn schema(&self) -> &'static [FieldSchema] {
        self.schema
    }

    /// Lifecycle adapter for the resource
    pub fn awaiter(&self) -> &ResourceAwaiter {
        &self.awaiter
    }
}

/// Set of resource types served to the host
#[derive(Clone)]
pub struct Provider {
    resources: BTreeMap<&'static str, Resource>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Provider with the default HTTP-backed awaiter
    pub fn new() -> Self {
        Self::with_awaiter(ResourceAwaiter::new())
    }

    /// Provider serving the given awaiter
    pub fn with_awaiter(awaiter: ResourceAwaiter) -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(
            RESOURCE_TYPE,
            Resource {
                schema: FIELDS,
                awaiter,
            },
        );
        Self { resources }
    }

    /// Names of the resource types served
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Look up a resource type by name
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }
}
