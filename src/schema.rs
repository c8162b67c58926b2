//! Declarative field schema for the awaiter resource
//!
//! Describes the configuration surface the host exposes to users: field
//! names, descriptions, defaults, and which fields force a new instance
//! when changed.

/// Name of the single resource type this provider serves
pub const RESOURCE_TYPE: &str = "kubernetes_resource_awaiter";

/// Default polling timeout
pub const DEFAULT_TIMEOUT: &str = "5m";

/// Default interval between probes
pub const DEFAULT_POLL: &str = "1s";

/// Fields of which exactly one must be set
pub const CA_FIELDS: [&str; 2] = ["cacert", "cacert_path"];

/// One configuration field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name as written in the resource description
    pub name: &'static str,
    /// User-facing description
    pub description: &'static str,
    /// Whether the field must be set
    pub required: bool,
    /// Default applied when unset
    pub default: Option<&'static str>,
    /// Changing this field requires a new resource instance
    pub force_new: bool,
    /// Group of fields of which exactly one must be set
    pub exactly_one_of: &'static [&'static str],
}

/// All fields of the awaiter resource
pub const FIELDS: &[FieldSchema] = &[
    FieldSchema {
        name: "cacert",
        description: "CA certificate content",
        required: false,
        default: None,
        force_new: true,
        exactly_one_of: &CA_FIELDS,
    },
    FieldSchema {
        name: "cacert_path",
        description: "path to CA certificate file",
        required: false,
        default: None,
        force_new: true,
        exactly_one_of: &CA_FIELDS,
    },
    FieldSchema {
        name: "token",
        description: "bearer token for serviceaccount",
        required: true,
        default: None,
        force_new: true,
        exactly_one_of: &[],
    },
    FieldSchema {
        name: "timeout",
        description: "polling timeout, ex: 2m30s",
        required: false,
        default: Some(DEFAULT_TIMEOUT),
        force_new: false,
        exactly_one_of: &[],
    },
    FieldSchema {
        name: "poll",
        description: "polling interval, ex: 1s",
        required: false,
        default: Some(DEFAULT_POLL),
        force_new: false,
        exactly_one_of: &[],
    },
    FieldSchema {
        name: "uri",
        description: "full uri to kubernetes api resource",
        required: true,
        default: None,
        force_new: true,
        exactly_one_of: &[],
    },
];

/// Look up a field by name
pub fn field(name: &str) -> Option<&'static FieldSchema> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Names of the fields that force a new instance when changed
pub fn force_new_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().filter(|f| f.force_new).map(|f| f.name)
}
