//! Resource kinds managed on the broker.
//!
//! Each kind is a zero-sized type implementing [`KindSpec`]: the schema plus
//! the mapping between declared attributes and the management API's
//! representation. The CRUD logic itself lives once, in
//! [`Reconciler`](crate::reconciler::Reconciler).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use warren_client::api::encode_segment;
use warren_client::{Created, ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::schema::{Attributes, Schema};

pub mod binding;
pub mod exchange;
pub mod permissions;
pub mod policy;
pub mod queue;
pub mod user;
pub mod vhost;

pub use binding::Binding;
pub use exchange::Exchange;
pub use permissions::Permissions;
pub use policy::Policy;
pub use queue::Queue;
pub use user::User;
pub use vhost::Vhost;

/// The closed set of resource kinds.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vhost,
    User,
    Permissions,
    Exchange,
    Queue,
    Binding,
    Policy,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        Self::Vhost,
        Self::User,
        Self::Permissions,
        Self::Exchange,
        Self::Queue,
        Self::Binding,
        Self::Policy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vhost => "vhost",
            Self::User => "user",
            Self::Permissions => "permissions",
            Self::Exchange => "exchange",
            Self::Queue => "queue",
            Self::Binding => "binding",
            Self::Policy => "policy",
        }
    }

    pub fn object_kind(self) -> ObjectKind {
        match self {
            Self::Vhost => ObjectKind::Vhost,
            Self::User => ObjectKind::User,
            Self::Permissions => ObjectKind::Permissions,
            Self::Exchange => ObjectKind::Exchange,
            Self::Queue => ObjectKind::Queue,
            Self::Binding => ObjectKind::Binding,
            Self::Policy => ObjectKind::Policy,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ProvisionerError;

    /// Accepts both `user` and the provider-style `rabbitmq_user`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("rabbitmq_").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| ProvisionerError::UnknownKind(s.to_string()))
    }
}

/// What Create does when the natural key is already taken remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExisting {
    /// Fail with `AlreadyExists` and leave the remote object untouched.
    Reject,
    /// Issue the create anyway; the broker's PUT replaces the object.
    Overwrite,
}

/// Per-kind mapping between declared attributes and the management API.
///
/// `attrs` arguments always have defaults applied.
pub trait KindSpec: Send + Sync + 'static {
    const KIND: ResourceKind;
    const ON_EXISTING: OnExisting;

    fn schema() -> Schema;

    /// The id this declaration will get, when it derives from natural keys.
    fn natural_id(attrs: &Attributes) -> Option<String>;

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError>;

    fn request_body(attrs: &Attributes) -> Value;

    /// Remote representation → observed attributes (before normalization).
    fn observe(id: &str, remote: &Value) -> Attributes;

    /// Where the create request goes.
    fn create_key(attrs: &Attributes) -> Result<ObjectKey, ProvisionerError> {
        let id = Self::natural_id(attrs).ok_or_else(|| {
            ProvisionerError::Validation(format!("{} has no natural key", Self::KIND))
        })?;
        Self::key_for_id(&id)
    }

    fn id_after_create(attrs: &Attributes, _created: &Created) -> Result<String, ProvisionerError> {
        Self::natural_id(attrs).ok_or_else(|| {
            ProvisionerError::Validation(format!("{} has no natural key", Self::KIND))
        })
    }
}

// ── attribute helpers ────────────────────────────────────────────────────

pub(crate) fn str_attr<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(Value::as_str)
}

pub(crate) fn bool_attr(attrs: &Attributes, name: &str) -> bool {
    attrs.get(name).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn map_attr(attrs: &Attributes, name: &str) -> Value {
    attrs
        .get(name)
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// Copy `fields` from the remote object, skipping any it doesn't report.
pub(crate) fn copy_fields(remote: &Value, fields: &[&str], out: &mut Attributes) {
    for field in fields {
        if let Some(value) = remote.get(*field).filter(|v| !v.is_null()) {
            out.insert(field.to_string(), value.clone());
        }
    }
}

/// `name@vhost` ids used by vhost-scoped kinds.
///
/// Both components are percent-encoded, so the separator is the only `@`
/// in the id even when a user or vhost name contains one.
pub(crate) fn scoped_id(name: &str, vhost: &str) -> String {
    format!("{}@{}", encode_segment(name), encode_segment(vhost))
}

/// Inverse of [`scoped_id`]. Also accepts unencoded ids typed by hand
/// (e.g. `jobs@/`), split on the last `@`.
pub(crate) fn split_scoped_id(
    id: &str,
    kind: ResourceKind,
) -> Result<(String, String), ProvisionerError> {
    let invalid = || {
        ProvisionerError::Validation(format!("invalid {kind} id '{id}', expected name@vhost"))
    };
    let (name, vhost) = id.rsplit_once('@').ok_or_else(invalid)?;
    let name = decode_component(name).ok_or_else(invalid)?;
    let vhost = decode_component(vhost).ok_or_else(invalid)?;
    if name.is_empty() || vhost.is_empty() {
        return Err(invalid());
    }
    Ok((name, vhost))
}

pub(crate) fn decode_component(part: &str) -> Option<String> {
    percent_decode_str(part)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
