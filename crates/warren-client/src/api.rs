use std::fmt;
use std::future::Future;
use std::pin::Pin;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything except RFC 3986 unreserved characters is escaped, so a vhost
/// named `/` renders as `%2F` and never splits the path.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object collections exposed by the management API.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Vhost,
    User,
    Permissions,
    Exchange,
    Queue,
    Binding,
    Policy,
}

impl ObjectKind {
    pub fn collection(self) -> &'static str {
        match self {
            Self::Vhost => "vhosts",
            Self::User => "users",
            Self::Permissions => "permissions",
            Self::Exchange => "exchanges",
            Self::Queue => "queues",
            Self::Binding => "bindings",
            Self::Policy => "policies",
        }
    }
}

/// Address of one object (or, for binding creation, one binding collection).
///
/// Segments are kept raw; [`ObjectKey::path`] does the escaping.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub segments: Vec<String>,
}

impl ObjectKey {
    pub fn new<I, S>(kind: ObjectKind, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Path relative to `/api/`, e.g. `vhosts/%2F`.
    pub fn path(&self) -> String {
        let mut path = self.kind.collection().to_string();
        for segment in &self.segments {
            path.push('/');
            path.push_str(&encode_segment(segment));
        }
        path
    }

    /// A child key one level below this one.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            kind: self.kind,
            segments,
        }
    }
}

/// Same as [`ObjectKey::path`].
impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Outcome of a create call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Created {
    /// `Location` header, set when the server assigns the object's address
    /// (binding creation).
    pub location: Option<String>,
}

/// The management API surface the reconciler consumes.
///
/// `Get`, `Create`, `Update` and `Delete` by key. A 404 on `get` or `delete`
/// surfaces as [`ApiError::Status`] with status 404; see
/// [`ApiError::is_not_found`].
///
/// Methods return boxed futures for dyn compatibility. Implementations must
/// be safe to call concurrently for independent keys.
pub trait ManagementApi: Send + Sync {
    fn get(&self, key: &ObjectKey) -> BoxFuture<'_, Result<serde_json::Value, ApiError>>;

    fn create(
        &self,
        key: &ObjectKey,
        body: &serde_json::Value,
    ) -> BoxFuture<'_, Result<Created, ApiError>>;

    /// Full replace of the object's mutable attributes.
    fn update(
        &self,
        key: &ObjectKey,
        body: &serde_json::Value,
    ) -> BoxFuture<'_, Result<(), ApiError>>;

    fn delete(&self, key: &ObjectKey) -> BoxFuture<'_, Result<(), ApiError>>;
}
