use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{KindSpec, OnExisting, ResourceKind, str_attr};
use crate::schema::{AttrType, Attribute, Attributes, Schema, clean_tags};

/// A broker user.
///
/// The password is write-only: the management API only ever returns a hash,
/// so drift on it can't be detected, only re-applied.
pub struct User;

impl KindSpec for User {
    const KIND: ResourceKind = ResourceKind::User;
    // PUT on an existing user replaces its password and tags.
    const ON_EXISTING: OnExisting = OnExisting::Overwrite;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("name", AttrType::String).force_new(),
            Attribute::required("password", AttrType::String).sensitive(),
            Attribute::optional("tags", AttrType::TagSet),
        ])
    }

    fn natural_id(attrs: &Attributes) -> Option<String> {
        str_attr(attrs, "name").map(String::from)
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        Ok(ObjectKey::new(ObjectKind::User, [id]))
    }

    fn request_body(attrs: &Attributes) -> Value {
        let tags = attrs.get("tags").map(clean_tags).unwrap_or_default();
        json!({
            "password": str_attr(attrs, "password").unwrap_or_default(),
            // Comma-joined form is understood by every broker version.
            "tags": tags.join(","),
        })
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let name = remote.get("name").and_then(Value::as_str).unwrap_or(id);
        let tags = remote.get("tags").map(clean_tags).unwrap_or_default();

        let mut out = Attributes::new();
        out.insert("name".into(), json!(name));
        out.insert("tags".into(), json!(tags));
        out
    }
}
