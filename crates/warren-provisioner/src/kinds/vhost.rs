use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{KindSpec, OnExisting, ResourceKind, str_attr};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// A virtual host. Identified by its name; nothing about it is mutable.
pub struct Vhost;

impl KindSpec for Vhost {
    const KIND: ResourceKind = ResourceKind::Vhost;
    const ON_EXISTING: OnExisting = OnExisting::Reject;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("name", AttrType::String).force_new(),
        ])
    }

    fn natural_id(attrs: &Attributes) -> Option<String> {
        str_attr(attrs, "name").map(String::from)
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        Ok(ObjectKey::new(ObjectKind::Vhost, [id]))
    }

    fn request_body(_attrs: &Attributes) -> Value {
        json!({})
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let name = remote.get("name").and_then(Value::as_str).unwrap_or(id);
        let mut out = Attributes::new();
        out.insert("name".into(), json!(name));
        out
    }
}
