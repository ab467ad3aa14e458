use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{
    KindSpec, OnExisting, ResourceKind, copy_fields, map_attr, scoped_id, split_scoped_id,
    str_attr,
};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// A vhost policy. Pattern, priority, target and definition can all be
/// changed in place. Id: `name@vhost`.
pub struct Policy;

impl KindSpec for Policy {
    const KIND: ResourceKind = ResourceKind::Policy;
    const ON_EXISTING: OnExisting = OnExisting::Overwrite;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("name", AttrType::String).force_new(),
            Attribute::optional("vhost", AttrType::String)
                .default("/")
                .force_new(),
            Attribute::required("pattern", AttrType::String),
            Attribute::optional("priority", AttrType::Int).default(0),
            Attribute::optional("apply_to", AttrType::String).default("all"),
            Attribute::required("definition", AttrType::Map),
        ])
    }

    fn natural_id(attrs: &Attributes) -> Option<String> {
        Some(scoped_id(str_attr(attrs, "name")?, str_attr(attrs, "vhost")?))
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        let (name, vhost) = split_scoped_id(id, Self::KIND)?;
        Ok(ObjectKey::new(ObjectKind::Policy, [vhost, name]))
    }

    fn request_body(attrs: &Attributes) -> Value {
        json!({
            "pattern": str_attr(attrs, "pattern").unwrap_or_default(),
            "priority": attrs.get("priority").and_then(Value::as_i64).unwrap_or(0),
            "apply-to": str_attr(attrs, "apply_to").unwrap_or("all"),
            "definition": map_attr(attrs, "definition"),
        })
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let mut out = Attributes::new();
        if let Ok((name, vhost)) = split_scoped_id(id, Self::KIND) {
            out.insert("name".into(), json!(name));
            out.insert("vhost".into(), json!(vhost));
        }
        copy_fields(
            remote,
            &["name", "vhost", "pattern", "priority", "definition"],
            &mut out,
        );
        if let Some(apply_to) = remote.get("apply-to").filter(|v| !v.is_null()) {
            out.insert("apply_to".into(), apply_to.clone());
        }
        out
    }
}
