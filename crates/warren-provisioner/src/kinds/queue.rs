use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{
    KindSpec, OnExisting, ResourceKind, bool_attr, copy_fields, map_attr, scoped_id,
    split_scoped_id, str_attr,
};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// A queue. Like exchanges, queues are immutable once declared. Id: `name@vhost`.
pub struct Queue;

impl KindSpec for Queue {
    const KIND: ResourceKind = ResourceKind::Queue;
    const ON_EXISTING: OnExisting = OnExisting::Reject;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("name", AttrType::String).force_new(),
            Attribute::optional("vhost", AttrType::String)
                .default("/")
                .force_new(),
            Attribute::optional("durable", AttrType::Bool)
                .default(false)
                .force_new(),
            Attribute::optional("auto_delete", AttrType::Bool)
                .default(false)
                .force_new(),
            Attribute::optional("arguments", AttrType::Map).force_new(),
        ])
    }

    fn natural_id(attrs: &Attributes) -> Option<String> {
        Some(scoped_id(str_attr(attrs, "name")?, str_attr(attrs, "vhost")?))
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        let (name, vhost) = split_scoped_id(id, Self::KIND)?;
        Ok(ObjectKey::new(ObjectKind::Queue, [vhost, name]))
    }

    fn request_body(attrs: &Attributes) -> Value {
        json!({
            "durable": bool_attr(attrs, "durable"),
            "auto_delete": bool_attr(attrs, "auto_delete"),
            "arguments": map_attr(attrs, "arguments"),
        })
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let mut out = Attributes::new();
        if let Ok((name, vhost)) = split_scoped_id(id, Self::KIND) {
            out.insert("name".into(), json!(name));
            out.insert("vhost".into(), json!(vhost));
        }
        // Runtime fields (messages, consumers, state) are not declarable.
        copy_fields(
            remote,
            &["name", "vhost", "durable", "auto_delete", "arguments"],
            &mut out,
        );
        out
    }
}
