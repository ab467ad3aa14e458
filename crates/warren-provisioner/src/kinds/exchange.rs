use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{
    KindSpec, OnExisting, ResourceKind, bool_attr, copy_fields, map_attr, scoped_id,
    split_scoped_id, str_attr,
};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// An exchange. The broker can't change an exchange's settings after
/// declaration, so every attribute is force-new. Id: `name@vhost`.
pub struct Exchange;

impl KindSpec for Exchange {
    const KIND: ResourceKind = ResourceKind::Exchange;
    const ON_EXISTING: OnExisting = OnExisting::Reject;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("name", AttrType::String).force_new(),
            Attribute::optional("vhost", AttrType::String)
                .default("/")
                .force_new(),
            Attribute::required("type", AttrType::String).force_new(),
            Attribute::optional("durable", AttrType::Bool)
                .default(false)
                .force_new(),
            Attribute::optional("auto_delete", AttrType::Bool)
                .default(false)
                .force_new(),
            Attribute::optional("internal", AttrType::Bool)
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
        Ok(ObjectKey::new(ObjectKind::Exchange, [vhost, name]))
    }

    fn request_body(attrs: &Attributes) -> Value {
        json!({
            "type": str_attr(attrs, "type").unwrap_or_default(),
            "durable": bool_attr(attrs, "durable"),
            "auto_delete": bool_attr(attrs, "auto_delete"),
            "internal": bool_attr(attrs, "internal"),
            "arguments": map_attr(attrs, "arguments"),
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
            &[
                "name",
                "vhost",
                "type",
                "durable",
                "auto_delete",
                "internal",
                "arguments",
            ],
            &mut out,
        );
        out
    }
}
