use serde_json::{Value, json};
use warren_client::{ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{
    KindSpec, OnExisting, ResourceKind, copy_fields, scoped_id, split_scoped_id, str_attr,
};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// A user's configure/write/read permissions in one vhost. Id: `user@vhost`.
pub struct Permissions;

impl KindSpec for Permissions {
    const KIND: ResourceKind = ResourceKind::Permissions;
    const ON_EXISTING: OnExisting = OnExisting::Overwrite;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("user", AttrType::String).force_new(),
            Attribute::optional("vhost", AttrType::String)
                .default("/")
                .force_new(),
            Attribute::required("configure", AttrType::String),
            Attribute::required("write", AttrType::String),
            Attribute::required("read", AttrType::String),
        ])
    }

    fn natural_id(attrs: &Attributes) -> Option<String> {
        Some(scoped_id(str_attr(attrs, "user")?, str_attr(attrs, "vhost")?))
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        let (user, vhost) = split_scoped_id(id, Self::KIND)?;
        Ok(ObjectKey::new(ObjectKind::Permissions, [vhost, user]))
    }

    fn request_body(attrs: &Attributes) -> Value {
        json!({
            "configure": str_attr(attrs, "configure").unwrap_or_default(),
            "write": str_attr(attrs, "write").unwrap_or_default(),
            "read": str_attr(attrs, "read").unwrap_or_default(),
        })
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let mut out = Attributes::new();
        if let Ok((user, vhost)) = split_scoped_id(id, Self::KIND) {
            out.insert("user".into(), json!(user));
            out.insert("vhost".into(), json!(vhost));
        }
        copy_fields(
            remote,
            &["user", "vhost", "configure", "write", "read"],
            &mut out,
        );
        out
    }
}
