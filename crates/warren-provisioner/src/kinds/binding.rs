use serde_json::{Value, json};
use warren_client::api::encode_segment;
use warren_client::{Created, ObjectKey, ObjectKind};

use crate::error::ProvisionerError;
use crate::kinds::{
    KindSpec, OnExisting, ResourceKind, copy_fields, decode_component, map_attr, str_attr,
};
use crate::schema::{AttrType, Attribute, Attributes, Schema};

/// A binding from a source exchange to a queue or exchange.
///
/// Bindings have no natural key: the broker assigns a `properties_key` when
/// the binding is created. The id is
/// `vhost/source/destination/destination_type/properties_key` with every
/// component percent-encoded.
pub struct Binding;

struct BindingId {
    vhost: String,
    source: String,
    destination: String,
    destination_type: String,
    properties_key: String,
}

impl BindingId {
    fn parse(id: &str) -> Result<Self, ProvisionerError> {
        let invalid = || {
            ProvisionerError::Validation(format!(
                "invalid binding id '{id}', expected vhost/source/destination/destination_type/properties_key"
            ))
        };

        let parts = id
            .split('/')
            .map(|p| decode_component(p).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()?;
        let [vhost, source, destination, destination_type, properties_key] =
            <[String; 5]>::try_from(parts).map_err(|_| invalid())?;

        Ok(Self {
            vhost,
            source,
            destination,
            destination_type,
            properties_key,
        })
    }

    fn render(&self) -> String {
        [
            &self.vhost,
            &self.source,
            &self.destination,
            &self.destination_type,
            &self.properties_key,
        ]
        .map(|part| encode_segment(part))
        .join("/")
    }
}

/// Path segment the management API uses for a destination type.
fn destination_segment(destination_type: &str) -> Result<&'static str, ProvisionerError> {
    match destination_type {
        "queue" => Ok("q"),
        "exchange" => Ok("e"),
        other => Err(ProvisionerError::Validation(format!(
            "destination_type must be 'queue' or 'exchange', got '{other}'"
        ))),
    }
}

fn collection_key(
    vhost: &str,
    source: &str,
    destination_type: &str,
    destination: &str,
) -> Result<ObjectKey, ProvisionerError> {
    Ok(ObjectKey::new(
        ObjectKind::Binding,
        [
            vhost,
            "e",
            source,
            destination_segment(destination_type)?,
            destination,
        ],
    ))
}

impl KindSpec for Binding {
    const KIND: ResourceKind = ResourceKind::Binding;
    // POST always adds; an identical binding is a no-op on the broker side.
    const ON_EXISTING: OnExisting = OnExisting::Overwrite;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::required("source", AttrType::String).force_new(),
            Attribute::optional("vhost", AttrType::String)
                .default("/")
                .force_new(),
            Attribute::required("destination", AttrType::String).force_new(),
            Attribute::required("destination_type", AttrType::String).force_new(),
            Attribute::optional("routing_key", AttrType::String)
                .default("")
                .force_new(),
            Attribute::optional("arguments", AttrType::Map).force_new(),
            Attribute::computed("properties_key", AttrType::String),
        ])
    }

    fn natural_id(_attrs: &Attributes) -> Option<String> {
        None
    }

    fn key_for_id(id: &str) -> Result<ObjectKey, ProvisionerError> {
        let parsed = BindingId::parse(id)?;
        Ok(collection_key(
            &parsed.vhost,
            &parsed.source,
            &parsed.destination_type,
            &parsed.destination,
        )?
        .child(parsed.properties_key))
    }

    fn create_key(attrs: &Attributes) -> Result<ObjectKey, ProvisionerError> {
        collection_key(
            str_attr(attrs, "vhost").unwrap_or("/"),
            str_attr(attrs, "source").unwrap_or_default(),
            str_attr(attrs, "destination_type").unwrap_or_default(),
            str_attr(attrs, "destination").unwrap_or_default(),
        )
    }

    fn id_after_create(attrs: &Attributes, created: &Created) -> Result<String, ProvisionerError> {
        let routing_key = str_attr(attrs, "routing_key").unwrap_or_default();

        // The Location header ends with the new binding's properties key.
        let properties_key = match created
            .location
            .as_deref()
            .and_then(|loc| loc.rsplit('/').next())
            .filter(|last| !last.is_empty())
        {
            Some(last) => decode_component(last).ok_or_else(|| {
                ProvisionerError::Validation(format!("undecodable binding location '{last}'"))
            })?,
            None if routing_key.is_empty() => "~".to_string(),
            None => routing_key.to_string(),
        };

        Ok(BindingId {
            vhost: str_attr(attrs, "vhost").unwrap_or("/").to_string(),
            source: str_attr(attrs, "source").unwrap_or_default().to_string(),
            destination: str_attr(attrs, "destination").unwrap_or_default().to_string(),
            destination_type: str_attr(attrs, "destination_type")
                .unwrap_or_default()
                .to_string(),
            properties_key,
        }
        .render())
    }

    fn request_body(attrs: &Attributes) -> Value {
        json!({
            "routing_key": str_attr(attrs, "routing_key").unwrap_or_default(),
            "arguments": map_attr(attrs, "arguments"),
        })
    }

    fn observe(id: &str, remote: &Value) -> Attributes {
        let mut out = Attributes::new();
        if let Ok(parsed) = BindingId::parse(id) {
            out.insert("vhost".into(), json!(parsed.vhost));
            out.insert("source".into(), json!(parsed.source));
            out.insert("destination".into(), json!(parsed.destination));
            out.insert("destination_type".into(), json!(parsed.destination_type));
            out.insert("properties_key".into(), json!(parsed.properties_key));
        }
        copy_fields(
            remote,
            &[
                "vhost",
                "source",
                "destination",
                "destination_type",
                "routing_key",
                "arguments",
                "properties_key",
            ],
            &mut out,
        );
        out
    }
}
