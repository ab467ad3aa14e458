use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::addr::ResourceAddr;
use crate::error::ProvisionerError;
use crate::kinds::ResourceKind;
use crate::registry::Registry;
use crate::schema::Attributes;

/// One declared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    /// Local name, unique per kind within a manifest.
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceSpec {
    pub fn new(kind: ResourceKind, name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            kind,
            name: name.into(),
            attributes,
        }
    }

    pub fn addr(&self) -> ResourceAddr {
        ResourceAddr::new(self.kind, self.name.clone())
    }
}

/// The desired state: every declared resource, in dependency order.
///
/// Creates run in this order and deletes in reverse, so a vhost must come
/// before the queues and permissions that live in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    pub fn new(resources: Vec<ResourceSpec>) -> Self {
        Self { resources }
    }

    pub fn from_json(json: &str) -> Result<Self, ProvisionerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ProvisionerError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn get(&self, addr: &ResourceAddr) -> Option<&ResourceSpec> {
        self.resources
            .iter()
            .find(|r| r.kind == addr.kind && r.name == addr.name)
    }

    /// Unique addresses, and every declaration valid for its kind's schema.
    pub fn validate(&self, registry: &Registry) -> Result<(), ProvisionerError> {
        let mut seen = HashSet::new();
        for spec in &self.resources {
            let addr = spec.addr();
            if !seen.insert(addr.clone()) {
                return Err(ProvisionerError::Validation(format!(
                    "duplicate resource address {addr}"
                )));
            }
            registry
                .handler(spec.kind)?
                .schema()
                .validate(&spec.attributes)
                .map_err(|e| e.with_resource(&addr.to_string()))?;
        }
        Ok(())
    }
}
