use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::addr::ResourceAddr;
use crate::schema::Attributes;

/// Provisioner state, persisted as JSON between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionerState {
    /// Schema version of this file. Missing = fresh state.
    #[serde(default)]
    pub version: u32,

    /// Keyed by the address's display form (`kind.name`).
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

/// State for a single managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub addr: ResourceAddr,
    /// Remote identifier, fixed at creation.
    pub id: String,
    pub status: ResourceStatus,
    /// Last applied declaration, defaults filled in.
    pub declared: Attributes,
    /// Last observed remote state, normalized.
    pub observed: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    Updated,
    Imported,
    Drifted,
}

impl ProvisionerState {
    pub const VERSION: u32 = 1;

    pub fn get(&self, addr: &ResourceAddr) -> Option<&ResourceState> {
        self.resources.get(&addr.to_string())
    }

    pub fn get_mut(&mut self, addr: &ResourceAddr) -> Option<&mut ResourceState> {
        self.resources.get_mut(&addr.to_string())
    }

    pub fn insert(&mut self, resource: ResourceState) {
        self.resources.insert(resource.addr.to_string(), resource);
    }

    pub fn remove(&mut self, addr: &ResourceAddr) -> Option<ResourceState> {
        self.resources.remove(&addr.to_string())
    }

    pub fn contains(&self, addr: &ResourceAddr) -> bool {
        self.resources.contains_key(&addr.to_string())
    }
}
