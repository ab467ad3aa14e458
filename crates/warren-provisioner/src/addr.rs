use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kinds::ResourceKind;

/// Composite key for addressing a declared resource in state.
///
/// `name` is the declaration's local name, not the remote identifier: two
/// users declared as `user.app` and `user.ops` have distinct addresses even
/// if one is later renamed remotely.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ResourceAddr {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceAddr {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}
