use serde::{Deserialize, Serialize};

use crate::addr::ResourceAddr;
use crate::schema::{Attributes, FieldDrift, Schema};
use crate::state::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete the current object, then create from the new declaration.
    Replace,
    Delete,
}

/// Why an entry got its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    InSync,
    /// Declared, never provisioned.
    FirstProvision,
    /// In state, but the remote object is gone.
    DeletedExternally,
    /// Mutable attributes differ.
    Drift,
    /// A force-new attribute differs.
    ForceNewChanged,
    /// In state, no longer declared.
    Orphaned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub addr: ResourceAddr,
    pub action: Action,
    pub cause: Cause,
    /// Remote id currently tracked in state, if any.
    pub id: Option<String>,
    pub drift: Vec<FieldDrift>,
}

/// One entry per declared resource (manifest order), then orphans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|e| e.action != Action::NoOp)
    }

    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    pub fn entry(&self, addr: &ResourceAddr) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| &e.addr == addr)
    }
}

/// Decide what a declared resource needs.
///
/// `stored` is what state knows about it; `observed` is a fresh read of the
/// remote object (`None` = gone or never read because nothing is stored).
pub fn decide(
    schema: &Schema,
    declared: &Attributes,
    stored: Option<&ResourceState>,
    observed: Option<&Attributes>,
) -> (Action, Cause, Vec<FieldDrift>) {
    let Some(stored) = stored else {
        return (Action::Create, Cause::FirstProvision, vec![]);
    };
    let Some(observed) = observed else {
        return (Action::Create, Cause::DeletedExternally, vec![]);
    };

    // Write-only fields never come back from the broker; compare them
    // against what was last applied. Nothing applied (an import) is drift.
    let mut observed = observed.clone();
    schema.carry_write_only(&stored.declared, &mut observed);

    let drift = schema.diff(&schema.desired(declared), &observed);
    if drift.is_empty() {
        (Action::NoOp, Cause::InSync, drift)
    } else if drift.iter().any(|d| d.force_new) {
        (Action::Replace, Cause::ForceNewChanged, drift)
    } else {
        (Action::Update, Cause::Drift, drift)
    }
}
