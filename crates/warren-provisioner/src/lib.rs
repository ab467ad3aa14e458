//! warren-provisioner
//!
//! Desired-state reconciliation for broker objects (vhosts, users,
//! permissions, exchanges, queues, bindings, policies) over the management
//! REST API.
//!
//! Public API:
//! - `Registry` — one four-operation handler per resource kind
//! - `plan()` — read remote state, decide create/update/replace/delete per resource
//! - `execute()` — run a plan; state is flushed after every remote mutation
//! - `apply()` — convenience: plan → execute
//! - `refresh()` — re-read tracked resources and report drift
//! - `destroy_all()` / `import()` — tear down, or adopt existing objects

pub mod addr;
pub mod drift;
pub mod error;
pub mod kinds;
pub mod manifest;
pub mod orchestrate;
pub mod persistence;
pub mod plan;
pub mod reconciler;
pub mod registry;
pub mod schema;
pub mod state;

pub use crate::addr::ResourceAddr;
pub use crate::drift::{DriftReport, refresh};
pub use crate::error::ProvisionerError;
pub use crate::kinds::{KindSpec, OnExisting, ResourceKind};
pub use crate::manifest::{Manifest, ResourceSpec};
pub use crate::orchestrate::{apply, destroy_all, execute, import, plan};
pub use crate::persistence::StatePersistence;
pub use crate::plan::{Action, Cause, Plan, PlanEntry};
pub use crate::reconciler::{Reconciler, ResourceHandler, ResourceResult};
pub use crate::registry::Registry;
pub use crate::schema::{AttrType, Attribute, Attributes, FieldDrift, Schema};
pub use crate::state::{ProvisionerState, ResourceState, ResourceStatus};
