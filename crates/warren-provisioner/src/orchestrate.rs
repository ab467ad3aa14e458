use std::collections::HashSet;

use crate::addr::ResourceAddr;
use crate::error::ProvisionerError;
use crate::manifest::{Manifest, ResourceSpec};
use crate::persistence::StatePersistence;
use crate::plan::{self, Action, Cause, Plan, PlanEntry};
use crate::registry::Registry;
use crate::state::{ProvisionerState, ResourceState, ResourceStatus};

/// Read every declared resource and produce an annotated plan.
///
/// One entry per manifest resource in manifest order, plus a `Delete` entry
/// for every resource in state that is no longer declared. Pure with
/// respect to state and remote objects: only reads are issued.
pub async fn plan(
    registry: &Registry,
    manifest: &Manifest,
    state: &ProvisionerState,
) -> Result<Plan, ProvisionerError> {
    let mut entries = Vec::with_capacity(manifest.resources.len());

    for spec in &manifest.resources {
        let addr = spec.addr();
        let handler = registry.handler(spec.kind)?;
        let stored = state.get(&addr);

        let observed = match stored {
            Some(rs) => handler
                .read(&rs.id)
                .await
                .map_err(|e| e.with_resource(&addr.to_string()))?,
            None => None,
        };

        let (action, cause, drift) =
            plan::decide(handler.schema(), &spec.attributes, stored, observed.as_ref());

        entries.push(PlanEntry {
            addr,
            action,
            cause,
            id: stored.map(|rs| rs.id.clone()),
            drift,
        });
    }

    // Orphans in kind order, so the reversed delete pass removes bindings
    // and queues before the vhosts that hold them.
    let declared: HashSet<ResourceAddr> = manifest.resources.iter().map(|r| r.addr()).collect();
    let mut orphans: Vec<&ResourceState> = state
        .resources
        .values()
        .filter(|rs| !declared.contains(&rs.addr))
        .collect();
    orphans.sort_by(|a, b| a.addr.cmp(&b.addr));

    entries.extend(orphans.into_iter().map(|rs| PlanEntry {
        addr: rs.addr.clone(),
        action: Action::Delete,
        cause: Cause::Orphaned,
        id: Some(rs.id.clone()),
        drift: vec![],
    }));

    Ok(Plan { entries })
}

/// Execute all actionable entries in the plan.
///
/// Creates and replaces in manifest order, then updates in manifest order,
/// then deletes in reverse order (dependents first). State is flushed after
/// every remote mutation; the first error stops execution and is returned.
pub async fn execute(
    plan: &Plan,
    manifest: &Manifest,
    registry: &Registry,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<(), ProvisionerError> {
    for entry in plan
        .entries
        .iter()
        .filter(|e| matches!(e.action, Action::Create | Action::Replace))
    {
        let spec = declared_spec(manifest, &entry.addr)?;

        if entry.action == Action::Replace {
            destroy_tracked(registry, state, persistence, &entry.addr).await?;
        } else if entry.cause == Cause::DeletedExternally && state.remove(&entry.addr).is_some() {
            tracing::warn!(addr = %entry.addr, "remote object gone, pruning stale state");
            persistence.flush(state).await?;
        }

        create(registry, state, persistence, spec).await?;
    }

    for entry in plan.entries.iter().filter(|e| e.action == Action::Update) {
        let spec = declared_spec(manifest, &entry.addr)?;
        let handler = registry.handler(spec.kind)?;
        let stored = state.get_mut(&entry.addr).ok_or_else(|| {
            ProvisionerError::State(format!("{} planned for update but not in state", entry.addr))
        })?;

        tracing::info!(addr = %entry.addr, id = %stored.id, "updating resource");
        let observed = handler
            .update(&stored.id, &stored.declared, &spec.attributes)
            .await
            .map_err(|e| e.with_resource(&entry.addr.to_string()))?;

        stored.declared = handler.schema().apply_defaults(&spec.attributes);
        stored.observed = observed;
        stored.status = ResourceStatus::Updated;
        persistence.flush(state).await?;
    }

    for entry in plan
        .entries
        .iter()
        .filter(|e| e.action == Action::Delete)
        .rev()
    {
        destroy_tracked(registry, state, persistence, &entry.addr).await?;
    }

    Ok(())
}

/// Plan against the manifest and execute it if anything changed.
pub async fn apply(
    registry: &Registry,
    manifest: &Manifest,
    persistence: &StatePersistence,
) -> Result<Plan, ProvisionerError> {
    manifest.validate(registry)?;
    let mut state = persistence.load().await?;
    let plan = plan(registry, manifest, &state).await?;

    if plan.has_changes() {
        tracing::info!(
            creates = plan.count(Action::Create),
            updates = plan.count(Action::Update),
            replaces = plan.count(Action::Replace),
            deletes = plan.count(Action::Delete),
            "executing plan"
        );
        execute(&plan, manifest, registry, &mut state, persistence).await?;
    } else {
        tracing::info!("all resources in sync, no changes needed");
    }

    Ok(plan)
}

/// Destroy every resource in state.
///
/// Declared resources go in reverse manifest order, anything else tracked
/// in state after them (reverse kind order).
pub async fn destroy_all(
    registry: &Registry,
    manifest: &Manifest,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<(), ProvisionerError> {
    for spec in manifest.resources.iter().rev() {
        destroy_tracked(registry, state, persistence, &spec.addr()).await?;
    }

    let mut leftovers: Vec<ResourceAddr> =
        state.resources.values().map(|rs| rs.addr.clone()).collect();
    leftovers.sort();
    for addr in leftovers.into_iter().rev() {
        destroy_tracked(registry, state, persistence, &addr).await?;
    }

    persistence.flush(state).await
}

/// Adopt an existing remote object into state under `addr`.
///
/// The observed attributes become the recorded declaration, so the next
/// plan compares the manifest against what was actually found.
pub async fn import(
    registry: &Registry,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
    addr: ResourceAddr,
    id: &str,
) -> Result<(), ProvisionerError> {
    if let Some(existing) = state.get(&addr) {
        return Err(ProvisionerError::State(format!(
            "{addr} is already managed (id '{}')",
            existing.id
        )));
    }

    let handler = registry.handler(addr.kind)?;
    let observed = handler
        .read(id)
        .await?
        .ok_or_else(|| ProvisionerError::NotFound {
            kind: addr.kind.to_string(),
            id: id.to_string(),
        })?;

    tracing::info!(addr = %addr, id = %id, "importing resource");
    state.insert(ResourceState {
        addr,
        id: id.to_string(),
        status: ResourceStatus::Imported,
        declared: handler.schema().declarable(&observed),
        observed,
    });
    persistence.flush(state).await
}

fn declared_spec<'a>(
    manifest: &'a Manifest,
    addr: &ResourceAddr,
) -> Result<&'a ResourceSpec, ProvisionerError> {
    manifest.get(addr).ok_or_else(|| {
        ProvisionerError::State(format!("{addr} is planned but not declared in the manifest"))
    })
}

async fn create(
    registry: &Registry,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
    spec: &ResourceSpec,
) -> Result<(), ProvisionerError> {
    let addr = spec.addr();
    let handler = registry.handler(spec.kind)?;

    tracing::info!(addr = %addr, "creating resource");
    let result = handler
        .create(&spec.attributes)
        .await
        .map_err(|e| e.with_resource(&addr.to_string()))?;

    state.insert(ResourceState {
        addr,
        id: result.id,
        status: ResourceStatus::Created,
        declared: handler.schema().apply_defaults(&spec.attributes),
        observed: result.observed,
    });
    persistence.flush(state).await
}

/// Delete the remote object tracked at `addr` and drop it from state.
/// No-op when `addr` isn't tracked.
async fn destroy_tracked(
    registry: &Registry,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
    addr: &ResourceAddr,
) -> Result<(), ProvisionerError> {
    let Some(rs) = state.get(addr) else {
        return Ok(());
    };

    tracing::info!(addr = %addr, id = %rs.id, "destroying resource");
    registry
        .handler(addr.kind)?
        .delete(&rs.id)
        .await
        .map_err(|e| e.with_resource(&addr.to_string()))?;

    state.remove(addr);
    persistence.flush(state).await
}
