use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::addr::ResourceAddr;
use crate::error::ProvisionerError;
use crate::persistence::StatePersistence;
use crate::registry::Registry;
use crate::schema::FieldDrift;
use crate::state::{ProvisionerState, ResourceStatus};

/// Divergence found for one tracked resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub addr: ResourceAddr,
    pub id: String,
    /// The remote object no longer exists; its state entry was pruned.
    pub deleted: bool,
    /// Differences between the last applied declaration and remote state.
    pub drift: Vec<FieldDrift>,
}

/// Re-read every tracked resource and write observed state back.
///
/// Reads run concurrently; state is only touched once every read has
/// succeeded. Resources whose remote object is gone are pruned from state.
/// Returns a report for each resource that was deleted or drifted.
pub async fn refresh(
    registry: &Registry,
    state: &mut ProvisionerState,
    persistence: &StatePersistence,
) -> Result<Vec<DriftReport>, ProvisionerError> {
    let reads = join_all(state.resources.values().map(|rs| async move {
        let handler = registry.handler(rs.addr.kind)?;
        let observed = handler
            .read(&rs.id)
            .await
            .map_err(|e| e.with_resource(&rs.addr.to_string()))?;
        Ok::<_, ProvisionerError>((rs.addr.clone(), observed))
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?;

    let mut reports = Vec::new();

    for (addr, observed) in reads {
        let Some(mut observed) = observed else {
            if let Some(rs) = state.remove(&addr) {
                tracing::warn!(addr = %addr, id = %rs.id, "remote object gone, pruning stale state");
                reports.push(DriftReport {
                    addr,
                    id: rs.id,
                    deleted: true,
                    drift: vec![],
                });
            }
            continue;
        };

        let schema = registry.handler(addr.kind)?.schema();
        let Some(rs) = state.get_mut(&addr) else {
            continue;
        };

        schema.carry_write_only(&rs.declared, &mut observed);
        let drift = schema.diff(&schema.desired(&rs.declared), &observed);
        rs.observed = observed;

        if !drift.is_empty() {
            tracing::info!(addr = %addr, fields = drift.len(), "drift detected");
            rs.status = ResourceStatus::Drifted;
            reports.push(DriftReport {
                addr,
                id: rs.id.clone(),
                deleted: false,
                drift,
            });
        }
    }

    persistence.flush(state).await?;
    Ok(reports)
}
