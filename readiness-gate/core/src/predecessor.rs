use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    errors::ReconcileError,
    store::{HealthProbe, HealthTarget, ProbeVerdict, WorkloadStore},
    workload::{Workload, WorkloadRef},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependencyVerdict {
    Satisfied,
    NotYetSatisfied,
}

/// Enforces the positional startup dependency of a group member.
///
/// The member at position `i` waits for the member at position `i + 1`, the
/// next-higher sibling, to report healthy. A member with no higher sibling
/// has no dependency.
pub struct PredecessorProber {
    workloads: Arc<dyn WorkloadStore>,
    probe: Arc<dyn HealthProbe>,
}

impl PredecessorProber {
    #[must_use]
    pub fn new(workloads: Arc<dyn WorkloadStore>, probe: Arc<dyn HealthProbe>) -> Self {
        Self { workloads, probe }
    }

    pub async fn check(
        &self,
        workload: &Workload,
        group: &str,
    ) -> Result<DependencyVerdict, ReconcileError> {
        let position = workload
            .position
            .ok_or_else(|| ReconcileError::MalformedPosition {
                workload: workload.id.clone(),
                group: group.to_owned(),
            })?;
        let Some(next) = position.next() else {
            return Ok(DependencyVerdict::Satisfied);
        };

        let sibling = WorkloadRef::new(workload.id.namespace.clone(), next.member_name(group));
        let found = self
            .workloads
            .get(&sibling)
            .await
            .map_err(|source| ReconcileError::SiblingFetch {
                sibling: sibling.clone(),
                source,
            })?;
        if found.is_none() {
            debug!(sibling = %sibling, "no higher-positioned sibling, dependency satisfied");
            return Ok(DependencyVerdict::Satisfied);
        }

        let target = HealthTarget {
            name: sibling.name.clone(),
            group: group.to_owned(),
            namespace: sibling.namespace.clone(),
        };
        match self.probe.probe(&target).await {
            ProbeVerdict::Healthy => Ok(DependencyVerdict::Satisfied),
            ProbeVerdict::Unhealthy { reason } => {
                info!(sibling = %sibling, %reason, "sibling not yet healthy");
                Ok(DependencyVerdict::NotYetSatisfied)
            }
        }
    }
}
