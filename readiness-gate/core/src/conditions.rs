use std::sync::Arc;

use crate::{
    errors::ReconcileError,
    store::{Clock, WorkloadStore},
    workload::{Condition, Workload},
};

/// Records the positive egress readiness condition on a workload.
pub struct ConditionWriter {
    workloads: Arc<dyn WorkloadStore>,
    clock: Arc<dyn Clock>,
}

impl ConditionWriter {
    #[must_use]
    pub fn new(workloads: Arc<dyn WorkloadStore>, clock: Arc<dyn Clock>) -> Self {
        Self { workloads, clock }
    }

    /// Appends the condition and issues a status-only update. A stale
    /// revision makes the update fail; the caller retries from a fresh read.
    pub async fn mark_ready(&self, mut workload: Workload) -> Result<(), ReconcileError> {
        workload
            .conditions
            .push(Condition::egress_ready(self.clock.now()));
        self.workloads
            .update_conditions(&workload)
            .await
            .map_err(|source| ReconcileError::ConditionWrite {
                workload: workload.id.clone(),
                source,
            })
    }
}
