use thiserror::Error;

use crate::{store::StoreError, workload::WorkloadRef};

#[derive(Debug, Error)]
/// Hard failures of a reconcile. Soft conditions never surface here.
pub enum ReconcileError {
    #[error("failed to get workload {workload}: {source}")]
    WorkloadFetch {
        workload: WorkloadRef,
        #[source]
        source: StoreError,
    },
    #[error("error retrieving egress services configuration for group {group}: {source}")]
    Config {
        group: String,
        #[source]
        source: StoreError,
    },
    #[error("error retrieving routing membership for {service}: {source}")]
    MembershipFetch {
        service: String,
        #[source]
        source: StoreError,
    },
    #[error("workload {workload} name has no numeric position within group {group}")]
    MalformedPosition { workload: WorkloadRef, group: String },
    #[error("failed to get sibling workload {sibling}: {source}")]
    SiblingFetch {
        sibling: WorkloadRef,
        #[source]
        source: StoreError,
    },
    #[error("error updating workload {workload} status: {source}")]
    ConditionWrite {
        workload: WorkloadRef,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    /// Errors that retrying cannot fix without the workload itself changing.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::MalformedPosition { .. })
    }
}
