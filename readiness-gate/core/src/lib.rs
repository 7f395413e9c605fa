pub mod conditions;
pub mod constants;
pub mod errors;
pub mod membership;
pub mod predecessor;
pub mod reconciler;
pub mod services;
pub mod store;
pub mod workload;

#[cfg(test)]
pub(crate) mod testing;

pub use conditions::ConditionWriter;
pub use errors::ReconcileError;
pub use membership::{Endpoint, MembershipKey, MembershipRecord};
pub use predecessor::{DependencyVerdict, PredecessorProber};
pub use reconciler::{EgressReadinessReconciler, ReconcileOutcome};
pub use services::{EgressServiceConfig, EgressServices, PortMap, ServiceRef, TailnetTarget};
pub use store::{
    Clock, ConfigResolver, DynError, HealthProbe, HealthTarget, MembershipStore, ProbeVerdict,
    StoreError, SystemClock, WorkloadStore,
};
pub use workload::{Condition, ConditionStatus, Position, Workload, WorkloadRef};
