use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    membership::{MembershipKey, MembershipRecord},
    services::EgressServices,
    workload::{Workload, WorkloadRef},
};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a backing-store capability.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct StoreError {
    pub operation: &'static str,
    #[source]
    pub source: DynError,
}

impl StoreError {
    pub fn new(operation: &'static str, source: impl Into<DynError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// Read and status-write access to workload instances.
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// `Ok(None)` when the workload does not exist.
    async fn get(&self, id: &WorkloadRef) -> Result<Option<Workload>, StoreError>;

    /// Persists `workload.conditions` through a status-only update guarded by
    /// `workload.revision`.
    async fn update_conditions(&self, workload: &Workload) -> Result<(), StoreError>;
}

/// Resolves the egress services configured for a group.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    async fn resolve(&self, group: &str, namespace: &str) -> Result<EgressServices, StoreError>;
}

/// Read access to routing-membership records.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// `Ok(None)` when the routing layer has not published a record yet.
    async fn get(
        &self,
        namespace: &str,
        key: &MembershipKey,
    ) -> Result<Option<MembershipRecord>, StoreError>;
}

/// Where a sibling's health endpoint lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthTarget {
    pub name: String,
    pub group: String,
    pub namespace: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeVerdict {
    Healthy,
    Unhealthy { reason: String },
}

impl ProbeVerdict {
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Probes a group member's health endpoint. Transport failures are verdicts.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, target: &HealthTarget) -> ProbeVerdict;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
