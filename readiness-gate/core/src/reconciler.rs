use std::sync::Arc;

use tracing::{Instrument as _, debug, debug_span, error, info};

use crate::{
    conditions::ConditionWriter,
    errors::ReconcileError,
    membership::MembershipKey,
    predecessor::{DependencyVerdict, PredecessorProber},
    services::ServiceRef,
    store::{Clock, ConfigResolver, HealthProbe, MembershipStore, WorkloadStore},
    workload::{Workload, WorkloadRef},
};

/// Successful reconcile results. Hard failures are `Err(ReconcileError)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing more to do until the next triggering event.
    Done,
    /// Check again soon without waiting for an event.
    Requeue,
}

/// Decides whether one group member may be marked ready for egress traffic.
///
/// Every invocation re-reads all state, so redelivered or reordered triggers
/// for the same workload are harmless. The only mutation is the single
/// condition append performed once every gate has passed.
pub struct EgressReadinessReconciler {
    workloads: Arc<dyn WorkloadStore>,
    configs: Arc<dyn ConfigResolver>,
    memberships: Arc<dyn MembershipStore>,
    prober: PredecessorProber,
    writer: ConditionWriter,
}

impl EgressReadinessReconciler {
    #[must_use]
    pub fn new(
        workloads: Arc<dyn WorkloadStore>,
        configs: Arc<dyn ConfigResolver>,
        memberships: Arc<dyn MembershipStore>,
        probe: Arc<dyn HealthProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            prober: PredecessorProber::new(Arc::clone(&workloads), probe),
            writer: ConditionWriter::new(Arc::clone(&workloads), clock),
            workloads,
            configs,
            memberships,
        }
    }

    pub async fn reconcile(&self, id: &WorkloadRef) -> Result<ReconcileOutcome, ReconcileError> {
        let span = debug_span!("egress_readiness", workload = %id);
        async {
            debug!("starting reconcile");
            let outcome = self.run(id).await;
            debug!("reconcile finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, id: &WorkloadRef) -> Result<ReconcileOutcome, ReconcileError> {
        let workload = self
            .workloads
            .get(id)
            .await
            .map_err(|source| ReconcileError::WorkloadFetch {
                workload: id.clone(),
                source,
            })?;
        let Some(workload) = workload else {
            debug!("workload not found");
            return Ok(ReconcileOutcome::Done);
        };
        if workload.deleting {
            debug!("workload is being deleted");
            return Ok(ReconcileOutcome::Done);
        }
        let Some(group) = workload.group.clone() else {
            debug!("workload carries no group label");
            return Ok(ReconcileOutcome::Done);
        };

        let services = self
            .configs
            .resolve(&group, &id.namespace)
            .await
            .map_err(|source| ReconcileError::Config {
                group: group.clone(),
                source,
            })?;
        for key in services.keys() {
            if !self.routed(&workload, &group, key).await? {
                return Ok(ReconcileOutcome::Done);
            }
        }

        if workload.has_egress_condition() {
            debug!("condition exists");
            return Ok(ReconcileOutcome::Done);
        }

        if self.prober.check(&workload, &group).await? == DependencyVerdict::NotYetSatisfied {
            info!("workload not yet ready");
            return Ok(ReconcileOutcome::Requeue);
        }

        info!(%group, "workload ready");
        self.writer.mark_ready(workload).await?;
        Ok(ReconcileOutcome::Done)
    }

    /// Whether the routing layer already sends `key`'s traffic to the
    /// workload. Malformed keys cannot be fixed by a reconcile and are skipped.
    async fn routed(
        &self,
        workload: &Workload,
        group: &str,
        key: &str,
    ) -> Result<bool, ReconcileError> {
        let service = match ServiceRef::decode(key) {
            Ok(service) => service,
            Err(err) => {
                error!(%err, "[unexpected] unable to determine service namespace and name");
                return Ok(true);
            }
        };
        let membership = MembershipKey::new(group, service);
        let record = self
            .memberships
            .get(&workload.id.namespace, &membership)
            .await
            .map_err(|source| ReconcileError::MembershipFetch {
                service: key.to_owned(),
                source,
            })?;
        let Some(record) = record else {
            info!(service = key, "routing membership not found, waiting");
            return Ok(false);
        };
        if !record.routes_to(&workload.addresses) {
            info!(service = key, record = %record.name, "routing not yet set up");
            return Ok(false);
        }
        Ok(true)
    }
}
