use std::{sync::Arc, time::Duration};

use egress_readiness_core::{
    EgressReadinessReconciler, ReconcileError, ReconcileOutcome, SystemClock, WorkloadRef,
};
use egress_readiness_k8s::{
    ConfigMapResolver, EndpointSliceStore, HttpHealthProbe, PodStore,
    labels::{
        GROUP_LABEL, LABEL_PROXY_GROUP, egress_membership_selector, group_member_selector,
    },
};
use futures::StreamExt as _;
use k8s_openapi::api::{core::v1::Pod, discovery::v1::EndpointSlice};
use kube::{
    Api, Client, ResourceExt as _,
    runtime::{
        Controller,
        controller::Action,
        reflector::{ObjectRef, Store},
        watcher,
    },
};
use tracing::{debug, error, info, warn};

use crate::config::OperatorConfig;

/// Shared state handed to every reconcile.
pub struct Context {
    reconciler: EgressReadinessReconciler,
    requeue_interval: Duration,
    error_backoff: Duration,
}

impl Context {
    #[must_use]
    pub const fn new(
        reconciler: EgressReadinessReconciler,
        requeue_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            reconciler,
            requeue_interval,
            error_backoff,
        }
    }
}

/// Wires the Kubernetes-backed capabilities into the reconciler.
pub fn build_context(client: &Client, config: &OperatorConfig) -> anyhow::Result<Context> {
    let probe = HttpHealthProbe::new(config.probe_settings())?;
    let reconciler = EgressReadinessReconciler::new(
        Arc::new(PodStore::new(client.clone())),
        Arc::new(ConfigMapResolver::new(client.clone())),
        Arc::new(EndpointSliceStore::new(client.clone())),
        Arc::new(probe),
        Arc::new(SystemClock),
    );
    Ok(Context::new(
        reconciler,
        config.requeue_interval(),
        config.error_backoff(),
    ))
}

/// Runs the controller until a shutdown signal arrives.
///
/// Group member pods trigger reconciles directly; egress EndpointSlice changes
/// trigger every member of the slice's group.
pub async fn run(client: Client, config: &OperatorConfig) -> anyhow::Result<()> {
    let context = Arc::new(build_context(&client, config)?);
    let pods: Api<Pod> = Api::namespaced(client.clone(), &config.namespace);
    let slices: Api<EndpointSlice> = Api::namespaced(client, &config.namespace);

    let controller = Controller::new(
        pods,
        watcher::Config::default().labels(&group_member_selector()),
    );
    let members = controller.store();
    info!(namespace = %config.namespace, "starting egress readiness controller");

    controller
        .watches(
            slices,
            watcher::Config::default().labels(&egress_membership_selector()),
            move |slice| group_members(&members, &slice),
        )
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((pod, _)) => debug!(pod = %pod, "reconciled"),
                Err(err) => warn!(error = %err, "reconcile failed"),
            }
        })
        .await;

    info!("egress readiness controller stopped");
    Ok(())
}

async fn reconcile(pod: Arc<Pod>, context: Arc<Context>) -> Result<Action, ReconcileError> {
    let (Some(namespace), Some(name)) = (pod.namespace(), pod.metadata.name.clone()) else {
        return Ok(Action::await_change());
    };
    let outcome = context
        .reconciler
        .reconcile(&WorkloadRef::new(namespace, name))
        .await?;
    Ok(action_for(outcome, context.requeue_interval))
}

fn error_policy(pod: Arc<Pod>, err: &ReconcileError, context: Arc<Context>) -> Action {
    error!(pod = %pod.name_any(), permanent = err.is_permanent(), error = %err, "reconcile error");
    error_action(err, context.error_backoff)
}

fn action_for(outcome: ReconcileOutcome, requeue_interval: Duration) -> Action {
    match outcome {
        ReconcileOutcome::Done => Action::await_change(),
        ReconcileOutcome::Requeue => Action::requeue(requeue_interval),
    }
}

/// Permanent errors wait for the pod to change; others back off and retry.
fn error_action(err: &ReconcileError, backoff: Duration) -> Action {
    if err.is_permanent() {
        Action::await_change()
    } else {
        Action::requeue(backoff)
    }
}

fn group_members(members: &Store<Pod>, slice: &EndpointSlice) -> Vec<ObjectRef<Pod>> {
    let Some(group) = slice.labels().get(LABEL_PROXY_GROUP) else {
        return Vec::new();
    };
    members
        .state()
        .into_iter()
        .filter(|pod| pod.labels().get(GROUP_LABEL) == Some(group))
        .map(|pod| ObjectRef::from_obj(pod.as_ref()))
        .collect()
}
