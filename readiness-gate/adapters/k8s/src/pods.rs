use async_trait::async_trait;
use egress_readiness_core::{
    Condition, ConditionStatus, StoreError, Workload, WorkloadRef, WorkloadStore,
};
use k8s_openapi::{
    api::core::v1::{Pod, PodCondition},
    apimachinery::pkg::apis::meta::v1::Time,
};
use kube::{
    Api, Client,
    api::{Patch, PatchParams},
};
use serde_json::json;
use tracing::debug;

use crate::{errors::K8sAdapterError, labels::GROUP_LABEL};

/// Group member pods as workloads.
#[derive(Clone)]
pub struct PodStore {
    client: Client,
}

impl PodStore {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl WorkloadStore for PodStore {
    async fn get(&self, id: &WorkloadRef) -> Result<Option<Workload>, StoreError> {
        let pod = self
            .api(&id.namespace)
            .get_opt(&id.name)
            .await
            .map_err(|err| StoreError::new("get pod", err))?;
        pod.map(|pod| {
            workload_from_pod(&pod).ok_or_else(|| {
                StoreError::new(
                    "get pod",
                    K8sAdapterError::IncompletePod {
                        pod: id.to_string(),
                    },
                )
            })
        })
        .transpose()
    }

    async fn update_conditions(&self, workload: &Workload) -> Result<(), StoreError> {
        let patch = status_patch(workload)
            .map_err(|err| StoreError::new("update pod status", err))?;
        debug!(pod = %workload.id, "patching pod status conditions");
        self.api(&workload.id.namespace)
            .patch_status(
                &workload.id.name,
                &PatchParams::default(),
                &Patch::Strategic(patch),
            )
            .await
            .map_err(|err| StoreError::new("update pod status", err))?;
        Ok(())
    }
}

/// Converts a pod into the workload view the reconciler works on.
///
/// Returns `None` for pods without a name or namespace.
#[must_use]
pub fn workload_from_pod(pod: &Pod) -> Option<Workload> {
    let meta = &pod.metadata;
    let id = WorkloadRef::new(meta.namespace.clone()?, meta.name.clone()?);
    let group = meta
        .labels
        .as_ref()
        .and_then(|labels| labels.get(GROUP_LABEL))
        .filter(|group| !group.is_empty())
        .cloned();

    let status = pod.status.as_ref();
    let mut addresses: Vec<String> = status
        .and_then(|status| status.pod_ips.as_ref())
        .map(|ips| ips.iter().map(|ip| ip.ip.clone()).collect())
        .unwrap_or_default();
    if addresses.is_empty() {
        addresses.extend(status.and_then(|status| status.pod_ip.clone()));
    }
    let conditions = status
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| conditions.iter().map(condition_from_pod).collect())
        .unwrap_or_default();

    let mut workload = Workload::new(id, group)
        .with_addresses(addresses)
        .with_deleting(meta.deletion_timestamp.is_some())
        .with_conditions(conditions);
    workload.revision = meta.resource_version.clone();
    Some(workload)
}

fn condition_from_pod(condition: &PodCondition) -> Condition {
    Condition {
        kind: condition.type_.clone(),
        status: ConditionStatus::from_label(&condition.status),
        last_transition: condition.last_transition_time.as_ref().map(|time| time.0),
    }
}

fn pod_condition(condition: &Condition) -> PodCondition {
    PodCondition {
        type_: condition.kind.clone(),
        status: condition.status.as_str().to_owned(),
        last_transition_time: condition.last_transition.map(Time),
        ..PodCondition::default()
    }
}

/// Strategic merge patch for the status subresource. Conditions merge by
/// type, so fields this view does not model are left untouched; the resource
/// version makes a stale write fail with a conflict.
fn status_patch(workload: &Workload) -> Result<serde_json::Value, K8sAdapterError> {
    let conditions: Vec<PodCondition> = workload.conditions.iter().map(pod_condition).collect();
    let conditions =
        serde_json::to_value(conditions).map_err(|source| K8sAdapterError::StatusPatch {
            pod: workload.id.to_string(),
            source,
        })?;
    let mut patch = json!({ "status": { "conditions": conditions } });
    if let Some(revision) = &workload.revision {
        patch["metadata"] = json!({ "resourceVersion": revision });
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone as _, Utc};
    use egress_readiness_core::{Position, constants::EGRESS_READY_CONDITION};
    use k8s_openapi::{
        api::core::v1::{PodIP, PodStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };

    use super::*;

    fn pod(name: &str, status: PodStatus) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: Some("tailscale".to_owned()),
                labels: Some(BTreeMap::from([(GROUP_LABEL.to_owned(), "eg".to_owned())])),
                resource_version: Some("42".to_owned()),
                ..ObjectMeta::default()
            },
            status: Some(status),
            ..Pod::default()
        }
    }

    #[test]
    fn converts_pod_identity_addresses_and_position() {
        let pod = pod("eg-1", PodStatus {
            pod_ips: Some(vec![PodIP {
                ip: "10.0.0.6".to_owned(),
            }]),
            ..PodStatus::default()
        });

        let workload = workload_from_pod(&pod).expect("complete pod");

        assert_eq!(workload.id, WorkloadRef::new("tailscale", "eg-1"));
        assert_eq!(workload.group.as_deref(), Some("eg"));
        assert_eq!(workload.addresses, vec!["10.0.0.6".to_owned()]);
        assert_eq!(workload.position, Some(Position::new(1)));
        assert_eq!(workload.revision.as_deref(), Some("42"));
        assert!(!workload.deleting);
    }

    #[test]
    fn falls_back_to_primary_pod_ip() {
        let pod = pod("eg-0", PodStatus {
            pod_ip: Some("10.0.0.5".to_owned()),
            ..PodStatus::default()
        });

        let workload = workload_from_pod(&pod).expect("complete pod");

        assert_eq!(workload.addresses, vec!["10.0.0.5".to_owned()]);
    }

    #[test]
    fn deletion_timestamp_marks_workload_deleting() {
        let mut pod = pod("eg-0", PodStatus::default());
        pod.metadata.deletion_timestamp = Some(Time(Utc::now()));

        assert!(workload_from_pod(&pod).expect("complete pod").deleting);
    }

    #[test]
    fn existing_egress_condition_is_recognised() {
        let pod = pod("eg-0", PodStatus {
            conditions: Some(vec![
                PodCondition {
                    type_: "Ready".to_owned(),
                    status: "True".to_owned(),
                    ..PodCondition::default()
                },
                PodCondition {
                    type_: EGRESS_READY_CONDITION.to_owned(),
                    status: "True".to_owned(),
                    last_transition_time: Some(Time(
                        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                    )),
                    ..PodCondition::default()
                },
            ]),
            ..PodStatus::default()
        });

        let workload = workload_from_pod(&pod).expect("complete pod");

        assert!(workload.has_egress_condition());
        assert_eq!(workload.conditions.len(), 2);
        assert_eq!(workload.conditions[1].status, ConditionStatus::True);
    }

    #[test]
    fn pod_without_egress_condition_is_not_ready() {
        let pod = pod("eg-0", PodStatus {
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_owned(),
                status: "True".to_owned(),
                ..PodCondition::default()
            }]),
            ..PodStatus::default()
        });

        assert!(!workload_from_pod(&pod).expect("complete pod").has_egress_condition());
    }

    #[test]
    fn status_patch_carries_conditions_and_revision() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut workload = workload_from_pod(&pod("eg-0", PodStatus::default())).unwrap();
        workload.conditions.push(Condition::egress_ready(now));

        let patch = status_patch(&workload).expect("patch");

        assert_eq!(patch["metadata"]["resourceVersion"], "42");
        let condition = &patch["status"]["conditions"][0];
        assert_eq!(condition["type"], EGRESS_READY_CONDITION);
        assert_eq!(condition["status"], "True");
        assert_eq!(condition["lastTransitionTime"], "2024-05-01T12:00:00Z");
    }
}
