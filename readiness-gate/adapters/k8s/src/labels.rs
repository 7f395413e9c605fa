use std::collections::BTreeMap;

use egress_readiness_core::MembershipKey;

pub const LABEL_MANAGED: &str = "tailscale.com/managed";
pub const LABEL_PARENT_TYPE: &str = "tailscale.com/parent-resource-type";
pub const LABEL_PARENT_NAME: &str = "tailscale.com/parent-resource";
pub const LABEL_PARENT_NAMESPACE: &str = "tailscale.com/parent-resource-ns";
pub const LABEL_PROXY_GROUP: &str = "tailscale.com/proxy-group";
pub const LABEL_SVC_TYPE: &str = "tailscale.com/proxy-group-service-type";

pub const PARENT_TYPE_PROXY_GROUP: &str = "proxygroup";
pub const PARENT_TYPE_SVC: &str = "svc";
pub const SVC_TYPE_EGRESS: &str = "egress";

/// Label on a group member naming the group it belongs to.
pub const GROUP_LABEL: &str = LABEL_PARENT_NAME;

/// Selector matching every group member pod.
#[must_use]
pub fn group_member_selector() -> String {
    format!("{LABEL_PARENT_TYPE}={PARENT_TYPE_PROXY_GROUP}")
}

/// Selector matching every EndpointSlice published for an egress service.
#[must_use]
pub fn egress_membership_selector() -> String {
    format!("{LABEL_MANAGED}=true,{LABEL_SVC_TYPE}={SVC_TYPE_EGRESS}")
}

/// Labels carried by the EndpointSlice that routes `key`'s service to the
/// group.
#[must_use]
pub fn membership_labels(key: &MembershipKey) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        (LABEL_MANAGED, "true".to_owned()),
        (LABEL_PARENT_TYPE, PARENT_TYPE_SVC.to_owned()),
        (LABEL_PARENT_NAME, key.service.name.clone()),
        (LABEL_PARENT_NAMESPACE, key.service.namespace.clone()),
        (LABEL_PROXY_GROUP, key.group.clone()),
        (LABEL_SVC_TYPE, SVC_TYPE_EGRESS.to_owned()),
    ])
}

#[must_use]
pub fn membership_selector(key: &MembershipKey) -> String {
    to_selector(&membership_labels(key))
}

fn to_selector(labels: &BTreeMap<&'static str, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
