use async_trait::async_trait;
use egress_readiness_core::{ConfigResolver, EgressServices, StoreError};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use tracing::debug;

use crate::errors::K8sAdapterError;

/// Key of the ConfigMap entry holding the JSON egress services document.
pub const EGRESS_SERVICES_KEY: &str = "cfg";

#[must_use]
pub fn config_map_name(group: &str) -> String {
    format!("{group}-egress-config")
}

/// Reads a group's egress services from its `<group>-egress-config`
/// ConfigMap.
#[derive(Clone)]
pub struct ConfigMapResolver {
    client: Client,
}

impl ConfigMapResolver {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigResolver for ConfigMapResolver {
    async fn resolve(&self, group: &str, namespace: &str) -> Result<EgressServices, StoreError> {
        let name = config_map_name(group);
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = api
            .get_opt(&name)
            .await
            .map_err(|err| StoreError::new("get egress config", err))?;
        services_from(&name, config_map.as_ref())
            .map_err(|err| StoreError::new("resolve egress config", err))
    }
}

/// A group without its ConfigMap has not been set up yet, which is an error
/// rather than an empty service set.
pub fn services_from(
    name: &str,
    config_map: Option<&ConfigMap>,
) -> Result<EgressServices, K8sAdapterError> {
    let Some(config_map) = config_map else {
        debug!(config_map = %name, "egress config not found");
        return Err(K8sAdapterError::ConfigMissing {
            config_map: name.to_owned(),
        });
    };
    parse_services(name, config_map)
}

/// Decodes the services document from `binaryData`, falling back to `data`.
/// A missing or blank entry means no services.
pub fn parse_services(
    name: &str,
    config_map: &ConfigMap,
) -> Result<EgressServices, K8sAdapterError> {
    let binary = config_map
        .binary_data
        .as_ref()
        .and_then(|data| data.get(EGRESS_SERVICES_KEY))
        .map(|bytes| bytes.0.as_slice());
    let text = config_map
        .data
        .as_ref()
        .and_then(|data| data.get(EGRESS_SERVICES_KEY))
        .map(String::as_bytes);
    let Some(raw) = binary.or(text) else {
        return Ok(EgressServices::new());
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(EgressServices::new());
    }
    serde_json::from_slice(raw).map_err(|source| K8sAdapterError::ConfigDecode {
        config_map: name.to_owned(),
        source,
    })
}
