use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configured egress services of a group, keyed by the encoded
/// `<namespace>/<name>` of the cluster-side service.
pub type EgressServices = BTreeMap<String, EgressServiceConfig>;

/// Routing and target details of one egress service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressServiceConfig {
    #[serde(default)]
    pub tailnet_target: TailnetTarget,
    #[serde(default)]
    pub ports: Vec<PortMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailnetTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMap {
    pub protocol: String,
    pub match_port: u16,
    pub target_port: u16,
}

/// Namespace and name of the external-facing service an egress entry serves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("egress service key {key:?} is not of the form <namespace>/<name>")]
pub struct ServiceKeyError {
    pub key: String,
}

impl ServiceRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Decodes a configuration key into the service it names.
    pub fn decode(key: &str) -> Result<Self, ServiceKeyError> {
        let malformed = || ServiceKeyError {
            key: key.to_owned(),
        };
        let (namespace, name) = key.split_once('/').ok_or_else(malformed)?;
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(malformed());
        }
        Ok(Self::new(namespace, name))
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
