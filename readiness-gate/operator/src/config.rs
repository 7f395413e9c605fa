use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use egress_readiness_core::constants::{
    DEFAULT_CLUSTER_DOMAIN, DEFAULT_ERROR_BACKOFF, DEFAULT_HEALTH_PORT, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_REQUEUE_INTERVAL,
};
use egress_readiness_k8s::HttpProbeSettings;
use serde::Deserialize;

/// Namespace the operator and its proxy groups run in.
pub const DEFAULT_NAMESPACE: &str = "tailscale";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Operator settings: optional YAML file, then `EGRESS_READINESS_*`
/// environment overrides.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OperatorConfig {
    pub namespace: String,
    pub cluster_domain: String,
    pub health_port: u16,
    pub probe_timeout_secs: u64,
    pub requeue_secs: u64,
    pub error_backoff_secs: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_owned(),
            health_port: DEFAULT_HEALTH_PORT,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            requeue_secs: DEFAULT_REQUEUE_INTERVAL.as_secs(),
            error_backoff_secs: DEFAULT_ERROR_BACKOFF.as_secs(),
        }
    }
}

impl OperatorConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup`; unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(namespace) = lookup("EGRESS_READINESS_NAMESPACE").filter(|v| !v.is_empty()) {
            self.namespace = namespace;
        }
        if let Some(domain) = lookup("EGRESS_READINESS_CLUSTER_DOMAIN").filter(|v| !v.is_empty()) {
            self.cluster_domain = domain;
        }
        override_parsed(&lookup, "EGRESS_READINESS_HEALTH_PORT", &mut self.health_port);
        override_parsed(
            &lookup,
            "EGRESS_READINESS_PROBE_TIMEOUT_SECS",
            &mut self.probe_timeout_secs,
        );
        override_parsed(&lookup, "EGRESS_READINESS_REQUEUE_SECS", &mut self.requeue_secs);
        override_parsed(
            &lookup,
            "EGRESS_READINESS_ERROR_BACKOFF_SECS",
            &mut self.error_backoff_secs,
        );
    }

    #[must_use]
    pub fn probe_settings(&self) -> HttpProbeSettings {
        HttpProbeSettings {
            cluster_domain: self.cluster_domain.clone(),
            port: self.health_port,
            timeout: Duration::from_secs(self.probe_timeout_secs),
        }
    }

    #[must_use]
    pub const fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }

    #[must_use]
    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(value) = lookup(key).and_then(|raw| raw.parse::<T>().ok()) {
        *slot = value;
    }
}
