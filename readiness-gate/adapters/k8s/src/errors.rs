#[derive(Debug, thiserror::Error)]
/// Failures specific to the Kubernetes-backed capabilities.
pub enum K8sAdapterError {
    #[error("expected at most one EndpointSlice matching {selector}, found {count}")]
    MultipleMembershipRecords { selector: String, count: usize },
    #[error("egress config ConfigMap {config_map} not found")]
    ConfigMissing { config_map: String },
    #[error("failed to decode egress services from ConfigMap {config_map}: {source}")]
    ConfigDecode {
        config_map: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("pod {pod} has no name or namespace")]
    IncompletePod { pod: String },
    #[error("failed to build status patch for pod {pod}: {source}")]
    StatusPatch {
        pod: String,
        #[source]
        source: serde_json::Error,
    },
}
