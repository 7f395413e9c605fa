use std::time::Duration;

/// Condition kind recorded on a workload once every egress gate has passed.
pub const EGRESS_READY_CONDITION: &str = "tailscale.com/egress-services";

/// Port every group member serves its health endpoint on.
pub const DEFAULT_HEALTH_PORT: u16 = 9002;

/// Path of the health endpoint exposed by every group member.
pub const HEALTH_PATH: &str = "/healthz";

/// Cluster DNS suffix used to address group members.
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Upper bound on a single sibling health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay before re-checking a workload whose sibling is not yet healthy.
pub const DEFAULT_REQUEUE_INTERVAL: Duration = Duration::from_secs(5);

/// Delay before retrying a reconcile that failed with a transient error.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(30);
