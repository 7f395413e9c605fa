pub mod config_map;
pub mod endpoints;
pub mod errors;
pub mod http_probe;
pub mod labels;
pub mod pods;

pub use config_map::{ConfigMapResolver, config_map_name};
pub use endpoints::EndpointSliceStore;
pub use errors::K8sAdapterError;
pub use http_probe::{HttpHealthProbe, HttpProbeSettings};
pub use pods::{PodStore, workload_from_pod};
