use std::time::Duration;

use async_trait::async_trait;
use egress_readiness_core::{
    HealthProbe, HealthTarget, ProbeVerdict,
    constants::{DEFAULT_CLUSTER_DOMAIN, DEFAULT_HEALTH_PORT, DEFAULT_PROBE_TIMEOUT, HEALTH_PATH},
};
use reqwest::{Client, StatusCode, Url};
use tracing::{info, warn};

/// Settings for probing group members over HTTP.
#[derive(Clone, Debug)]
pub struct HttpProbeSettings {
    pub cluster_domain: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for HttpProbeSettings {
    fn default() -> Self {
        Self {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_owned(),
            port: DEFAULT_HEALTH_PORT,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Probes a sibling's `/healthz` endpoint through its in-cluster DNS name.
#[derive(Clone)]
pub struct HttpHealthProbe {
    client: Client,
    settings: HttpProbeSettings,
}

impl HttpHealthProbe {
    pub fn new(settings: HttpProbeSettings) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    /// `http://<member>.<group>.<namespace>.svc.<domain>:<port>/healthz`
    pub fn health_url(&self, target: &HealthTarget) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "http://{}.{}.{}.svc.{}:{}{HEALTH_PATH}",
            target.name,
            target.group,
            target.namespace,
            self.settings.cluster_domain,
            self.settings.port
        ))
    }

    /// Only a 200 response is healthy; anything else, including transport
    /// failures and timeouts, is a not-yet-healthy verdict.
    pub async fn check(&self, url: Url) -> ProbeVerdict {
        info!(target: "readiness", %url, "calling sibling health check");
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                info!(target: "readiness", %url, error = %err, "error calling health check endpoint");
                return ProbeVerdict::Unhealthy {
                    reason: err.to_string(),
                };
            }
        };
        let status = response.status();
        if status != StatusCode::OK {
            info!(target: "readiness", %url, %status, "expected health check to return 200");
            return ProbeVerdict::Unhealthy {
                reason: format!("unexpected status {status}"),
            };
        }
        ProbeVerdict::Healthy
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, target: &HealthTarget) -> ProbeVerdict {
        match self.health_url(target) {
            Ok(url) => self.check(url).await,
            Err(err) => {
                warn!(target: "readiness", member = %target.name, error = %err, "invalid health check url");
                ProbeVerdict::Unhealthy {
                    reason: format!("invalid health check url: {err}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{Router, http::StatusCode as AxumStatus, routing::get};
    use tokio::net::TcpListener;

    use super::*;

    async fn serve(status: AxumStatus) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let router = Router::new().route(HEALTH_PATH, get(move || async move { status }));
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }

    fn probe() -> HttpHealthProbe {
        HttpHealthProbe::new(HttpProbeSettings {
            timeout: Duration::from_secs(2),
            ..HttpProbeSettings::default()
        })
        .expect("client")
    }

    fn url(addr: SocketAddr) -> Url {
        Url::parse(&format!("http://{addr}{HEALTH_PATH}")).expect("url")
    }

    #[test]
    fn health_url_uses_member_group_and_namespace() {
        let target = HealthTarget {
            name: "eg-1".into(),
            group: "eg".into(),
            namespace: "tailscale".into(),
        };

        let url = probe().health_url(&target).expect("url");

        assert_eq!(
            url.as_str(),
            "http://eg-1.eg.tailscale.svc.cluster.local:9002/healthz"
        );
    }

    #[tokio::test]
    async fn ok_status_is_healthy() {
        let addr = serve(AxumStatus::OK).await;
        assert_eq!(probe().check(url(addr)).await, ProbeVerdict::Healthy);
    }

    #[tokio::test]
    async fn service_unavailable_is_unhealthy() {
        let addr = serve(AxumStatus::SERVICE_UNAVAILABLE).await;
        let verdict = probe().check(url(addr)).await;
        assert!(!verdict.is_healthy(), "503 must not be healthy: {verdict:?}");
    }

    #[tokio::test]
    async fn other_success_codes_are_unhealthy() {
        let addr = serve(AxumStatus::NO_CONTENT).await;
        assert!(!probe().check(url(addr)).await.is_healthy());
    }

    #[tokio::test]
    async fn connection_failure_is_unhealthy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        assert!(!probe().check(url(addr)).await.is_healthy());
    }
}
