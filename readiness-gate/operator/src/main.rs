use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use kube::Client;
use tracing::{error, info};

mod config;
mod controller;

use config::OperatorConfig;

/// Marks proxy group pods ready for egress traffic once routing and the
/// ordered startup dependency allow it.
#[derive(Debug, Parser)]
struct Args {
    /// Optional YAML config file; environment variables override its values.
    #[arg(long, env = "EGRESS_READINESS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run(Args::parse()).await {
        error!("egress readiness operator failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = OperatorConfig::load(args.config.as_deref())?;
    info!(
        namespace = %config.namespace,
        cluster_domain = %config.cluster_domain,
        health_port = config.health_port,
        "loaded operator config"
    );

    let client = Client::try_default()
        .await
        .context("failed to initialise kubernetes client")?;
    controller::run(client, &config).await
}
