//! CRM Dashboard — customers, segments, and campaigns behind a small REST API.
//!
//! Main entry point that loads configuration and starts the server.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crm_core::config::AppConfig;
use crm_management::{ApiServer, ManagementState};
use crm_storage::MemoryStore;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crm-dashboard")]
#[command(about = "CRM dashboard backend: customer segments, campaigns, and stats")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CRM_DASHBOARD__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CRM_DASHBOARD__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Load sample customers on startup
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "crm_dashboard=info,crm_management=info,crm_segmentation=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("CRM Dashboard starting up");

    // Load configuration; unset values take their defaults, invalid ones abort startup
    let mut config = AppConfig::load().context("invalid configuration")?;

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        empty_rules = ?config.segmentation.empty_rules,
        google_sign_in = config.auth.google_client_id.is_some(),
        "Configuration loaded"
    );

    let state = ManagementState::new(&config, Arc::new(MemoryStore::new()))?;

    if cli.seed_demo {
        let seeded = state.store.seed_demo_data()?;
        info!(customers = seeded, "Demo customers loaded");
    }

    let api_server = ApiServer::new(config, state);

    info!("CRM Dashboard is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
