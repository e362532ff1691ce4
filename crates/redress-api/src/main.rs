//! # redress-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the grievance API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use redress_api::bootstrap::{bootstrap, load_config, ConfigOverrides};
use redress_lifecycle::TransitionPolicy;
use tracing_subscriber::EnvFilter;

/// Redress grievance API server.
///
/// Every flag falls back to its environment variable, then to the YAML
/// config file, then to the built-in default.
#[derive(Parser, Debug)]
#[command(name = "redress-api", version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, env = "REDRESS_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (default 8080).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Shared bearer secret. Authentication is disabled when unset.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Postgres connection string. State is in-memory only when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Status transition rules: `unrestricted` or `workflow`.
    #[arg(long, env = "TRANSITION_POLICY")]
    transition_policy: Option<TransitionPolicy>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            auth_token: self.auth_token.clone(),
            database_url: self.database_url.clone(),
            transition_policy: self.transition_policy,
            log_json: self.log_json,
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.overrides())
        .context("failed to load configuration")?;

    init_tracing(config.log_json);

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    // No database URL means in-memory only.
    let db_pool = redress_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;

    let port = config.port;
    let state = bootstrap(config).with_db_pool(db_pool).with_metrics(metrics);

    // Hydrate the in-memory store from the database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        anyhow::anyhow!(e)
    })?;

    let app = redress_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Redress API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
