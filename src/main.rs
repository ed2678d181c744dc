//! tailnet-ingress
//!
//! Exposes a local HTTP backend on a tailnet node.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 INGRESS                      │
//!                    │                                              │
//!   flags/env/file ──┼─▶ config ──▶ lifecycle::startup (mode)       │
//!                    │                 │                 │          │
//!                    │        ActiveProxy          DeclarativeForward
//!                    │                 │                 │          │
//!   Client ──────────┼─▶ net listener ─▶ http server     forward spec
//!                    │     access filter ─▶ rewrite      │          │
//!                    │                 │                 ▼          │
//!   Backend ◀────────┼──── upstream client      provider (serve cfg)│
//!                    └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use tailnet_ingress::config::{load_config, Cli, ObservabilityConfig};
use tailnet_ingress::lifecycle::signals::spawn_signal_handler;
use tailnet_ingress::lifecycle::{IngressPlan, Shutdown};
use tailnet_ingress::net::{tls, LocalProvider};
use tailnet_ingress::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tls::install_crypto_provider();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        hostname = %config.hostname,
        backend = %config.backend,
        listen_port = config.listen_port,
        funnel = config.funnel,
        "tailnet-ingress starting"
    );

    let plan = match IngressPlan::from_config(&config) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(mode = %plan.mode(), upstream = %plan.target(), "Mode selected");

    let provider = LocalProvider::new(&config);
    if let Err(e) = provider.ensure_state_dir() {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    let prepared = match plan.prepare(&provider).await {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Some(addr) = config.observability.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
            return ExitCode::FAILURE;
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    match prepared.run(&provider, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Ingress stopped with error");
            ExitCode::FAILURE
        }
    }
}
