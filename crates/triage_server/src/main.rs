//! TriageHub tool server - Main entry point.
//!
//! Exposes the flows as five remote operations returning formatted text.
//! Startup is fail-fast: missing credentials or an unreachable capability
//! aggregator abort the process before the listener binds.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triage_core::Settings;
use triage_flows::AgentSet;

mod app;

use app::{router, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("triage=info".parse().expect("static directive"))
                .add_directive("warn".parse().expect("static directive")),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let settings = Settings::from_env();
    settings
        .validate()
        .context("configuration is incomplete; set COMPOSIO_API_KEY, LLM_API_KEY and LLM_MODEL")?;

    let agents = AgentSet::connect(&settings)
        .await
        .context("failed to acquire capability toolkits")?;

    let addr = std::env::var("TRIAGE_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let state = Arc::new(ServerState { settings, agents });

    info!(%addr, tools = 5, "starting tool server");
    info!("long-running operations block their request for the full pipeline duration");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
