use std::env;

use anyhow::{Context, Result};
use wayfinder_api::build_app;
use wayfinder_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfinder_api");

    let bind = env::var("WAYFINDER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app()?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, "wayfinder travel planner started");

    axum::serve(listener, app).await?;
    Ok(())
}
