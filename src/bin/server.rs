//! Standalone API server (without Dioxus frontend)
//! Use this for API-only testing or backend development.
//!
//! Run with: PORT=3003 cargo run --bin server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;

use social_ad_generator::config::Settings;
use social_ad_generator::domain::services::{AdPipeline, ImgurClient, ReplicateClient};
use social_ad_generator::handlers::{AdsState, ads_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Ad Generator API Server (standalone)...");

    // PORT from the environment or .env (default: 3001)
    let settings = Settings::from_env();

    let pipeline = AdPipeline::new(
        &settings,
        Arc::new(ImgurClient::new(settings.imgur_api_base.clone())),
        Arc::new(ReplicateClient::new(settings.replicate_api_base.clone())),
    )
    .context("Failed to initialize ad pipeline")?;

    let app = ads_routes(AdsState::new(pipeline)).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], settings.port));
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
