//! Automated Social Media Ad Generator - Main Entry Point
//!
//! Serves the Dioxus page together with the ad API routes.
//! Uses dioxus::serve() pattern for dx serve compatibility.

use social_ad_generator::app::App;

// Server entry point - NO #[tokio::main], dioxus::serve() creates its own runtime
#[cfg(feature = "server")]
fn main() {
    use std::sync::Arc;

    use social_ad_generator::config::Settings;
    use social_ad_generator::domain::services::{AdPipeline, ImgurClient, ReplicateClient};
    use social_ad_generator::handlers::{AdsState, ads_routes};

    // Initialize tracing BEFORE dioxus::serve
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Automated Social Media Ad Generator...");

    let settings = Settings::from_env();
    let status = settings.credentials.status();
    tracing::info!(
        replicate_token = status.inference_token,
        imgur_client_id = status.hosting_client_id,
        imgur_client_secret = status.hosting_client_secret,
        "Environment credentials loaded"
    );

    let pipeline = match AdPipeline::new(
        &settings,
        Arc::new(ImgurClient::new(settings.imgur_api_base.clone())),
        Arc::new(ReplicateClient::new(settings.replicate_api_base.clone())),
    ) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Failed to initialize ad pipeline: {}", e);
            std::process::exit(1);
        }
    };
    let state = AdsState::new(pipeline);

    // NO #[tokio::main] - dioxus::serve creates its own runtime
    dioxus::serve(move || {
        let state = state.clone();
        async move {
            // Base Dioxus router plus the ad API (body limit and state included)
            let router = dioxus::server::router(App).merge(ads_routes(state));
            Ok(router)
        }
    });
}

// WASM entry point (browser) - no server feature
#[cfg(all(not(feature = "server"), target_arch = "wasm32"))]
fn main() {
    web_sys::console::log_1(&"[WASM] Ad generator - WASM initialized!".into());
    dioxus::launch(App);
}

// Native client (desktop) - no server feature, not WASM
#[cfg(all(not(feature = "server"), not(target_arch = "wasm32")))]
fn main() {
    dioxus::launch(App);
}
