//! N109 Archives - an interactive five-chapter story with Sylus
//!
//! A Rust backend driving a per-session story state machine whose scenes and
//! closing persona analysis come from an LLM.

mod api;
mod generator;
mod llm;
mod runtime;
mod state_machine;
mod story;

use api::{create_router, AppState};
use generator::LlmContentGenerator;
use llm::LlmConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "n109_archives=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("N109_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let max_sessions: usize = std::env::var("N109_MAX_SESSIONS")
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(runtime::DEFAULT_MAX_SESSIONS);

    let llm_config = LlmConfig::from_env();
    let llm = llm_config.build_service().inspect_err(|e| {
        tracing::error!(error = %e, "No usable LLM configuration");
    })?;
    tracing::info!(
        model = llm.model_id(),
        gateway = llm_config.gateway.as_deref().unwrap_or("none"),
        "LLM service initialized"
    );

    let state = AppState::new(Arc::new(LlmContentGenerator::new(llm)), max_sessions);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("N109 Archives server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
