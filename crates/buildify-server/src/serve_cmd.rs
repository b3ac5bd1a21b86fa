use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use buildify_core::provider::{GeminiClient, HuggingFaceClient};
use buildify_db::pool;

use crate::api::{self, AppState};
use crate::config::BuildifyConfig;

/// Largest accepted request body; saved logos arrive base64-encoded.
pub const BODY_LIMIT: usize = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/api/auth", api::auth::routes())
        .nest("/api/ai", api::ai::routes())
        .nest("/api/logo", api::logo::routes())
        .nest("/api/projects", api::projects::routes())
        .nest("/api/user", api::user::routes())
        .nest("/api/studio", api::studio::routes())
        .nest("/api/blobs", api::blobs::routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "Buildify backend is running"
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: BuildifyConfig) -> Result<()> {
    let db_pool = pool::create_pool(&config.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let providers = &config.providers;
    let text_model = GeminiClient::new(
        http.clone(),
        providers.gemini_api_key.clone(),
        providers.gemini_model.clone(),
        providers.gemini_base_url.clone(),
    );
    let image_model = HuggingFaceClient::new(
        http,
        providers.huggingface_api_key.clone(),
        providers.huggingface_model_url.clone(),
    );
    tracing::info!(
        text_model = %providers.gemini_model,
        image_model = %providers.huggingface_model_url,
        "AI providers configured"
    );

    let state = AppState {
        pool: db_pool.clone(),
        text_model: Arc::new(text_model),
        image_model: Arc::new(image_model),
        tokens: Arc::new(config.token_config),
        video_delay: config.server.video_delay,
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("buildify listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("buildify shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
