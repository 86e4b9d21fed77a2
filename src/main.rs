mod auth;
mod catalog;
mod config;
mod database;
mod error;
mod handlers;
mod models;
mod state;
mod storage;
mod store;
mod utils;


use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{config::Config, handlers::*, state::AppState};

/// Room for multipart boundaries and the small text fields around the file part.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    info!(
        "Upload dir: {}, max file size: {} bytes",
        config.upload_dir.display(),
        config.max_file_size
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(config).await?;
    let app = app(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router over the given state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = (state.config.max_file_size + MULTIPART_OVERHEAD) as usize;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/files", get(list_files).post(upload_file))
        .route("/api/files/{id}", get(get_file).delete(delete_file))
        .route("/api/download/{id}", get(download_file))
        .route("/api/stats", get(get_stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
