//! Note API Server
//!
//! A small HTTP service for creating, reading, updating, and listing text
//! notes. Storage is pluggable: in-memory, Redis, or Google Cloud Storage,
//! chosen with the `BACKEND` environment variable.

mod config;
mod error;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Settings;
use crate::services::NoteService;
use crate::storage::BackendSelector;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub note_service: Arc<NoteService>,
}

impl AppState {
    /// The backend itself is built lazily on the first request that needs it
    pub fn new(settings: Settings) -> Self {
        let selector = Arc::new(BackendSelector::new(settings));
        Self {
            note_service: Arc::new(NoteService::new(selector)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Note API Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let settings = Settings::from_env().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, backend={}",
        settings.bind_address,
        settings.backend_kind()
    );

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;

    let app = build_router(AppState::new(settings));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::notes::redirect_to_notes))
        .route("/health", get(handlers::health))
        .route(
            "/notes",
            get(handlers::notes::list).post(handlers::notes::create),
        )
        .route(
            "/notes/:note_id",
            get(handlers::notes::get).put(handlers::notes::update),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
