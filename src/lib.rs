pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pinning;
pub mod services;
pub mod util;
pub mod workflow;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chain::MintVerifier;
use crate::config::Config;
use crate::db::Database;
use crate::pinning::Pinner;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub pinner: Arc<dyn Pinner>,
    pub verifier: Option<Arc<dyn MintVerifier>>,
}

async fn index() -> &'static str {
    "Veltis Protocol Backend API"
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Multipart bodies carry the file plus field framing.
    let body_limit = DefaultBodyLimit::max(state.config.limits.max_upload_bytes + 64 * 1024);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/verify", post(handlers::verify::verify_asset));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/files/upload", post(handlers::file::upload_file))
        .route("/files/confirm-mint", post(handlers::file::confirm_mint))
        .route("/records", get(handlers::record::list_records))
        .route(
            "/records/:id/certificate",
            get(handlers::record::get_certificate),
        )
        .route("/usage", get(handlers::usage::get_usage))
        .route("/usage/reconcile", post(handlers::usage::reconcile_usage))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine all routes under /api
    Router::new()
        .route("/", get(index))
        .nest("/api", public_routes.merge(protected_routes))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
