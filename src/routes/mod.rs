//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/videos/generate-video` - Image upload to generated video
//! - `/health` - Health check
//! - `/uploads` - Staged upload files

pub mod health;
pub mod static_files;
pub mod videos;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();
    let upload_dir = state.config.server.upload_dir.clone();

    let router = Router::new()
        .merge(videos::router(state))
        .merge(health::router())
        .merge(static_files::router(&upload_dir));

    apply_cors(router, &origins).layer(TraceLayer::new_for_http())
}
