//! Static File Serving
//!
//! Exposes the upload staging directory under `/uploads`.

use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;
use tracing::info;

pub fn router(upload_dir: &Path) -> Router {
    info!(path = %upload_dir.display(), "Serving uploads directory");

    Router::new().nest_service("/uploads", ServeDir::new(upload_dir))
}
