// Video Relay - uploaded image in, generated video URL out

pub mod config;
pub mod models;
pub mod types;
pub mod poller;    // Bounded polling of remote jobs
pub mod pixverse;  // PixVerse image-to-video client
pub mod uploads;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
