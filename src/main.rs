use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_relay::{config::Config, pixverse::PixVerseClient, routes::create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_relay=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let poll = config.polling.poll_config()?;
    info!(
        interval_ms = poll.interval().as_millis() as u64,
        max_attempts = poll.max_attempts(),
        "Polling configured"
    );

    let client = PixVerseClient::new(&config.pixverse)?;
    info!(base_url = %client.base_url(), "PixVerse client ready");

    tokio::fs::create_dir_all(&config.server.upload_dir).await?;

    // Create shared state
    let shutdown = CancellationToken::new();
    let state = AppState {
        config: config.clone(),
        videos: Arc::new(client),
        poll,
        shutdown: shutdown.clone(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then cancel every in-flight polling session.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
