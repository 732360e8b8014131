//! Axum API server binary.

use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use livepair_api::{create_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("livepair=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting livepair-api");

    let config = AppConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Missing tools surface per-request as 500s; flag them at startup too
    if let Err(e) = livepair_media::check_ffmpeg() {
        warn!("{e}");
    }
    if let Err(e) = livepair_media::check_exiftool() {
        warn!("{e}");
    }

    let state = AppState::new(config.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
