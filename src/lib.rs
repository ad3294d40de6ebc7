pub mod config;
pub mod downloader;
pub mod server;

use std::net::SocketAddr;
use std::time::Duration;

use tracing::info;

use config::AppConfig;
use downloader::DownloadService;
use server::{create_router, AppState};

/// Shared upstream client. Per-request timeouts are set by each source.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
}

pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let client = build_http_client().map_err(std::io::Error::other)?;
    let service = DownloadService::from_config(&config, client);
    info!(
        sources = ?service.resolver().source_names(),
        scratch = %config.scratch_dir.display(),
        "pipeline ready"
    );

    let app = create_router(AppState::new(service), &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(std::io::Error::other)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("SoraPure running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}
