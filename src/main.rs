use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sorapure_lib::config::AppConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sorapure=info,sorapure_lib=info,tower_http=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }

    if let Err(e) = sorapure_lib::run(AppConfig::from_env()).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
