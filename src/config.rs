//! Process-wide configuration, read once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::models::Credentials;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/131.0.0.0 Safari/537.36";

/// Upstream endpoint prefixes. The video code (plus `.mp4` for the CDN) is
/// appended verbatim.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub proxy: String,
    pub api: String,
    /// Origin / Referer host presented to the API
    pub api_origin: String,
    pub cdn: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            proxy: "https://api.soracdn.workers.dev/download-proxy?id=".to_string(),
            api: "https://sora.chatgpt.com/backend/project_y/post/".to_string(),
            api_origin: "https://sora.chatgpt.com".to_string(),
            cdn: "https://cdn.openai.com/MP4/".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub endpoints: Endpoints,
    /// Fallback credentials when a request does not bring its own
    pub default_credentials: Credentials,
    pub user_agent: String,
    /// Metadata calls to the API
    pub api_timeout: Duration,
    /// Full video downloads from the proxy, the API and the CDN
    pub stream_timeout: Duration,
    /// Wall clock budget for the delogo filter
    pub filter_timeout: Duration,
    pub max_payload_bytes: u64,
    pub ffmpeg_bin: String,
    pub scratch_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            endpoints: Endpoints::default(),
            default_credentials: Credentials::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(120),
            filter_timeout: Duration::from_secs(180),
            max_payload_bytes: 45 * 1024 * 1024,
            ffmpeg_bin: "ffmpeg".to_string(),
            scratch_dir: std::env::temp_dir(),
            static_dir: PathBuf::from("public"),
            max_body_bytes: 100 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            endpoints: Endpoints {
                proxy: std::env::var("PROXY_ENDPOINT").unwrap_or(defaults.endpoints.proxy),
                api: std::env::var("API_ENDPOINT").unwrap_or(defaults.endpoints.api),
                api_origin: std::env::var("API_ORIGIN").unwrap_or(defaults.endpoints.api_origin),
                cdn: std::env::var("CDN_ENDPOINT").unwrap_or(defaults.endpoints.cdn),
            },
            default_credentials: Credentials::new(
                std::env::var("SORA_BEARER_TOKEN").unwrap_or_default(),
                std::env::var("SORA_COOKIES").unwrap_or_default(),
            ),
            user_agent: std::env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            api_timeout: env_parse("API_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.api_timeout),
            stream_timeout: env_parse("STREAM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stream_timeout),
            filter_timeout: env_parse("FILTER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.filter_timeout),
            max_payload_bytes: env_parse::<u64>("MAX_PAYLOAD_MB")
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_payload_bytes),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
