#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use tokio::net::TcpListener;

use sorapure_lib::config::{AppConfig, Endpoints};
use sorapure_lib::downloader::{Credentials, DownloadService, WatermarkRemover};

/// Stands in for ffmpeg: writes a fixed marker to the output path.
pub const FILTER_SCRIPT: &str = r#"for a in "$@"; do out="$a"; done; printf 'delogo-output' > "$out""#;
pub const FILTERED_BYTES: &[u8] = b"delogo-output";

pub const GOOD_TOKEN: &str = "good-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBehavior {
    Clean,
    WatermarkOnly,
    NoAttachments,
    Garbage,
}

/// What each fake upstream serves.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub proxy_body: Option<Vec<u8>>,
    pub proxy_content_type: &'static str,
    pub api: ApiBehavior,
    pub media_body: Vec<u8>,
    pub cdn_body: Option<Vec<u8>>,
    /// Dribble the CDN body out in 5-byte chunks with this pause before each
    pub cdn_chunk_delay: Option<Duration>,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            proxy_body: None,
            proxy_content_type: "video/mp4",
            api: ApiBehavior::NoAttachments,
            media_body: b"raw-api-video".to_vec(),
            cdn_body: None,
            cdn_chunk_delay: None,
        }
    }
}

struct Shared {
    upstream: Upstream,
    base_url: String,
    seen_headers: Mutex<HashMap<String, String>>,
}

impl Shared {
    fn record(&self, headers: &HeaderMap, names: &[&str]) {
        let mut seen = self.seen_headers.lock().unwrap();
        for name in names {
            if let Some(v) = headers.get(*name).and_then(|v| v.to_str().ok()) {
                seen.insert(name.to_string(), v.to_string());
            }
        }
    }
}

pub struct TestServer {
    base_url: String,
    shared: Arc<Shared>,
    request_counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    pub async fn start(upstream: Upstream) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://127.0.0.1:{}", addr.port());

        let shared = Arc::new(Shared {
            upstream,
            base_url: base_url.clone(),
            seen_headers: Mutex::new(HashMap::new()),
        });

        let request_counts = Arc::new(Mutex::new(HashMap::new()));
        let request_counts_clone = request_counts.clone();

        let app = Router::new()
            .route("/proxy", get(proxy_endpoint))
            .route("/api/post/:id", get(api_endpoint))
            .route("/media/:file", get(media_endpoint))
            .route("/cdn/:file", get(cdn_endpoint))
            .with_state(shared.clone())
            .layer(axum::middleware::from_fn(
                move |req: axum::extract::Request, next: axum::middleware::Next| {
                    let counts = request_counts_clone.clone();
                    async move {
                        let path = req.uri().path().to_string();
                        if let Ok(mut counts) = counts.lock() {
                            *counts.entry(path).or_insert(0) += 1;
                        }
                        next.run(req).await
                    }
                },
            ));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            shared,
            request_counts,
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            proxy: format!("{}/proxy?id=", self.base_url),
            api: format!("{}/api/post/", self.base_url),
            api_origin: self.base_url.clone(),
            cdn: format!("{}/cdn/", self.base_url),
        }
    }

    /// Requests whose path starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.request_counts
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn total_requests(&self) -> usize {
        self.count("/")
    }

    pub fn seen_header(&self, name: &str) -> Option<String> {
        self.shared.seen_headers.lock().unwrap().get(name).cloned()
    }
}

async fn proxy_endpoint(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    shared.record(&headers, &["x-request-id", "user-agent"]);
    match &shared.upstream.proxy_body {
        Some(body) => (
            [(header::CONTENT_TYPE, shared.upstream.proxy_content_type)],
            body.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn api_endpoint(
    State(shared): State<Arc<Shared>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    shared.record(&headers, &["authorization", "cookie", "referer", "origin", "accept"]);

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", GOOD_TOKEN));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let base = &shared.base_url;
    let body = match shared.upstream.api {
        ApiBehavior::Clean => json!({
            "post": {"id": id, "attachments": [
                {"download_urls": {"no_watermark": format!("{}/media/clean.mp4", base)}}
            ]}
        }),
        ApiBehavior::WatermarkOnly => json!({
            "post": {"id": id, "attachments": [
                {"download_urls": {"watermark": format!("{}/media/watermarked.mp4", base)}}
            ]}
        }),
        ApiBehavior::NoAttachments => json!({"post": {"id": id, "attachments": []}}),
        ApiBehavior::Garbage => return (StatusCode::OK, "<html>login</html>").into_response(),
    };
    Json(body).into_response()
}

async fn media_endpoint(State(shared): State<Arc<Shared>>) -> Response {
    (
        [(header::CONTENT_TYPE, "video/mp4")],
        shared.upstream.media_body.clone(),
    )
        .into_response()
}

async fn cdn_endpoint(State(shared): State<Arc<Shared>>, UrlPath(file): UrlPath<String>) -> Response {
    let body = match &shared.upstream.cdn_body {
        Some(body) if file.ends_with(".mp4") => body.clone(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match shared.upstream.cdn_chunk_delay {
        Some(delay) => {
            let chunks: Vec<Bytes> = body.chunks(5).map(Bytes::copy_from_slice).collect();
            let stream = futures_util::stream::unfold(chunks.into_iter(), move |mut rest| async move {
                let chunk = rest.next()?;
                tokio::time::sleep(delay).await;
                Some((Ok::<_, std::io::Error>(chunk), rest))
            });
            ([(header::CONTENT_TYPE, "video/mp4")], Body::from_stream(stream)).into_response()
        }
        None => ([(header::CONTENT_TYPE, "video/mp4")], body).into_response(),
    }
}

pub fn test_config(server: &TestServer, scratch: &Path) -> AppConfig {
    AppConfig {
        endpoints: server.endpoints(),
        api_timeout: Duration::from_secs(5),
        stream_timeout: Duration::from_secs(5),
        filter_timeout: Duration::from_secs(10),
        scratch_dir: scratch.to_path_buf(),
        static_dir: scratch.join("public"),
        ..AppConfig::default()
    }
}

pub fn service_for(config: &AppConfig) -> DownloadService {
    let client = sorapure_lib::build_http_client().unwrap();
    DownloadService::from_config(config, client).with_remover(
        WatermarkRemover::new("sh", config.filter_timeout).with_leading_args(["-c", FILTER_SCRIPT, "ffmpeg"]),
    )
}

pub fn with_default_token(mut config: AppConfig) -> AppConfig {
    config.default_credentials = Credentials::new(GOOD_TOKEN, "");
    config
}

pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .all(|e| e.path().is_dir())
}

pub fn decode_clean_url(clean_url: &str) -> Vec<u8> {
    use base64::Engine;
    let encoded = clean_url.strip_prefix("data:video/mp4;base64,").unwrap();
    base64::engine::general_purpose::STANDARD.decode(encoded).unwrap()
}
