use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::downloader::errors::ResolveError;
use crate::downloader::models::{ResolvedSource, SourceAttempt, SourceRequest, VideoStream};
use crate::downloader::traits::VideoSource;

/// Post metadata returned by the first-party API. Only the fields we read.
#[derive(Debug, Deserialize)]
struct PostEnvelope {
    post: Option<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
struct Attachment {
    download_urls: Option<DownloadUrls>,
    downloadable_url: Option<String>,
    encodings: Option<Encodings>,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadUrls {
    no_watermark: Option<String>,
    watermark: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Encodings {
    source: Option<Encoding>,
}

#[derive(Debug, Default, Deserialize)]
struct Encoding {
    path: Option<String>,
}

impl Attachment {
    /// Best download URL and whether it still needs the delogo pass.
    ///
    /// The clean variant wins; otherwise fall back to downloadable →
    /// watermarked → source encoding, all of which carry the logo.
    fn pick_download(&self) -> Option<(String, bool)> {
        let urls = self.download_urls.as_ref();

        if let Some(url) = usable(urls.and_then(|u| u.no_watermark.as_deref())) {
            return Some((url, false));
        }

        usable(self.downloadable_url.as_deref())
            .or_else(|| usable(urls.and_then(|u| u.watermark.as_deref())))
            .or_else(|| {
                usable(
                    self.encodings
                        .as_ref()
                        .and_then(|e| e.source.as_ref())
                        .and_then(|s| s.path.as_deref()),
                )
            })
            .map(|url| (url, true))
    }
}

fn usable(url: Option<&str>) -> Option<String> {
    url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string)
}

/// Authenticated first-party API: richer, but needs a bearer token and may
/// only offer a watermarked file.
pub struct AuthenticatedApiSource {
    client: Client,
    endpoint: String,
    origin: String,
    user_agent: String,
    api_timeout: Duration,
    stream_timeout: Duration,
}

impl AuthenticatedApiSource {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        origin: impl Into<String>,
        user_agent: impl Into<String>,
        api_timeout: Duration,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            origin: origin.into(),
            user_agent: user_agent.into(),
            api_timeout,
            stream_timeout,
        }
    }

    async fn fetch(&self, request: &SourceRequest, token: &str) -> Result<SourceAttempt, ResolveError> {
        let mut metadata = self
            .client
            .get(format!("{}{}", self.endpoint, request.id))
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .header(REFERER, format!("{}/p/{}", self.origin, request.id))
            .header(ORIGIN, &self.origin)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .timeout(self.api_timeout);
        if let Some(cookies) = &request.credentials.cookies {
            metadata = metadata.header(COOKIE, cookies);
        }

        let envelope: PostEnvelope = metadata.send().await?.error_for_status()?.json().await?;

        let Some((url, needs_post_processing)) = envelope
            .post
            .and_then(|p| p.attachments.into_iter().next())
            .and_then(|a| a.pick_download())
        else {
            debug!(source = self.name(), "no download url in metadata");
            return Ok(SourceAttempt::Unavailable);
        };

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.stream_timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            debug!(source = self.name(), status = %response.status(), "video download refused");
            return Ok(SourceAttempt::Unavailable);
        }

        Ok(SourceAttempt::Available {
            stream: VideoStream::from_response(response),
            needs_post_processing,
        })
    }
}

#[async_trait]
impl VideoSource for AuthenticatedApiSource {
    fn name(&self) -> &'static str {
        "sora-api"
    }

    fn kind(&self) -> ResolvedSource {
        ResolvedSource::AuthenticatedApi
    }

    async fn attempt(&self, request: &SourceRequest) -> SourceAttempt {
        // No token, no call.
        let Some(token) = request.credentials.bearer_token.as_deref() else {
            debug!(source = self.name(), "skipped: no bearer token");
            return SourceAttempt::Unavailable;
        };

        match self.fetch(request, token).await {
            Ok(attempt) => attempt,
            Err(e) => {
                debug!(source = self.name(), error = %e, "attempt failed");
                SourceAttempt::Unavailable
            }
        }
    }
}
