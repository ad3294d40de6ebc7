use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::downloader::models::{ResolvedSource, SourceAttempt, SourceRequest, VideoStream};
use crate::downloader::traits::VideoSource;

/// Third-party proxy that serves already-clean files.
pub struct ProxySource {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl ProxySource {
    pub fn new(client: Client, endpoint: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    fn url_for(&self, request: &SourceRequest) -> String {
        format!("{}{}", self.endpoint, request.id)
    }
}

#[async_trait]
impl VideoSource for ProxySource {
    fn name(&self) -> &'static str {
        "cdn-proxy"
    }

    fn kind(&self) -> ResolvedSource {
        ResolvedSource::Proxy
    }

    async fn attempt(&self, request: &SourceRequest) -> SourceAttempt {
        let response = match self
            .client
            .get(self.url_for(request))
            .header(USER_AGENT, &self.user_agent)
            .header("X-Request-Id", &request.request_id)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(source = self.name(), error = %e, "request failed");
                return SourceAttempt::Unavailable;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(source = self.name(), status = %response.status(), "unexpected status");
            return SourceAttempt::Unavailable;
        }

        // The proxy answers error pages with 200 too; only trust video bodies.
        let is_video = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.contains("video"));
        if !is_video {
            debug!(source = self.name(), "response is not a video");
            return SourceAttempt::Unavailable;
        }

        SourceAttempt::Available {
            stream: VideoStream::from_response(response),
            needs_post_processing: false,
        }
    }
}
