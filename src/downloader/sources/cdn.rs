use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::downloader::models::{ResolvedSource, SourceAttempt, SourceRequest, VideoStream};
use crate::downloader::traits::VideoSource;

/// Last-resort unauthenticated fetch straight from the CDN.
///
/// Files here are treated as final; no delogo pass is requested even though
/// the authenticated API can hand out watermarked copies of the same video.
pub struct DirectCdnSource {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl DirectCdnSource {
    pub fn new(client: Client, endpoint: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    fn url_for(&self, request: &SourceRequest) -> String {
        format!("{}{}.mp4", self.endpoint, request.id)
    }
}

#[async_trait]
impl VideoSource for DirectCdnSource {
    fn name(&self) -> &'static str {
        "direct-cdn"
    }

    fn kind(&self) -> ResolvedSource {
        ResolvedSource::DirectCdn
    }

    async fn attempt(&self, request: &SourceRequest) -> SourceAttempt {
        let response = match self
            .client
            .get(self.url_for(request))
            .header(USER_AGENT, &self.user_agent)
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

        SourceAttempt::Available {
            stream: VideoStream::from_response(response),
            needs_post_processing: false,
        }
    }
}
