// Common data models for the resolution pipeline

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use serde::{Deserialize, Serialize, Serializer};

use super::errors::ResolveError;

/// Video code pulled out of user input (e.g. `s_AbCdEfGh12`).
///
/// Only constructed through [`VideoId::extract`], so a value of this type
/// always matches the code pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(pub(crate) String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque caller credentials for the authenticated API.
#[derive(Clone, Default)]
pub struct Credentials {
    pub bearer_token: Option<String>,
    pub cookies: Option<String>,
}

impl Credentials {
    pub fn new(bearer_token: impl Into<String>, cookies: impl Into<String>) -> Self {
        Self {
            bearer_token: non_empty(bearer_token.into()),
            cookies: non_empty(cookies.into()),
        }
    }

    /// Request-supplied values win over the process defaults. Empty strings
    /// count as "not supplied".
    pub fn with_overrides(&self, token: Option<&str>, cookies: Option<&str>) -> Self {
        Self {
            bearer_token: token
                .and_then(|t| non_empty(t.to_string()))
                .or_else(|| self.bearer_token.clone()),
            cookies: cookies
                .and_then(|c| non_empty(c.to_string()))
                .or_else(|| self.cookies.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("cookies", &self.cookies.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Everything a source needs for one attempt
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub id: VideoId,
    pub credentials: Credentials,
    /// Per-request token, forwarded upstream as `X-Request-Id`
    pub request_id: String,
}

/// Which upstream produced the bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSource {
    None,
    Proxy,
    AuthenticatedApi,
    DirectCdn,
}

impl ResolvedSource {
    /// Wire code used in responses
    pub fn code(&self) -> i8 {
        match self {
            Self::None => -1,
            Self::Proxy => 1,
            Self::AuthenticatedApi => 2,
            Self::DirectCdn => 3,
        }
    }
}

impl Serialize for ResolvedSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ResolveError>> + Send>>;

/// A live, not yet drained response body. Whoever holds it owns it.
pub struct VideoStream {
    pub body: ByteStream,
    /// Advertised `Content-Length`, if any
    pub content_length: Option<u64>,
}

impl VideoStream {
    pub fn new(body: ByteStream, content_length: Option<u64>) -> Self {
        Self {
            body,
            content_length,
        }
    }

    /// Wrap a reqwest response body
    pub fn from_response(response: reqwest::Response) -> Self {
        use futures_util::TryStreamExt;

        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(ResolveError::from);
        Self::new(Box::pin(body), content_length)
    }
}

impl fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single source attempt
#[derive(Debug)]
pub enum SourceAttempt {
    Unavailable,
    Available {
        stream: VideoStream,
        needs_post_processing: bool,
    },
}

/// Winning attempt plus its provenance
#[derive(Debug)]
pub struct Resolved {
    pub stream: VideoStream,
    pub needs_post_processing: bool,
    pub source: ResolvedSource,
}

/// Inbound request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default, alias = "url_or_code")]
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cookies: Option<String>,
}

/// Successful response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    /// `data:video/mp4;base64,...`
    pub clean_url: String,
    pub size: String,
    pub filename: String,
    pub source: ResolvedSource,
    pub quality: String,
    pub delogo_applied: bool,
}
