// Error types for the resolution pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Request body was not the expected JSON shape
    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    /// Input did not contain a recognisable video code
    #[error("Invalid video URL or code")]
    InvalidIdentifier,

    /// Every upstream source came back empty
    #[error("Video source unavailable")]
    SourceUnavailable,

    /// Stream (or filter output) is larger than the configured cap
    #[error("Video too large (>{}MB)", .limit / 1024 / 1024)]
    PayloadTooLarge { limit: u64 },

    /// External watermark filter failed or timed out
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// Network failure outside of a source attempt (e.g. while draining a stream)
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// Scratch storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ResolveError {
    /// Message safe to hand back to callers. Never includes upstream bodies
    /// or process output.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidIdentifier | Self::SourceUnavailable | Self::PayloadTooLarge { .. } => {
                self.to_string()
            }
            Self::MalformedRequest(_) => "Invalid request body".to_string(),
            Self::ProcessingFailed(_) => "Processing failed".to_string(),
            Self::Transport(_) | Self::Storage(_) => "Download failed".to_string(),
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Transport("timed out".to_string());
        }
        if e.is_connect() {
            return Self::Transport("connection failed".to_string());
        }
        Self::Transport(e.to_string())
    }
}
