// Video source trait definition

use async_trait::async_trait;

use super::models::{ResolvedSource, SourceAttempt, SourceRequest};

/// One upstream that may be able to hand over a video stream.
///
/// Implementations absorb all of their own failures: network errors, bad
/// statuses and unparseable metadata all come back as
/// [`SourceAttempt::Unavailable`], never as an error.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Provenance reported when this source wins
    fn kind(&self) -> ResolvedSource;

    /// Try to open a stream for the requested video
    async fn attempt(&self, request: &SourceRequest) -> SourceAttempt;
}
