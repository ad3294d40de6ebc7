// Orchestrator with fallback logic

use tracing::{debug, info};

use super::errors::ResolveError;
use super::models::{Resolved, SourceAttempt, SourceRequest};
use super::traits::VideoSource;

/// Ordered fallback chain over [`VideoSource`]s.
///
/// Sources are tried strictly one after another in insertion order; the
/// first one that yields a stream wins and the rest are never touched.
pub struct Resolver {
    sources: Vec<Box<dyn VideoSource>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: Box<dyn VideoSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn VideoSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, request: &SourceRequest) -> Result<Resolved, ResolveError> {
        for source in &self.sources {
            debug!(source = source.name(), id = %request.id, "trying source");

            match source.attempt(request).await {
                SourceAttempt::Available {
                    stream,
                    needs_post_processing,
                } => {
                    info!(
                        source = source.name(),
                        id = %request.id,
                        needs_post_processing,
                        "source resolved"
                    );
                    return Ok(Resolved {
                        stream,
                        needs_post_processing,
                        source: source.kind(),
                    });
                }
                SourceAttempt::Unavailable => {
                    debug!(source = source.name(), id = %request.id, "source unavailable");
                }
            }
        }

        info!(id = %request.id, "all sources unavailable");
        Err(ResolveError::SourceUnavailable)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::downloader::models::{Credentials, ResolvedSource, VideoId, VideoStream};

    struct FakeSource {
        kind: ResolvedSource,
        succeeds: bool,
        needs_post_processing: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(kind: ResolvedSource, succeeds: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                kind,
                succeeds,
                needs_post_processing: false,
                calls: Arc::clone(&calls),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn kind(&self) -> ResolvedSource {
            self.kind
        }

        async fn attempt(&self, _request: &SourceRequest) -> SourceAttempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeeds {
                return SourceAttempt::Unavailable;
            }
            let body = futures_util::stream::iter(vec![Ok::<_, ResolveError>(Bytes::from_static(b"video"))]);
            SourceAttempt::Available {
                stream: VideoStream::new(Box::pin(body), Some(5)),
                needs_post_processing: self.needs_post_processing,
            }
        }
    }

    fn request() -> SourceRequest {
        SourceRequest {
            id: VideoId::extract("s_AbCdEfGh12").unwrap(),
            credentials: Credentials::default(),
            request_id: "deadbeef".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let (proxy, proxy_calls) = FakeSource::new(ResolvedSource::Proxy, true);
        let (api, api_calls) = FakeSource::new(ResolvedSource::AuthenticatedApi, true);
        let (cdn, cdn_calls) = FakeSource::new(ResolvedSource::DirectCdn, true);

        let resolver = Resolver::new()
            .with_source(Box::new(proxy))
            .with_source(Box::new(api))
            .with_source(Box::new(cdn));

        let resolved = resolver.resolve(&request()).await.unwrap();
        assert_eq!(resolved.source, ResolvedSource::Proxy);
        assert!(!resolved.needs_post_processing);
        assert_eq!(proxy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cdn_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_in_order() {
        let (proxy, proxy_calls) = FakeSource::new(ResolvedSource::Proxy, false);
        let (mut api, api_calls) = FakeSource::new(ResolvedSource::AuthenticatedApi, true);
        api.needs_post_processing = true;
        let (cdn, cdn_calls) = FakeSource::new(ResolvedSource::DirectCdn, true);

        let resolver = Resolver::new()
            .with_source(Box::new(proxy))
            .with_source(Box::new(api))
            .with_source(Box::new(cdn));

        let resolved = resolver.resolve(&request()).await.unwrap();
        assert_eq!(resolved.source, ResolvedSource::AuthenticatedApi);
        assert!(resolved.needs_post_processing);
        assert_eq!(proxy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cdn_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_unavailable_is_source_unavailable() {
        let (proxy, proxy_calls) = FakeSource::new(ResolvedSource::Proxy, false);
        let (api, api_calls) = FakeSource::new(ResolvedSource::AuthenticatedApi, false);
        let (cdn, cdn_calls) = FakeSource::new(ResolvedSource::DirectCdn, false);

        let resolver = Resolver::new()
            .with_source(Box::new(proxy))
            .with_source(Box::new(api))
            .with_source(Box::new(cdn));

        let err = resolver.resolve(&request()).await.unwrap_err();
        assert!(matches!(err, ResolveError::SourceUnavailable));
        assert_eq!(proxy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cdn_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_is_source_unavailable() {
        let err = Resolver::default().resolve(&request()).await.unwrap_err();
        assert!(matches!(err, ResolveError::SourceUnavailable));
    }
}
