// Per-request flow: extract → resolve → materialize → (delogo) → encode

use std::path::PathBuf;

use reqwest::Client;
use tracing::{info, info_span, Instrument};

use super::delogo::WatermarkRemover;
use super::encoder::encode_payload;
use super::errors::ResolveError;
use super::materialize::{Materializer, ScratchSpace};
use super::models::{Credentials, DownloadRequest, ResponsePayload, SourceRequest, VideoId};
use super::orchestrator::Resolver;
use super::sources::{AuthenticatedApiSource, DirectCdnSource, ProxySource};
use super::utils::request_token;
use crate::config::AppConfig;

pub struct DownloadService {
    resolver: Resolver,
    materializer: Materializer,
    remover: WatermarkRemover,
    default_credentials: Credentials,
    scratch_dir: PathBuf,
}

impl DownloadService {
    pub fn new(
        resolver: Resolver,
        materializer: Materializer,
        remover: WatermarkRemover,
        default_credentials: Credentials,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            materializer,
            remover,
            default_credentials,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Standard wiring: proxy → authenticated API → direct CDN.
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let endpoints = &config.endpoints;
        let resolver = Resolver::new()
            .with_source(Box::new(ProxySource::new(
                client.clone(),
                &endpoints.proxy,
                &config.user_agent,
                config.stream_timeout,
            )))
            .with_source(Box::new(AuthenticatedApiSource::new(
                client.clone(),
                &endpoints.api,
                &endpoints.api_origin,
                &config.user_agent,
                config.api_timeout,
                config.stream_timeout,
            )))
            .with_source(Box::new(DirectCdnSource::new(
                client,
                &endpoints.cdn,
                &config.user_agent,
                config.stream_timeout,
            )));

        Self::new(
            resolver,
            Materializer::new(config.max_payload_bytes),
            WatermarkRemover::new(&config.ffmpeg_bin, config.filter_timeout),
            config.default_credentials.clone(),
            &config.scratch_dir,
        )
    }

    pub fn with_remover(mut self, remover: WatermarkRemover) -> Self {
        self.remover = remover;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub async fn handle(&self, request: DownloadRequest) -> Result<ResponsePayload, ResolveError> {
        let id = VideoId::extract(&request.url).ok_or(ResolveError::InvalidIdentifier)?;
        let token = request_token(&id);
        let span = info_span!("download", id = %id, request = %token);

        self.process(id, token, &request).instrument(span).await
    }

    async fn process(
        &self,
        id: VideoId,
        token: String,
        request: &DownloadRequest,
    ) -> Result<ResponsePayload, ResolveError> {
        let credentials = self
            .default_credentials
            .with_overrides(request.token.as_deref(), request.cookies.as_deref());
        let scratch = ScratchSpace::new(&self.scratch_dir, token);

        let source_request = SourceRequest {
            id: id.clone(),
            credentials,
            request_id: scratch.token().to_string(),
        };
        let resolved = self.resolver.resolve(&source_request).await?;

        let input = self
            .materializer
            .materialize(resolved.stream, scratch.input_path())
            .await?;

        let artifact = if resolved.needs_post_processing {
            self.remover.remove(input, scratch.output_path()).await?
        } else {
            input
        };

        let bytes = artifact.into_bytes().await?;
        self.materializer.check_len(bytes.len() as u64)?;

        info!(source = ?resolved.source, bytes = bytes.len(), delogo = resolved.needs_post_processing, "download ready");
        Ok(encode_payload(&bytes, &id, resolved.source, resolved.needs_post_processing))
    }
}
