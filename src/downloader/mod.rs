// Downloader module - multi-source resolution pipeline

pub mod errors;
pub mod models;
pub mod identifier;
pub mod traits;
pub mod sources;
pub mod orchestrator;
pub mod materialize;
pub mod delogo;
pub mod encoder;
pub mod service;
pub mod utils;

pub use errors::ResolveError;
pub use models::{Credentials, DownloadRequest, ResolvedSource, ResponsePayload, SourceAttempt, SourceRequest, VideoId, VideoStream};
pub use traits::VideoSource;
pub use orchestrator::Resolver;
pub use materialize::{Materializer, ScratchSpace, TempArtifact};
pub use delogo::{DelogoRegion, WatermarkRemover};
pub use service::DownloadService;
