// Scratch files and stream draining

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::errors::ResolveError;
use super::models::VideoStream;

/// A scratch file owned by exactly one request.
///
/// The file is removed when the guard is dropped, whatever path got us
/// there. [`TempArtifact::into_bytes`] is the only way to take the contents
/// out, and it removes the file as well.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// Take ownership of `path`. Nothing needs to exist there yet.
    pub fn claim(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole artifact into memory and delete it.
    pub async fn into_bytes(self) -> Result<Vec<u8>, ResolveError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(bytes)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove scratch file"),
        }
    }
}

/// Paths for one request's input/output pair.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    dir: PathBuf,
    token: String,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(format!("{}_in.mp4", self.token))
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(format!("{}_out.mp4", self.token))
    }
}

/// Drains a [`VideoStream`] to disk under a size cap.
#[derive(Debug, Clone)]
pub struct Materializer {
    max_bytes: u64,
}

impl Materializer {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn too_large(&self) -> ResolveError {
        ResolveError::PayloadTooLarge {
            limit: self.max_bytes,
        }
    }

    /// Fail fast on an over-cap `len`.
    pub fn check_len(&self, len: u64) -> Result<(), ResolveError> {
        if len > self.max_bytes {
            Err(self.too_large())
        } else {
            Ok(())
        }
    }

    /// Write the stream to `dest`. On any error the partial file is gone by
    /// the time this returns.
    pub async fn materialize(&self, stream: VideoStream, dest: PathBuf) -> Result<TempArtifact, ResolveError> {
        if let Some(len) = stream.content_length {
            if let Err(e) = self.check_len(len) {
                warn!(advertised = len, limit = self.max_bytes, "stream rejected before download");
                return Err(e);
            }
        }

        let artifact = TempArtifact::claim(dest);
        let mut file = tokio::fs::File::create(artifact.path()).await?;
        let mut body = stream.body;
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                warn!(written, limit = self.max_bytes, "stream exceeded size cap");
                return Err(self.too_large());
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        debug!(path = %artifact.path().display(), bytes = written, "stream materialized");
        Ok(artifact)
    }
}
