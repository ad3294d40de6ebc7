// Watermark removal via an external ffmpeg delogo pass

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use super::errors::ResolveError;
use super::materialize::TempArtifact;
use super::utils::run_output_with_timeout;

/// Rectangle blanked by the delogo filter. Offsets are ffmpeg expressions
/// relative to the frame (`iw`/`ih`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelogoRegion {
    pub x: String,
    pub y: String,
    pub w: u32,
    pub h: u32,
}

impl Default for DelogoRegion {
    /// Bottom-right logo: 150x50 box, 160px from the right edge and 60px
    /// from the bottom.
    fn default() -> Self {
        Self {
            x: "iw-160".to_string(),
            y: "ih-60".to_string(),
            w: 150,
            h: 50,
        }
    }
}

impl DelogoRegion {
    pub fn filter(&self) -> String {
        format!("delogo=x={}:y={}:w={}:h={}", self.x, self.y, self.w, self.h)
    }
}

pub struct WatermarkRemover {
    program: String,
    leading_args: Vec<String>,
    region: DelogoRegion,
    timeout: Duration,
}

impl WatermarkRemover {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            region: DelogoRegion::default(),
            timeout,
        }
    }

    /// Arguments placed before the ffmpeg ones, for wrappers such as
    /// `nice -n 10 ffmpeg` or `sh -c '...'`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn build_args(&self, input: &TempArtifact, output: &TempArtifact) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.path().to_string_lossy().to_string(),
            "-vf".to_string(),
            self.region.filter(),
            "-c:a".to_string(),
            "copy".to_string(),
            output.path().to_string_lossy().to_string(),
        ]);
        args
    }

    /// Run the filter over `input`, writing to `output`.
    ///
    /// `input` is consumed and deleted whatever the outcome. On failure the
    /// output path is cleaned up too and nothing is retried.
    pub async fn remove(&self, input: TempArtifact, output: PathBuf) -> Result<TempArtifact, ResolveError> {
        let output = TempArtifact::claim(output);
        let args = self.build_args(&input, &output);

        info!(input = %input.path().display(), filter = %self.region.filter(), "running delogo");
        let result = run_output_with_timeout(&self.program, &args, self.timeout).await;
        drop(input);

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "delogo did not complete");
                return Err(ResolveError::ProcessingFailed(e.to_string()));
            }
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            warn!(status = ?out.status.code(), stderr = %stderr.trim(), "delogo failed");
            return Err(ResolveError::ProcessingFailed(format!(
                "filter exited with {:?}",
                out.status.code()
            )));
        }

        let written = tokio::fs::metadata(output.path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            warn!("delogo exited cleanly but produced no output");
            return Err(ResolveError::ProcessingFailed("empty output".to_string()));
        }

        info!(bytes = written, "delogo finished");
        Ok(output)
    }
}
