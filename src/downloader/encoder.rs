// Response packaging

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::models::{ResolvedSource, ResponsePayload, VideoId};

/// Static label; no quality detection is performed.
pub const QUALITY_LABEL: &str = "HD";

pub fn format_size(bytes: usize) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}

pub fn suggested_filename(id: &VideoId) -> String {
    format!("{}_{}.mp4", id, QUALITY_LABEL)
}

pub fn encode_payload(
    bytes: &[u8],
    id: &VideoId,
    source: ResolvedSource,
    delogo_applied: bool,
) -> ResponsePayload {
    ResponsePayload {
        clean_url: format!("data:video/mp4;base64,{}", STANDARD.encode(bytes)),
        size: format_size(bytes.len()),
        filename: suggested_filename(id),
        source,
        quality: QUALITY_LABEL.to_string(),
        delogo_applied,
    }
}
