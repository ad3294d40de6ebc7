// Video code extraction from pasted links / raw codes

use regex::Regex;

use super::models::VideoId;

lazy_static::lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"s_[0-9A-Za-z_-]{8,}").unwrap();
}

impl VideoId {
    /// Pull the first video code out of `input`.
    ///
    /// Accepts full share links (`https://sora.chatgpt.com/p/s_...`), links
    /// with query strings, or the bare code. Nothing is checked upstream.
    pub fn extract(input: &str) -> Option<VideoId> {
        VIDEO_ID_RE
            .find(input)
            .map(|m| VideoId(m.as_str().to_string()))
    }
}
