pub mod cache;
pub mod captions;
pub mod config;
pub mod data_api;
pub mod error;
pub mod feed;
pub mod innertube;
pub mod output;
pub mod resolve;
pub mod timedtext;
pub mod xml;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use cache::{CacheKey, TranscriptCache};
pub use captions::{CaptionSource, CaptionTrack};
pub use data_api::{DataApi, SearchOrder};
pub use error::{Error, Result};
pub use innertube::InnerTube;

/// A video as returned by the channel feed or the Data API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

/// A single captioned segment; offsets and durations are in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub offset: f64,
    pub duration: f64,
}

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid video id regex"));

static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts|live)/|.*[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})",
    )
    .expect("valid video url regex")
});

static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[a-zA-Z0-9_-]{22}$").expect("valid channel id regex"));

static CHANNEL_ID_SEARCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"UC[a-zA-Z0-9_-]{22}").expect("valid channel id regex"));

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare 11-character video ID
    if VIDEO_ID_RE.is_match(input) {
        return Some(input.to_string());
    }

    // any ?v= / &v=, embed/, v/, e/, shorts/, live/, nested paths and youtu.be/
    VIDEO_URL_RE.captures(input).map(|caps| caps[1].to_string())
}

/// True if `input` has the canonical channel ID shape (`UC` + 22 characters)
pub fn is_channel_id(input: &str) -> bool {
    CHANNEL_ID_RE.is_match(input)
}

/// First canonical channel ID embedded anywhere in `text`, e.g. inside a channel URL
pub fn find_channel_id(text: &str) -> Option<&str> {
    CHANNEL_ID_SEARCH_RE.find(text).map(|m| m.as_str())
}
