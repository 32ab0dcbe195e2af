//! A channel's public Atom feed: the most recent uploads, no API key needed.

use log::debug;

use crate::VideoRecord;
use crate::error::{Error, Result};
use crate::innertube::{InnerTube, USER_AGENT};
use crate::xml::{self, child_attr, child_text, elements, nested_text};

/// The feed never carries more entries than this
pub const FEED_MAX_ENTRIES: usize = 15;

impl InnerTube {
    /// Fetch a channel's feed and parse up to `max_results` videos (capped at 15)
    pub async fn fetch_feed(&self, channel_id: &str, max_results: usize) -> Result<Vec<VideoRecord>> {
        let url = format!("{}/feeds/videos.xml", self.base_url);
        debug!("Fetching feed: {url}?channel_id={channel_id}");

        let resp = self
            .http
            .get(&url)
            .query(&[("channel_id", channel_id)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::FeedStatus {
                channel_id: channel_id.to_string(),
                status,
            });
        }

        let body = resp.text().await?;
        Ok(parse_feed(&body, max_results))
    }
}

/// Parse feed XML entry by entry. Entries without a video ID are skipped and
/// scanning stops as soon as enough records are collected.
pub fn parse_feed(xml: &str, max_results: usize) -> Vec<VideoRecord> {
    let limit = max_results.min(FEED_MAX_ENTRIES);
    elements(xml, "entry")
        .filter_map(|entry| parse_entry(entry.inner()))
        .take(limit)
        .collect()
}

fn parse_entry(entry: &str) -> Option<VideoRecord> {
    let video_id = child_text(entry, "yt:videoId").filter(|id| !id.is_empty())?;
    let decoded = |s: Option<&str>| s.map(xml::decode_entities).unwrap_or_default();

    Some(VideoRecord {
        video_id: video_id.to_string(),
        title: decoded(child_text(entry, "title")),
        description: decoded(nested_text(entry, "media:group", "media:description")),
        channel_title: decoded(nested_text(entry, "author", "name")),
        published_at: child_text(entry, "published").unwrap_or_default().to_string(),
        thumbnail_url: child_attr(entry, "media:thumbnail", "url").unwrap_or_default(),
    })
}
