//! YouTube Data API v3: channel uploads, trending charts and search.
//!
//! Every call is a single page; `maxResults` bounds what comes back.

use std::fmt;
use std::str::FromStr;

use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::VideoRecord;
use crate::error::{Error, Result};

pub const DATA_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Sort order for [`DataApi::search`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchOrder {
    #[default]
    Relevance,
    Date,
    ViewCount,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SearchOrder::Relevance),
            "date" => Ok(SearchOrder::Date),
            "viewCount" | "viewcount" | "view-count" => Ok(SearchOrder::ViewCount),
            other => Err(format!("unknown search order \"{other}\" (expected relevance, date or viewCount)")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Snippet {
    published_at: String,
    title: String,
    description: String,
    channel_title: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// An item of `search.list`: the ID is an object naming what was found
#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
    channel_id: Option<String>,
}

/// An item of `videos.list`: the ID is the video ID itself
#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
}

impl Snippet {
    fn into_record(self, video_id: String) -> VideoRecord {
        let Thumbnails { default, medium, high } = self.thumbnails;
        VideoRecord {
            video_id,
            title: self.title,
            description: self.description,
            channel_title: self.channel_title,
            published_at: self.published_at,
            thumbnail_url: high.or(medium).or(default).map(|t| t.url).unwrap_or_default(),
        }
    }
}

impl From<SearchItem> for VideoRecord {
    fn from(item: SearchItem) -> Self {
        item.snippet.into_record(item.id.video_id.unwrap_or_default())
    }
}

impl From<VideoItem> for VideoRecord {
    fn from(item: VideoItem) -> Self {
        item.snippet.into_record(item.id)
    }
}

/// Caller-owned Data API client; every request carries the API key
#[derive(Debug, Clone)]
pub struct DataApi {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DataApi {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(http, api_key, DATA_API_BASE_URL)
    }

    pub fn with_base_url(http: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Most recent uploads of a channel
    pub async fn list_by_channel(&self, channel_id: &str, max_results: u32) -> Result<Vec<VideoRecord>> {
        let max = max_results.to_string();
        let params = [
            ("part", Some("snippet")),
            ("type", Some("video")),
            ("channelId", Some(channel_id)),
            ("order", Some("date")),
            ("maxResults", Some(max.as_str())),
        ];
        let resp: ListResponse<SearchItem> = self.get("search", &params).await?;
        Ok(records(resp, max_results))
    }

    /// Most popular videos in a region, optionally within one video category
    pub async fn list_trending(
        &self,
        region_code: &str,
        max_results: u32,
        category_id: Option<&str>,
    ) -> Result<Vec<VideoRecord>> {
        let max = max_results.to_string();
        let params = [
            ("part", Some("snippet")),
            ("chart", Some("mostPopular")),
            ("regionCode", Some(region_code)),
            ("maxResults", Some(max.as_str())),
            ("videoCategoryId", category_id),
        ];
        let resp: ListResponse<VideoItem> = self.get("videos", &params).await?;
        Ok(records(resp, max_results))
    }

    /// Videos matching a free-text query
    pub async fn search(&self, query: &str, max_results: u32, order: SearchOrder) -> Result<Vec<VideoRecord>> {
        let max = max_results.to_string();
        let params = [
            ("part", Some("snippet")),
            ("type", Some("video")),
            ("q", Some(query)),
            ("order", Some(order.as_str())),
            ("maxResults", Some(max.as_str())),
        ];
        let resp: ListResponse<SearchItem> = self.get("search", &params).await?;
        Ok(records(resp, max_results))
    }

    /// Channel ID of the best channel match for a name or handle
    pub async fn find_channel(&self, query: &str) -> Result<Option<String>> {
        let params = [
            ("part", Some("snippet")),
            ("type", Some("channel")),
            ("q", Some(query)),
            ("maxResults", Some("1")),
        ];
        let resp: ListResponse<SearchItem> = self.get("search", &params).await?;
        Ok(resp.items.into_iter().next().and_then(|item| item.id.channel_id))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, Option<&str>)]) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let query = build_query(params, &self.api_key);
        debug!("GET {url} ({} params)", query.len());

        let resp = self.http.get(&url).query(&query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        Ok(resp.json().await?)
    }
}

/// Set parameters plus the key; unset optional ones are left out entirely
fn build_query<'a>(params: &[(&'a str, Option<&'a str>)], api_key: &'a str) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .filter_map(|&(k, v)| v.map(|v| (k, v)))
        .chain(std::iter::once(("key", api_key)))
        .collect()
}

fn records<T: Into<VideoRecord>>(resp: ListResponse<T>, max_results: u32) -> Vec<VideoRecord> {
    resp.items.into_iter().take(max_results as usize).map(Into::into).collect()
}

fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::FORBIDDEN => Error::Forbidden { body },
        StatusCode::BAD_REQUEST => Error::BadRequest { body },
        _ => Error::Api { status, body },
    }
}
