use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::innertube::{InnerTube, USER_AGENT};

/// The ANDROID client is served caption metadata without sign-in
const ANDROID_CLIENT_NAME: &str = "ANDROID";
const ANDROID_CLIENT_VERSION: &str = "19.29.37";
const ANDROID_SDK_VERSION: u32 = 30;

/// Playability states that mean the video cannot be watched at all
const UNPLAYABLE_STATES: &[&str] = &["UNPLAYABLE", "LOGIN_REQUIRED"];

/// A caption track offered for a video; fetched fresh each time, never cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Where transcripts come from on a cache miss.
///
/// [`InnerTube`] is the real implementation; the transcript cache only sees this trait.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Caption tracks available for a video, or why there are none
    async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Raw timed-text XML for one track
    async fn timed_text(&self, track: &CaptionTrack) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct RawCaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    name: Option<TrackName>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn into_text(self) -> Option<String> {
        self.simple_text.or_else(|| {
            self.runs
                .map(|runs| runs.into_iter().map(|r| r.text).collect::<String>())
                .filter(|s| !s.is_empty())
        })
    }
}

impl InnerTube {
    /// Ask the player endpoint which caption tracks a video has
    pub async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": ANDROID_CLIENT_NAME,
                    "clientVersion": ANDROID_CLIENT_VERSION,
                    "androidSdkVersion": ANDROID_SDK_VERSION
                }
            },
            "videoId": video_id,
            "contentCheckOk": true,
            "racyCheckOk": true
        });

        let resp = self.post("player", &body).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::PlayerStatus { status });
        }

        let player: PlayerResponse = resp.json().await?;
        tracks_from_player(video_id, player)
    }

    /// Download the timed-text XML behind a caption track
    pub async fn timed_text(&self, track: &CaptionTrack) -> Result<String> {
        debug!("Fetching timed text: lang={}", track.language_code);
        let resp = self
            .http
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::TimedTextStatus { status });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl CaptionSource for InnerTube {
    async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        InnerTube::caption_tracks(self, video_id).await
    }

    async fn timed_text(&self, track: &CaptionTrack) -> Result<String> {
        InnerTube::timed_text(self, track).await
    }
}

fn tracks_from_player(video_id: &str, player: PlayerResponse) -> Result<Vec<CaptionTrack>> {
    if let Some(ps) = player.playability_status {
        match ps.status.as_deref() {
            Some(s) if UNPLAYABLE_STATES.contains(&s) => {
                return Err(Error::Unplayable {
                    video_id: video_id.to_string(),
                    status: s.to_string(),
                });
            }
            Some("ERROR") => {
                return Err(Error::PlayabilityError {
                    video_id: video_id.to_string(),
                    reason: ps.reason.unwrap_or_else(|| "unknown".to_string()),
                });
            }
            _ => {}
        }
    }

    let tracks: Vec<CaptionTrack> = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|t| CaptionTrack {
            base_url: t.base_url,
            language_code: t.language_code,
            name: t.name.and_then(TrackName::into_text),
        })
        .collect();

    if tracks.is_empty() {
        return Err(Error::CaptionsDisabled {
            video_id: video_id.to_string(),
        });
    }

    debug!("Found {} caption tracks for {video_id}", tracks.len());
    Ok(tracks)
}

/// Exact language match, or for plain "en" any English variant
pub fn select_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    tracks.iter().find(|t| t.language_code == lang).or_else(|| {
        if lang == "en" {
            tracks.iter().find(|t| t.language_code.starts_with("en"))
        } else {
            None
        }
    })
}
