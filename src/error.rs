use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot extract a YouTube video ID from \"{0}\"")]
    InvalidVideoId(String),

    #[error("YouTube feed returned {status} for channel \"{channel_id}\"")]
    FeedStatus { channel_id: String, status: StatusCode },

    #[error("InnerTube player API returned {status}")]
    PlayerStatus { status: StatusCode },

    #[error("video \"{video_id}\" is unavailable ({status}); it may be private, deleted, or region-locked")]
    Unplayable { video_id: String, status: String },

    #[error("video \"{video_id}\" returned an error: {reason}")]
    PlayabilityError { video_id: String, reason: String },

    #[error("no caption tracks found for video \"{video_id}\"; transcripts may be disabled")]
    CaptionsDisabled { video_id: String },

    #[error(
        "transcript not available in language \"{lang}\" for video \"{video_id}\"; available languages: {}",
        .available.join(", ")
    )]
    LanguageUnavailable {
        video_id: String,
        lang: String,
        available: Vec<String>,
    },

    #[error("failed to download transcript XML: {status}")]
    TimedTextStatus { status: StatusCode },

    #[error("transcript for video \"{video_id}\" (lang: {lang}) was retrieved but contained no text segments")]
    EmptyTranscript { video_id: String, lang: String },

    #[error("YouTube API forbidden (403); check your API key and quota. {body}")]
    Forbidden { body: String },

    #[error("YouTube API bad request (400): {body}")]
    BadRequest { body: String },

    #[error("YouTube API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_status_names_channel_and_code() {
        let err = Error::FeedStatus {
            channel_id: "UCxxxxxxxxxxxxxxxxxxxxxx".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("UCxxxxxxxxxxxxxxxxxxxxxx"));
    }

    #[test]
    fn test_language_unavailable_lists_codes() {
        let err = Error::LanguageUnavailable {
            video_id: "dQw4w9WgXcQ".to_string(),
            lang: "de".to_string(),
            available: vec!["en".to_string(), "fr".to_string()],
        };
        assert!(err.to_string().ends_with("available languages: en, fr"));
    }
}
