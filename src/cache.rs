//! Two-tier transcript cache: an in-memory path index over JSON files on disk.
//!
//! Disk is the source of truth. The index only saves a probe and can be
//! cleared or rebuilt at any time. Entries are written once and never
//! expire: captions for a fixed video and language do not change upstream.
//!
//! There is no lock around a miss. Two callers racing on the same cold key
//! may both fetch and both write the same file, which is harmless.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::captions::{CaptionSource, select_track};
use crate::error::{Error, Result};
use crate::timedtext::parse_timed_text;
use crate::{TranscriptSegment, extract_video_id};

pub const DEFAULT_LANG: &str = "en";

const VIDEO_ID_LEN: usize = 11;

pub fn default_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ytfeed")
        .join("transcripts")
}

/// Identifies one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub video_id: String,
    pub lang: String,
}

impl CacheKey {
    pub fn new(video_id: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            lang: lang.into(),
        }
    }

    /// `<videoId>_<lang>` with anything outside `[a-zA-Z0-9_-]` replaced by `_`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", sanitize(&self.video_id), sanitize(&self.lang))
    }

    /// Inverse of [`file_stem`](Self::file_stem) for ordinary language codes.
    /// The language comes back in its sanitized form.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let (video_id, rest) = stem.split_at_checked(VIDEO_ID_LEN)?;
        let lang = rest.strip_prefix('_').filter(|l| !l.is_empty())?;
        extract_video_id(video_id).filter(|id| id == video_id)?;
        Some(Self::new(video_id, lang))
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Transcripts keyed by (video, language), fetched through `S` at most once per key.
pub struct TranscriptCache<S> {
    source: S,
    dir: PathBuf,
    index: Mutex<HashMap<CacheKey, PathBuf>>,
}

impl<S: CaptionSource> TranscriptCache<S> {
    /// Cache rooted at `dir`; nothing touches the filesystem until the first write
    pub fn new(source: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            dir: dir.into(),
            index: Mutex::new(HashMap::new()),
        }
    }

    /// Like [`new`](Self::new) but creates the directory up front
    pub fn open(source: S, dir: impl Into<PathBuf>) -> Result<Self> {
        let cache = Self::new(source, dir);
        std::fs::create_dir_all(&cache.dir)?;
        Ok(cache)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Switch to (and create) another directory. Safe to repeat.
    ///
    /// Indexed paths point into the old directory, so the index is cleared.
    pub fn init_dir(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!("Transcript cache directory: {}", dir.display());
        self.dir = dir;
        self.clear_index();
        Ok(())
    }

    /// Forget the in-memory index. Files on disk stay.
    pub fn clear_index(&self) {
        self.index().clear();
    }

    pub fn index_len(&self) -> usize {
        self.index().len()
    }

    /// Where the entry for `key` lives (or would live)
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Path of a cached transcript without fetching; `None` if it was never cached
    pub fn transcript_path(&self, video_id_or_url: &str, lang: &str) -> Option<PathBuf> {
        let key = CacheKey::new(extract_video_id(video_id_or_url)?, lang);
        if let Some(path) = self.index().get(&key) {
            return Some(path.clone());
        }

        let path = self.path_for(&key);
        if path.is_file() {
            self.index().insert(key, path.clone());
            return Some(path);
        }
        None
    }

    /// Repopulate the index from the files in the cache directory
    pub fn rebuild_index(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut index = self.index();
        let mut found = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).and_then(CacheKey::from_file_stem) else {
                continue;
            };
            index.insert(key, path);
            found += 1;
        }
        debug!("Rebuilt transcript index from {}: {found} entries", self.dir.display());
        Ok(found)
    }

    /// Transcript segments for a video ID or URL in `lang`.
    ///
    /// Served from the index, then from disk, and only then fetched, parsed
    /// and written to disk before returning.
    pub async fn fetch_transcript(&self, video_id_or_url: &str, lang: &str) -> Result<Vec<TranscriptSegment>> {
        let video_id =
            extract_video_id(video_id_or_url).ok_or_else(|| Error::InvalidVideoId(video_id_or_url.to_string()))?;
        let key = CacheKey::new(video_id, lang);

        let indexed = self.index().get(&key).cloned();
        if let Some(path) = indexed {
            if let Some(segments) = read_segments(&path) {
                debug!("Cache hit (index): {}", path.display());
                return Ok(segments);
            }
        }

        let path = self.path_for(&key);
        if let Some(segments) = read_segments(&path) {
            debug!("Cache hit (disk): {}", path.display());
            self.index().insert(key, path);
            return Ok(segments);
        }

        debug!("Cache miss: {}", path.display());
        let segments = self.download(&key).await?;

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(&segments)?)?;
        debug!("Cached transcript: {}", path.display());
        self.index().insert(key, path);

        Ok(segments)
    }

    /// Transcript text with segments joined by single spaces
    pub async fn fetch_transcript_text(&self, video_id_or_url: &str, lang: &str) -> Result<String> {
        let segments = self.fetch_transcript(video_id_or_url, lang).await?;
        Ok(segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "))
    }

    async fn download(&self, key: &CacheKey) -> Result<Vec<TranscriptSegment>> {
        let CacheKey { video_id, lang } = key;
        let tracks = self.source.caption_tracks(video_id).await?;

        let Some(track) = select_track(&tracks, lang) else {
            return Err(Error::LanguageUnavailable {
                video_id: video_id.clone(),
                lang: lang.clone(),
                available: tracks.iter().map(|t| t.language_code.clone()).collect(),
            });
        };
        debug!("Using caption track: lang={}", track.language_code);

        let xml = self.source.timed_text(track).await?;
        let segments = parse_timed_text(&xml);
        if segments.is_empty() {
            return Err(Error::EmptyTranscript {
                video_id: video_id.clone(),
                lang: lang.clone(),
            });
        }
        Ok(segments)
    }

    fn index(&self) -> MutexGuard<'_, HashMap<CacheKey, PathBuf>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cache file's segments; missing or unreadable files count as a miss
fn read_segments(path: &Path) -> Option<Vec<TranscriptSegment>> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(segments) => Some(segments),
        Err(e) => {
            debug!("Ignoring unreadable cache file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::CaptionTrack;

    const FORMAT3: &str = r#"<timedtext format="3"><body><p t="0" d="1500">Never gonna</p><p t="1500" d="2000">give you up</p></body></timedtext>"#;

    struct FakeSource {
        langs: Vec<&'static str>,
        xml: &'static str,
        track_calls: AtomicUsize,
        text_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(langs: &[&'static str], xml: &'static str) -> Self {
            Self {
                langs: langs.to_vec(),
                xml,
                track_calls: AtomicUsize::new(0),
                text_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> (usize, usize) {
            (self.track_calls.load(Ordering::SeqCst), self.text_calls.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl CaptionSource for FakeSource {
        async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
            self.track_calls.fetch_add(1, Ordering::SeqCst);
            if self.langs.is_empty() {
                return Err(Error::CaptionsDisabled {
                    video_id: video_id.to_string(),
                });
            }
            Ok(self
                .langs
                .iter()
                .map(|lang| CaptionTrack {
                    base_url: format!("https://example.test/timedtext?v={video_id}&lang={lang}"),
                    language_code: lang.to_string(),
                    name: None,
                })
                .collect())
        }

        async fn timed_text(&self, _track: &CaptionTrack) -> Result<String> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.xml.to_string())
        }
    }

    fn cache(langs: &[&'static str], xml: &'static str) -> (TempDir, TranscriptCache<FakeSource>) {
        let tmp = TempDir::new().unwrap();
        let cache = TranscriptCache::new(FakeSource::new(langs, xml), tmp.path().join("transcripts"));
        (tmp, cache)
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(CacheKey::new("dQw4w9WgXcQ", "en").file_stem(), "dQw4w9WgXcQ_en");
        assert_eq!(CacheKey::new("dQw4w9WgXcQ", "zh-Hans").file_stem(), "dQw4w9WgXcQ_zh-Hans");
        assert_eq!(CacheKey::new("dQw4w9WgXcQ", "a.b/c").file_stem(), "dQw4w9WgXcQ_a_b_c");
    }

    #[test]
    fn test_from_file_stem() {
        assert_eq!(
            CacheKey::from_file_stem("dQw4w9WgXcQ_en-US"),
            Some(CacheKey::new("dQw4w9WgXcQ", "en-US"))
        );
        // Video IDs may themselves contain underscores
        assert_eq!(
            CacheKey::from_file_stem("a_b_c_d_e_f_en"),
            Some(CacheKey::new("a_b_c_d_e_f", "en"))
        );
        assert_eq!(CacheKey::from_file_stem("dQw4w9WgXcQ_"), None);
        assert_eq!(CacheKey::from_file_stem("short_en"), None);
        assert_eq!(CacheKey::from_file_stem("dQw4w9WgXcQen"), None);
    }

    #[tokio::test]
    async fn test_fetch_writes_pretty_json() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        let segments = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].offset, 1.5);
        assert_eq!(segments[1].duration, 2.0);

        let path = cache.dir().join("dQw4w9WgXcQ_en.json");
        let data = std::fs::read_to_string(&path).unwrap();
        assert!(data.starts_with("[\n  {\n    \"text\": \"Never gonna\","));
        let on_disk: Vec<TranscriptSegment> = serde_json::from_str(&data).unwrap();
        assert_eq!(on_disk, segments);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        let first = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(cache.index_len(), 1);

        let second = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.source().calls(), (1, 1));
        assert_eq!(cache.index_len(), 1);
    }

    #[tokio::test]
    async fn test_cold_start_reads_disk_only() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        let first = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();

        cache.clear_index();
        assert_eq!(cache.index_len(), 0);

        let second = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.source().calls(), (1, 1));
        assert_eq!(cache.index_len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_cache_over_existing_dir() {
        let (tmp, cache) = cache(&["en"], FORMAT3);
        cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();

        let fresh = TranscriptCache::new(FakeSource::new(&["en"], FORMAT3), tmp.path().join("transcripts"));
        let text = fresh.fetch_transcript_text("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(text, "Never gonna give you up");
        assert_eq!(fresh.source().calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_url_normalized_before_lookup() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        cache.fetch_transcript("https://youtu.be/dQw4w9WgXcQ", "en").await.unwrap();
        cache
            .fetch_transcript("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "en")
            .await
            .unwrap();
        assert_eq!(cache.source().calls(), (1, 1));
        assert!(cache.dir().join("dQw4w9WgXcQ_en.json").is_file());
    }

    #[tokio::test]
    async fn test_invalid_input_never_touches_source() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        let err = cache.fetch_transcript("not a video", "en").await.unwrap_err();
        assert!(matches!(err, Error::InvalidVideoId(_)));
        assert_eq!(cache.source().calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_english_variant_fallback() {
        let (_tmp, cache) = cache(&["en-US", "fr"], FORMAT3);
        cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        // Cached under the requested language, not the track's
        assert!(cache.dir().join("dQw4w9WgXcQ_en.json").is_file());
    }

    #[tokio::test]
    async fn test_missing_language_lists_available() {
        let (_tmp, cache) = cache(&["en-US", "fr"], FORMAT3);
        let err = cache.fetch_transcript("dQw4w9WgXcQ", "de").await.unwrap_err();
        match err {
            Error::LanguageUnavailable { available, .. } => assert_eq!(available, vec!["en-US", "fr"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cache.source().calls(), (1, 0));
        assert_eq!(cache.index_len(), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_not_cached() {
        let (_tmp, cache) = cache(&["en"], "<transcript></transcript>");
        let err = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap_err();
        assert!(matches!(err, Error::EmptyTranscript { .. }));
        assert!(cache.transcript_path("dQw4w9WgXcQ", "en").is_none());
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let (_tmp, cache) = cache(&[], FORMAT3);
        let err = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap_err();
        assert!(matches!(err, Error::CaptionsDisabled { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_refetched() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.dir().join("dQw4w9WgXcQ_en.json"), "{ not json").unwrap();

        let segments = cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(cache.source().calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_transcript_path() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        assert!(cache.transcript_path("dQw4w9WgXcQ", "en").is_none());
        assert!(cache.transcript_path("garbage", "en").is_none());

        cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        cache.clear_index();

        let path = cache.transcript_path("https://youtu.be/dQw4w9WgXcQ", "en").unwrap();
        assert_eq!(path, cache.dir().join("dQw4w9WgXcQ_en.json"));
        assert_eq!(cache.index_len(), 1);
        assert!(cache.transcript_path("dQw4w9WgXcQ", "fr").is_none());
    }

    #[tokio::test]
    async fn test_rebuild_index_from_disk() {
        let (_tmp, cache) = cache(&["en", "fr"], FORMAT3);
        cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();
        cache.fetch_transcript("dQw4w9WgXcQ", "fr").await.unwrap();
        std::fs::write(cache.dir().join("notes.txt"), "ignored").unwrap();
        std::fs::write(cache.dir().join("bad.json"), "[]").unwrap();

        cache.clear_index();
        assert_eq!(cache.rebuild_index().unwrap(), 2);
        assert_eq!(cache.index_len(), 2);
    }

    #[test]
    fn test_rebuild_index_missing_dir() {
        let (_tmp, cache) = cache(&["en"], FORMAT3);
        assert_eq!(cache.rebuild_index().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_init_dir_is_idempotent_and_clears_index() {
        let (tmp, mut cache) = cache(&["en"], FORMAT3);
        cache.fetch_transcript("dQw4w9WgXcQ", "en").await.unwrap();

        let other = tmp.path().join("other");
        cache.init_dir(&other).unwrap();
        cache.init_dir(&other).unwrap();
        assert!(other.is_dir());
        assert_eq!(cache.dir(), other);
        assert_eq!(cache.index_len(), 0);
        assert!(cache.transcript_path("dQw4w9WgXcQ", "en").is_none());
    }
}
