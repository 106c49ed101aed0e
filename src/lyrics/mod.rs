mod cache;
mod manager;
pub mod navigation;
pub mod parser;
pub mod providers;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::FetchResult;
use crate::http::Fetcher;

pub use cache::{CacheEntry, SourceCache};
pub use manager::LyricsManager;

/// Text written to a file whose track is known to have no lyrics.
pub const INSTRUMENTAL_TEXT: &str = "{{Instrumental}}";

/// What to look lyrics up for, built from one file's tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub artist: String,
    pub song: String,
    pub album: String,
}

impl TrackQuery {
    pub fn new(artist: impl Into<String>, song: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            song: song.into(),
            album: album.into(),
        }
    }
}

impl fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.song, self.album)
    }
}

/// Outcome of a lyrics lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsResult {
    Text(String),
    /// The source states the track has no lyrics. Counts as found.
    Instrumental,
    Absent,
}

impl LyricsResult {
    /// Trimmed `text`, or `Absent` when nothing is left.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim();
        if text.is_empty() {
            LyricsResult::Absent
        } else {
            LyricsResult::Text(text.to_string())
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, LyricsResult::Absent)
    }

    /// The text to store in the file's lyrics tag.
    pub fn into_tag_text(self) -> Option<String> {
        match self {
            LyricsResult::Text(text) => Some(text),
            LyricsResult::Instrumental => Some(INSTRUMENTAL_TEXT.to_string()),
            LyricsResult::Absent => None,
        }
    }
}

/// A lyrics source.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Look up lyrics for `query`.
    ///
    /// Missing pages and unusable queries give `Ok(LyricsResult::Absent)`; only
    /// transport failures are errors.
    async fn fetch(&self, query: &TrackQuery) -> FetchResult<LyricsResult>;
}

/// Build the lyrics manager for one run.
///
/// All providers share `fetcher` and a fresh page cache.
pub fn setup_lyrics_manager(config: &Config, fetcher: Arc<dyn Fetcher>) -> LyricsManager {
    let cache = Arc::new(SourceCache::new());
    let providers = providers::get_enabled_providers(config, fetcher, cache);
    LyricsManager::new(providers)
}
