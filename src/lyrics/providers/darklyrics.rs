use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::DarkLyricsConfig;
use crate::error::FetchResult;
use crate::http::Fetcher;
use crate::lyrics::navigation::{resolve_album_link, resolve_artist_link};
use crate::lyrics::parser::parse_album_lyrics;
use crate::lyrics::{LyricsProvider, LyricsResult, SourceCache, TrackQuery};

/// darklyrics.com: search for the artist, follow the album link, cut the song
/// out of the album page.
///
/// Artist and album pages go through the shared [`SourceCache`], so a whole
/// album costs one search, one artist page and one album page per run.
pub struct DarkLyricsProvider {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    cache: Arc<SourceCache>,
}

impl DarkLyricsProvider {
    pub fn new(config: DarkLyricsConfig, fetcher: Arc<dyn Fetcher>, cache: Arc<SourceCache>) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn find_artist_page(&self, artist: &str) -> FetchResult<Option<String>> {
        let search_url = format!("{}/search", self.base_url);
        let Some(search_page) = self.fetcher.get(&search_url, &[("q", artist)]).await? else {
            return Ok(None);
        };

        let Some(link) = resolve_artist_link(&search_page) else {
            debug!("Darklyrics has no artist {}", artist);
            return Ok(None);
        };
        self.fetcher.get(&link, &[]).await
    }

    async fn find_album_page(&self, artist_page: &str, album: &str) -> FetchResult<Option<String>> {
        let Some(link) = resolve_album_link(artist_page, album, &self.base_url) else {
            debug!("Darklyrics has no album {}", album);
            return Ok(None);
        };
        self.fetcher.get(&link, &[]).await
    }
}

#[async_trait]
impl LyricsProvider for DarkLyricsProvider {
    fn name(&self) -> &str {
        "darklyrics"
    }

    async fn fetch(&self, query: &TrackQuery) -> FetchResult<LyricsResult> {
        if query.artist.is_empty() || query.album.is_empty() || query.song.is_empty() {
            debug!("Skipping darklyrics, incomplete tags: {}", query);
            return Ok(LyricsResult::Absent);
        }

        if !self.cache.has_artist(&query.artist) {
            debug!("Looking up darklyrics artist {}", query.artist);
        }
        let artist_page = self
            .cache
            .artist_page(&query.artist, || self.find_artist_page(&query.artist))
            .await?;
        let Some(artist_page) = artist_page else {
            return Ok(LyricsResult::Absent);
        };

        let album_page = self
            .cache
            .album_page(&query.artist, &query.album, || {
                self.find_album_page(&artist_page, &query.album)
            })
            .await?;
        let Some(album_page) = album_page else {
            return Ok(LyricsResult::Absent);
        };

        Ok(parse_album_lyrics(&album_page, &query.song))
    }
}
