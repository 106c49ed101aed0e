use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::WikiaConfig;
use crate::error::FetchResult;
use crate::http::Fetcher;
use crate::lyrics::parser::parse_lyricbox;
use crate::lyrics::{LyricsProvider, LyricsResult, TrackQuery};

/// The lookup api answers with a javascript object literal, not json.
static PAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'url':'([^']+)'").expect("page url pattern is valid"));

/// Page urls containing this point at the "create this page" editor.
const EDIT_MARKER: &str = "action=edit";

/// Where the gracenote segment is spliced in: the first `/` after this offset.
const GRACENOTE_SPLIT: usize = 9;

/// lyrics.wikia.com: api lookup for the page url, then the lyrics page itself
pub struct WikiaProvider {
    fetcher: Arc<dyn Fetcher>,
    api_url: String,
}

impl WikiaProvider {
    pub fn new(config: WikiaConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            api_url: config.api_url,
        }
    }

    /// Page html and whether it came from the gracenote rendering.
    async fn get_raw_page(&self, artist: &str, song: &str) -> FetchResult<Option<(String, bool)>> {
        let query = [
            ("action", "lyrics"),
            ("artist", artist),
            ("song", song),
            ("fmt", "json"),
        ];
        let Some(body) = self.fetcher.get(&self.api_url, &query).await? else {
            return Ok(None);
        };

        let Some(page_url) = PAGE_URL.captures(&body).map(|c| c[1].to_string()) else {
            debug!("No page url in wikia answer for {} - {}", artist, song);
            return Ok(None);
        };
        if page_url.contains(EDIT_MARKER) {
            debug!("Wikia has no page for {} - {}", artist, song);
            return Ok(None);
        }

        debug!("Fetching wikia page {}", page_url);
        if let Some(page) = self.fetcher.get(&page_url, &[]).await? {
            return Ok(Some((page, false)));
        }

        // some songs only exist in the gracenote rendering
        let fallback = gracenote_url(&page_url);
        debug!("Fetching wikia gracenote page {}", fallback);
        Ok(self
            .fetcher
            .get(&fallback, &[])
            .await?
            .map(|page| (page, true)))
    }
}

/// Insert `Gracenote:` after the first `/` past the 9th character of `url`.
///
/// With a `http://` url this lands right after the host. Urls too short to
/// split are returned unchanged.
pub fn gracenote_url(url: &str) -> String {
    let Some((split, _)) = url.char_indices().nth(GRACENOTE_SPLIT) else {
        return url.to_string();
    };
    let (head, tail) = url.split_at(split);
    format!("{}{}", head, tail.replacen('/', "/Gracenote:", 1))
}

#[async_trait]
impl LyricsProvider for WikiaProvider {
    fn name(&self) -> &str {
        "wikia"
    }

    async fn fetch(&self, query: &TrackQuery) -> FetchResult<LyricsResult> {
        // the lookup api needs both
        if query.artist.is_empty() || query.song.is_empty() {
            debug!("Skipping wikia, artist or song is empty: {}", query);
            return Ok(LyricsResult::Absent);
        }

        match self.get_raw_page(&query.artist, &query.song).await? {
            Some((page, gracenote)) => Ok(parse_lyricbox(&page, gracenote)),
            None => Ok(LyricsResult::Absent),
        }
    }
}
