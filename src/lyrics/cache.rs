use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::error::FetchResult;

/// State of one cached page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// Never looked up in this run
    Unresolved,
    /// Looked up, the site has no page for this key
    Missing,
    Page(Arc<str>),
}

type Slot = Arc<OnceCell<Option<Arc<str>>>>;

#[derive(Default)]
struct ArtistSlot {
    page: OnceCell<Option<Arc<str>>>,
    albums: Mutex<HashMap<String, Slot>>,
}

/// Artist and album pages fetched during one run, shared by every worker.
///
/// Every key is written at most once. Lookups through [`SourceCache::artist_page`]
/// and [`SourceCache::album_page`] hold a per-key slot while resolving, so workers
/// asking for the same artist or album wait for the first one instead of
/// fetching again. Unrelated keys resolve in parallel.
#[derive(Default)]
pub struct SourceCache {
    artists: Mutex<HashMap<String, Arc<ArtistSlot>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `artist` has been resolved, to a page or to missing.
    ///
    /// Never waits on a lookup in flight.
    pub fn has_artist(&self, artist: &str) -> bool {
        self.artist_entry(artist) != CacheEntry::Unresolved
    }

    pub fn artist_entry(&self, artist: &str) -> CacheEntry {
        match self.existing_artist(artist) {
            Some(slot) => entry_of(&slot.page),
            None => CacheEntry::Unresolved,
        }
    }

    /// Record the artist page, or `None` for an artist the site does not have.
    ///
    /// Seeds the cache without a resolver; [`SourceCache::artist_page`] then
    /// returns this value.
    ///
    /// Returns `false` when the artist was already resolved; the earlier value stays.
    pub fn set_artist_page(&self, artist: &str, page: Option<String>) -> bool {
        self.artist_slot(artist)
            .page
            .set(page.map(Arc::from))
            .is_ok()
    }

    pub fn album_entry(&self, artist: &str, album: &str) -> CacheEntry {
        let Some(artist_slot) = self.existing_artist(artist) else {
            return CacheEntry::Unresolved;
        };
        let albums = lock(&artist_slot.albums);
        match albums.get(album) {
            Some(slot) => entry_of(slot),
            None => CacheEntry::Unresolved,
        }
    }

    /// Record the album page of `artist`, or `None` for a missing album.
    ///
    /// Returns `false` when the album was already resolved; the earlier value stays.
    pub fn set_album_page(&self, artist: &str, album: &str, page: Option<String>) -> bool {
        self.album_slot(artist, album)
            .set(page.map(Arc::from))
            .is_ok()
    }

    /// Cached artist page, resolving it with `resolve` on first use.
    ///
    /// A resolver error leaves the key unresolved so a later lookup retries it.
    pub async fn artist_page<F, Fut>(&self, artist: &str, resolve: F) -> FetchResult<Option<Arc<str>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Option<String>>>,
    {
        let slot = self.artist_slot(artist);
        let page = slot
            .page
            .get_or_try_init(|| async move { resolve().await.map(|page| page.map(Arc::from)) })
            .await?;
        Ok(page.clone())
    }

    /// Cached album page of `artist`, resolving it with `resolve` on first use.
    pub async fn album_page<F, Fut>(
        &self,
        artist: &str,
        album: &str,
        resolve: F,
    ) -> FetchResult<Option<Arc<str>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Option<String>>>,
    {
        let slot = self.album_slot(artist, album);
        let page = slot
            .get_or_try_init(|| async move { resolve().await.map(|page| page.map(Arc::from)) })
            .await?;
        Ok(page.clone())
    }

    fn existing_artist(&self, artist: &str) -> Option<Arc<ArtistSlot>> {
        lock(&self.artists).get(artist).cloned()
    }

    fn artist_slot(&self, artist: &str) -> Arc<ArtistSlot> {
        lock(&self.artists)
            .entry(artist.to_string())
            .or_default()
            .clone()
    }

    fn album_slot(&self, artist: &str, album: &str) -> Slot {
        let artist_slot = self.artist_slot(artist);
        let mut albums = lock(&artist_slot.albums);
        albums.entry(album.to_string()).or_default().clone()
    }
}

fn entry_of(cell: &OnceCell<Option<Arc<str>>>) -> CacheEntry {
    match cell.get() {
        None => CacheEntry::Unresolved,
        Some(None) => CacheEntry::Missing,
        Some(Some(page)) => CacheEntry::Page(page.clone()),
    }
}

// The maps are only touched for slot lookup, never across an await, so a
// poisoned lock still holds consistent data.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
