//! Audio tag access.
//!
//! Actions only see [`TagStore`] and [`TagHandle`]; [`LoftyStore`] is the
//! on-disk implementation used by the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use tracing::{debug, warn};

use crate::lyrics::TrackQuery;

/// The tags a lyrics lookup needs, plus the lyrics already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub lyrics: Option<String>,
}

impl TrackTags {
    /// Build from optional fields; any missing required field gives `None`.
    pub fn from_fields(
        path: &Path,
        artist: Option<String>,
        album: Option<String>,
        title: Option<String>,
        lyrics: Option<String>,
    ) -> Option<Self> {
        let mut missing = Vec::new();
        if artist.is_none() {
            missing.push("artist");
        }
        if album.is_none() {
            missing.push("album");
        }
        if title.is_none() {
            missing.push("title");
        }
        if !missing.is_empty() {
            warn!("Missing {} tag in {}", missing.join(", "), path.display());
            return None;
        }

        Some(Self {
            artist: artist.unwrap_or_default(),
            album: album.unwrap_or_default(),
            title: title.unwrap_or_default(),
            lyrics,
        })
    }

    pub fn query(&self) -> TrackQuery {
        TrackQuery::new(&self.artist, &self.title, &self.album)
    }
}

/// One opened audio file. Changes stay in memory until [`TagHandle::save`].
pub trait TagHandle: Send {
    /// Artist, album and title, or `None` when any of them is missing.
    fn tags(&self) -> Option<TrackTags>;

    /// Stored lyrics, independent of the other tags.
    fn lyrics(&self) -> Option<String>;

    fn write_lyrics(&mut self, text: &str) -> Result<()>;

    fn remove_lyrics(&mut self);

    fn save(&mut self) -> Result<()>;
}

pub trait TagStore: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn TagHandle>>;
}

/// Tag access through `lofty`.
///
/// Lyrics are kept under [`ItemKey::Lyrics`], which lofty maps to `USLT` in
/// ID3v2 and `LYRICS` in Vorbis comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyStore;

impl TagStore for LoftyStore {
    fn open(&self, path: &Path) -> Result<Box<dyn TagHandle>> {
        let file = Probe::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .read()
            .with_context(|| format!("Failed to read tags from {}", path.display()))?;

        Ok(Box::new(LoftyHandle {
            path: path.to_path_buf(),
            file,
        }))
    }
}

struct LoftyHandle {
    path: PathBuf,
    file: TaggedFile,
}

impl LoftyHandle {
    fn tag(&self) -> Option<&Tag> {
        self.file.primary_tag().or_else(|| self.file.first_tag())
    }

    fn tag_mut(&mut self) -> Option<&mut Tag> {
        if self.file.primary_tag().is_some() {
            self.file.primary_tag_mut()
        } else {
            self.file.first_tag_mut()
        }
    }
}

impl TagHandle for LoftyHandle {
    fn tags(&self) -> Option<TrackTags> {
        let Some(tag) = self.tag() else {
            warn!("No tags in {}", self.path.display());
            return None;
        };

        TrackTags::from_fields(
            &self.path,
            tag.artist().map(|s| s.to_string()),
            tag.album().map(|s| s.to_string()),
            tag.title().map(|s| s.to_string()),
            self.lyrics(),
        )
    }

    fn lyrics(&self) -> Option<String> {
        self.tag()?
            .get_string(&ItemKey::Lyrics)
            .map(str::to_string)
    }

    fn write_lyrics(&mut self, text: &str) -> Result<()> {
        if self.tag().is_none() {
            let tag_type = self.file.primary_tag_type();
            debug!("Creating {:?} tag in {}", tag_type, self.path.display());
            self.file.insert_tag(Tag::new(tag_type));
        }

        let path = self.path.display().to_string();
        let tag = self
            .tag_mut()
            .with_context(|| format!("No writable tag in {}", path))?;
        tag.insert_text(ItemKey::Lyrics, text.to_string());
        Ok(())
    }

    fn remove_lyrics(&mut self) {
        if let Some(tag) = self.tag_mut() {
            tag.remove_key(&ItemKey::Lyrics);
        }
    }

    fn save(&mut self) -> Result<()> {
        self.file
            .save_to_path(&self.path, WriteOptions::default())
            .with_context(|| format!("Failed to save {}", self.path.display()))
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct MemoryFile {
        pub artist: Option<String>,
        pub album: Option<String>,
        pub title: Option<String>,
        pub lyrics: Option<String>,
        pub saves: usize,
    }

    impl MemoryFile {
        pub fn tagged(artist: &str, title: &str, album: &str) -> Self {
            Self {
                artist: Some(artist.to_string()),
                album: Some(album.to_string()),
                title: Some(title.to_string()),
                ..Self::default()
            }
        }

        pub fn with_lyrics(mut self, lyrics: &str) -> Self {
            self.lyrics = Some(lyrics.to_string());
            self
        }
    }

    /// Tag store over a shared map; saved handles write back into it.
    #[derive(Default, Clone)]
    pub struct MemoryStore {
        files: Arc<Mutex<HashMap<PathBuf, MemoryFile>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, path: impl Into<PathBuf>, file: MemoryFile) {
            self.files.lock().unwrap().insert(path.into(), file);
        }

        pub fn get(&self, path: impl AsRef<Path>) -> MemoryFile {
            self.files.lock().unwrap()[path.as_ref()].clone()
        }
    }

    impl TagStore for MemoryStore {
        fn open(&self, path: &Path) -> Result<Box<dyn TagHandle>> {
            let file = self
                .files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("No such file: {}", path.display()))?;
            Ok(Box::new(MemoryHandle {
                path: path.to_path_buf(),
                file,
                files: self.files.clone(),
            }))
        }
    }

    struct MemoryHandle {
        path: PathBuf,
        file: MemoryFile,
        files: Arc<Mutex<HashMap<PathBuf, MemoryFile>>>,
    }

    impl TagHandle for MemoryHandle {
        fn tags(&self) -> Option<TrackTags> {
            TrackTags::from_fields(
                &self.path,
                self.file.artist.clone(),
                self.file.album.clone(),
                self.file.title.clone(),
                self.file.lyrics.clone(),
            )
        }

        fn lyrics(&self) -> Option<String> {
            self.file.lyrics.clone()
        }

        fn write_lyrics(&mut self, text: &str) -> Result<()> {
            self.file.lyrics = Some(text.to_string());
            Ok(())
        }

        fn remove_lyrics(&mut self) {
            self.file.lyrics = None;
        }

        fn save(&mut self) -> Result<()> {
            self.file.saves += 1;
            self.files
                .lock()
                .unwrap()
                .insert(self.path.clone(), self.file.clone());
            Ok(())
        }
    }
}
