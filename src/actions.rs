//! Per-file actions run by the batch engine.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::engine::{Action, RunStatistics};
use crate::lyrics::LyricsManager;
use crate::tags::{TagHandle, TagStore, TrackTags};

/// Download lyrics for files that have none (or for every file with `overwrite`).
pub struct Tag {
    manager: LyricsManager,
    store: Arc<dyn TagStore>,
    overwrite: bool,
}

impl Tag {
    pub fn new(manager: LyricsManager, store: Arc<dyn TagStore>, overwrite: bool) -> Self {
        Self {
            manager,
            store,
            overwrite,
        }
    }
}

#[async_trait]
impl Action for Tag {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> Result<()> {
        let mut handle = open_tags(&self.store, path).await?;
        // no lookup without artist, album and title
        let Some(tags) = handle.tags() else {
            return Ok(());
        };
        if tags.lyrics.is_some() && !self.overwrite {
            debug!("{} already has lyrics", path.display());
            return Ok(());
        }

        match self.manager.fetch(&tags.query()).await.into_tag_text() {
            Some(text) => {
                stats.log_writing(path);
                handle.write_lyrics(&text)?;
                save_tags(handle).await?;
            }
            None => stats.log_not_found(path),
        }
        Ok(())
    }
}

pub struct Remove {
    store: Arc<dyn TagStore>,
}

impl Remove {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for Remove {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> Result<()> {
        let mut handle = open_tags(&self.store, path).await?;
        stats.log_removing(path);
        handle.remove_lyrics();
        save_tags(handle).await
    }
}

/// Edit stored lyrics in an external editor.
///
/// The editor runs on a blocking thread and owns the terminal while it is open,
/// so this action should run with a single worker.
pub struct Edit {
    store: Arc<dyn TagStore>,
    editor: String,
}

impl Edit {
    /// `editor` is a command line; the file to edit is appended as the last argument.
    pub fn new(store: Arc<dyn TagStore>, editor: impl Into<String>) -> Self {
        Self {
            store,
            editor: editor.into(),
        }
    }

    /// Editor from `$EDITOR`, falling back to `vi`.
    pub fn from_env(store: Arc<dyn TagStore>) -> Self {
        let editor = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string());
        Self::new(store, editor)
    }
}

#[async_trait]
impl Action for Edit {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> Result<()> {
        let mut handle = open_tags(&self.store, path).await?;
        let Some(tags) = handle.tags() else {
            stats.log_not_saved(path);
            return Ok(());
        };

        let editor = self.editor.clone();
        let old = tags.lyrics.unwrap_or_default();
        let edited = tokio::task::spawn_blocking(move || edit_text(&editor, &old)).await??;

        match edited {
            Some(text) => {
                stats.log_writing(path);
                handle.write_lyrics(&text)?;
                save_tags(handle).await?;
            }
            None => stats.log_not_saved(path),
        }
        Ok(())
    }
}

/// Open `old` in `editor` through a temporary file.
///
/// Returns `None` when the text comes back unchanged or empty.
fn edit_text(editor: &str, old: &str) -> Result<Option<String>> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("No editor configured");
    };

    // removed again when `file` is dropped
    let mut file = tempfile::Builder::new()
        .prefix("lyricstagger-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create a scratch file for the editor")?;
    file.write_all(old.as_bytes())
        .and_then(|()| file.flush())
        .with_context(|| format!("Failed to write {}", file.path().display()))?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to start editor {}", editor))?;
    if !status.success() {
        bail!("Editor {} exited with {}", editor, status);
    }
    // editors may replace the file instead of rewriting it, so read by path
    let text = fs::read_to_string(file.path())
        .with_context(|| format!("Failed to read back {}", file.path().display()))?;

    let text = text.trim_end_matches('\n');
    if text == old.trim_end_matches('\n') || text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(text.to_string()))
}

/// Open tags on the blocking pool; lofty reads the file from disk.
async fn open_tags(store: &Arc<dyn TagStore>, path: &Path) -> Result<Box<dyn TagHandle>> {
    let store = store.clone();
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || store.open(&path)).await?
}

/// Save on the blocking pool; FLAC and Ogg saves rewrite the file.
async fn save_tags(mut handle: Box<dyn TagHandle>) -> Result<()> {
    tokio::task::spawn_blocking(move || handle.save()).await?
}

/// Print the stored lyrics.
pub struct Show {
    store: Arc<dyn TagStore>,
}

impl Show {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for Show {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> Result<()> {
        let handle = open_tags(&self.store, path).await?;
        match handle.tags().filter(|tags| tags.lyrics.is_some()) {
            Some(tags) => println!("{}", show_block(path, &tags)),
            None => {
                stats.log_not_found(path);
                println!("No lyrics in file '{}'", path.display());
            }
        }
        Ok(())
    }
}

fn show_block(path: &Path, tags: &TrackTags) -> String {
    format!(
        "{}\nArtist: {}, Title: {}\n\n{}\n",
        path.display(),
        tags.artist,
        tags.title,
        tags.lyrics.as_deref().unwrap_or_default()
    )
}

/// One line per file telling whether it has lyrics.
pub struct Report {
    store: Arc<dyn TagStore>,
}

impl Report {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Action for Report {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> Result<()> {
        let handle = open_tags(&self.store, path).await?;
        let has_lyrics = handle.lyrics().is_some();
        if !has_lyrics {
            stats.log_not_found(path);
        }
        println!("{}", report_line(path, has_lyrics));
        Ok(())
    }
}

fn report_line(path: &Path, has_lyrics: bool) -> String {
    let label = if has_lyrics { "lyrics found:" } else { "no lyrics:" };
    format!("{:<14}{}", label, path.display())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::engine::Engine;
    use crate::error::FetchResult;
    use crate::lyrics::{LyricsProvider, LyricsResult, TrackQuery};
    use crate::tags::memory::{MemoryFile, MemoryStore};

    /// Knows lyrics for exactly one song title.
    struct OneSong {
        title: &'static str,
        result: LyricsResult,
    }

    #[async_trait]
    impl LyricsProvider for OneSong {
        fn name(&self) -> &str {
            "one-song"
        }

        async fn fetch(&self, query: &TrackQuery) -> FetchResult<LyricsResult> {
            if query.song == self.title {
                Ok(self.result.clone())
            } else {
                Ok(LyricsResult::Absent)
            }
        }
    }

    fn manager(title: &'static str, result: LyricsResult) -> LyricsManager {
        LyricsManager::new(vec![Arc::new(OneSong { title, result }) as Arc<dyn LyricsProvider>])
    }

    fn library() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("tyrants.ogg", MemoryFile::tagged("Immortal", "Tyrants", "Sons Of Northern Darkness"));
        store.insert("unknown.ogg", MemoryFile::tagged("Immortal", "Unknown", "Sons Of Northern Darkness"));
        store.insert(
            "tagged.ogg",
            MemoryFile::tagged("Immortal", "Tyrants", "Sons Of Northern Darkness").with_lyrics("Old lyrics"),
        );
        store.insert(
            "untagged.ogg",
            MemoryFile {
                title: Some("Tyrants".to_string()),
                ..MemoryFile::default()
            },
        );
        store
    }

    #[tokio::test]
    async fn test_tag_writes_found_lyrics() {
        let store = library();
        let tag = Tag::new(
            manager("Tyrants", LyricsResult::Text("New lyrics".into())),
            Arc::new(store.clone()),
            false,
        );
        let stats = RunStatistics::new();

        for path in ["tyrants.ogg", "unknown.ogg", "tagged.ogg", "untagged.ogg"] {
            tag.run(Path::new(path), &stats).await.unwrap();
        }

        assert_eq!(store.get("tyrants.ogg").lyrics.as_deref(), Some("New lyrics"));
        assert_eq!(store.get("unknown.ogg").lyrics, None);
        assert_eq!(store.get("tagged.ogg").lyrics.as_deref(), Some("Old lyrics"));
        assert_eq!(store.get("untagged.ogg").saves, 0);
        let stats = stats.snapshot();
        assert_eq!(stats.written, 1);
        assert_eq!(stats.not_found, 1);
    }

    #[tokio::test]
    async fn test_tag_force_overwrites() {
        let store = library();
        let tag = Tag::new(
            manager("Tyrants", LyricsResult::Text("New lyrics".into())),
            Arc::new(store.clone()),
            true,
        );
        let stats = RunStatistics::new();

        tag.run(Path::new("tagged.ogg"), &stats).await.unwrap();

        assert_eq!(store.get("tagged.ogg").lyrics.as_deref(), Some("New lyrics"));
        assert_eq!(stats.snapshot().written, 1);
    }

    #[tokio::test]
    async fn test_tag_writes_instrumental_marker() {
        let store = library();
        let tag = Tag::new(manager("Tyrants", LyricsResult::Instrumental), Arc::new(store.clone()), false);

        tag.run(Path::new("tyrants.ogg"), &RunStatistics::new()).await.unwrap();

        assert_eq!(store.get("tyrants.ogg").lyrics.as_deref(), Some("{{Instrumental}}"));
    }

    #[tokio::test]
    async fn test_tag_missing_file_is_an_error() {
        let tag = Tag::new(manager("Tyrants", LyricsResult::Absent), Arc::new(library()), false);
        assert!(tag.run(Path::new("nowhere.ogg"), &RunStatistics::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_engine_run_with_tag_action() {
        let store = library();
        let tag = Tag::new(
            manager("Tyrants", LyricsResult::Text("New lyrics".into())),
            Arc::new(store.clone()),
            false,
        );
        let files = ["tyrants.ogg", "unknown.ogg", "tagged.ogg", "untagged.ogg", "nowhere.ogg"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let stats = Engine::new(3).run(files, Arc::new(tag), None).await;

        assert_eq!(stats.processed, 5);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.not_found, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = library();
        let stats = RunStatistics::new();

        Remove::new(Arc::new(store.clone()))
            .run(Path::new("tagged.ogg"), &stats)
            .await
            .unwrap();

        let file = store.get("tagged.ogg");
        assert_eq!(file.lyrics, None);
        assert_eq!(file.saves, 1);
        assert_eq!(stats.snapshot().removed, 1);
    }

    /// Store whose `open` blocks its thread until the test lets it through.
    struct GatedStore {
        inner: MemoryStore,
        opened: Arc<AtomicBool>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl TagStore for GatedStore {
        fn open(&self, path: &Path) -> Result<Box<dyn TagHandle>> {
            self.opened.store(true, Ordering::SeqCst);
            self.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .map_err(|_| anyhow::anyhow!("open blocked the runtime thread"))?;
            self.inner.open(path)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_tag_io_leaves_runtime_thread_free() {
        let store = library();
        let opened = Arc::new(AtomicBool::new(false));
        let (release, gate) = mpsc::channel();
        let gated = GatedStore {
            inner: store.clone(),
            opened: opened.clone(),
            release: Mutex::new(gate),
        };
        let remove = Remove::new(Arc::new(gated));
        let stats = RunStatistics::new();

        // the releasing task only gets polled if `open` is off the runtime thread
        let (result, ()) = tokio::join!(remove.run(Path::new("tagged.ogg"), &stats), async {
            while !opened.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
            release.send(()).unwrap();
        });

        result.unwrap();
        assert_eq!(store.get("tagged.ogg").lyrics, None);
    }

    #[tokio::test]
    async fn test_report_and_show_count_missing_lyrics() {
        let store: Arc<dyn TagStore> = Arc::new(library());
        let report_stats = RunStatistics::new();
        let show_stats = RunStatistics::new();

        for path in ["tyrants.ogg", "tagged.ogg", "untagged.ogg"] {
            Report::new(store.clone())
                .run(Path::new(path), &report_stats)
                .await
                .unwrap();
            Show::new(store.clone())
                .run(Path::new(path), &show_stats)
                .await
                .unwrap();
        }

        assert_eq!(report_stats.snapshot().not_found, 2);
        assert_eq!(show_stats.snapshot().not_found, 2);
    }

    #[test]
    fn test_output_lines() {
        assert_eq!(report_line(Path::new("a.ogg"), true), "lyrics found: a.ogg");
        assert_eq!(report_line(Path::new("a.ogg"), false), "no lyrics:    a.ogg");

        let tags = TrackTags {
            artist: "Immortal".into(),
            album: "Sons Of Northern Darkness".into(),
            title: "Tyrants".into(),
            lyrics: Some("Some lyrics".into()),
        };
        assert_eq!(
            show_block(Path::new("a.ogg"), &tags),
            "a.ogg\nArtist: Immortal, Title: Tyrants\n\nSome lyrics\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_edit_unchanged_is_not_saved() {
        let store = library();
        let stats = RunStatistics::new();

        Edit::new(Arc::new(store.clone()), "true")
            .run(Path::new("tagged.ogg"), &stats)
            .await
            .unwrap();
        Edit::new(Arc::new(store.clone()), "true")
            .run(Path::new("untagged.ogg"), &stats)
            .await
            .unwrap();

        assert_eq!(store.get("tagged.ogg").saves, 0);
        assert_eq!(stats.snapshot().not_saved, 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_edit_writes_changed_text() {
        let store = library();
        let stats = RunStatistics::new();
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("editor.sh");
        fs::write(&script, "printf 'Edited lyrics\\n' > \"$1\"\n").unwrap();

        Edit::new(Arc::new(store.clone()), format!("sh {}", script.display()))
            .run(Path::new("tagged.ogg"), &stats)
            .await
            .unwrap();

        assert_eq!(store.get("tagged.ogg").lyrics.as_deref(), Some("Edited lyrics"));
        assert_eq!(stats.snapshot().written, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_scratch_file_is_fresh_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("editor.sh");
        let seen = dir.path().join("seen.txt");
        fs::write(
            &script,
            format!("echo \"$1\" >> {}\nprintf 'New' > \"$1\"\n", seen.display()),
        )
        .unwrap();
        let editor = format!("sh {}", script.display());

        assert_eq!(edit_text(&editor, "Old").unwrap().as_deref(), Some("New"));
        assert_eq!(edit_text(&editor, "Old").unwrap().as_deref(), Some("New"));

        let seen = fs::read_to_string(&seen).unwrap();
        let paths: Vec<&Path> = seen.lines().map(Path::new).collect();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
        for path in paths {
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("lyricstagger-") && name.ends_with(".txt"), "{}", name);
            assert!(!path.exists(), "{} left behind", path.display());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_is_an_error() {
        assert!(edit_text("false", "Some lyrics").is_err());
        assert!(edit_text("", "Some lyrics").is_err());
    }
}
