use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions picked up when walking directories.
pub const AUDIO_EXTENSIONS: &[&str] = &["ogg", "flac", "mp3"];

/// Expand the command line paths into the files to process.
///
/// Directories are walked recursively and only audio files are kept. Files
/// given directly are taken as-is, whatever their extension.
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_audio_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if path.exists() {
            files.push(path.clone());
        } else {
            warn!("No such file or directory: {}", path.display());
        }
    }

    debug!("Collected {} files", files.len());
    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
