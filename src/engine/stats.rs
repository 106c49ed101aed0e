use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Counters shared by every worker of one run. They only ever go up.
#[derive(Debug, Default)]
pub struct RunStatistics {
    processed: AtomicU64,
    written: AtomicU64,
    removed: AtomicU64,
    not_found: AtomicU64,
    not_saved: AtomicU64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_processing(&self, path: &Path) {
        debug!("Processing audio file {}", path.display());
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_writing(&self, path: &Path) {
        debug!("Writing lyrics to {}", path.display());
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_removing(&self, path: &Path) {
        debug!("Removing lyrics from {}", path.display());
        self.removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_not_found(&self, path: &Path) {
        debug!("No lyrics found for {}", path.display());
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_not_saved(&self, path: &Path) {
        debug!("No lyrics saved for edited file {}", path.display());
        self.not_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            not_saved: self.not_saved.load(Ordering::Relaxed),
        }
    }
}

/// Read-only copy of the counters, taken once the run is over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub written: u64,
    pub removed: u64,
    pub not_found: u64,
    pub not_saved: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary - processed: {} written: {} removed: {} not_found: {} not_saved: {}",
            self.processed, self.written, self.removed, self.not_found, self.not_saved
        )
    }
}
