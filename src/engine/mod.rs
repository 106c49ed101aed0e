//! Bounded worker pool driving one action over a list of files.

mod progress;
mod stats;

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

pub use progress::{BarProgress, Progress};
pub use stats::{RunStatistics, StatsSnapshot};

/// Work done for a single file.
///
/// Implementations record their outcome in `stats`; the engine itself only
/// counts `processed`.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, path: &Path, stats: &RunStatistics) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Enqueuing,
    Running,
    Draining,
    Done,
}

type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<PathBuf>>>;

/// Runs an [`Action`] over many files with a fixed number of workers.
///
/// Every file is handed to exactly one worker. A failing or panicking action
/// still counts its file as completed, so a run always drains.
pub struct Engine {
    threads: usize,
    state: EngineState,
}

impl Engine {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Process `files` and return the statistics of this run alone.
    ///
    /// With `progress` set, `item_done` is called once per completed file from
    /// the calling task.
    pub async fn run(
        &mut self,
        files: Vec<PathBuf>,
        action: Arc<dyn Action>,
        mut progress: Option<&mut dyn Progress>,
    ) -> StatsSnapshot {
        let stats = Arc::new(RunStatistics::new());
        if files.is_empty() {
            debug!("Nothing to process");
            self.state = EngineState::Done;
            return stats.snapshot();
        }

        let total = files.len();
        self.state = EngineState::Enqueuing;
        debug!("Processing {} files with {} workers", total, self.threads);

        let (work_tx, work_rx) = mpsc::unbounded_channel::<PathBuf>();
        let queue: WorkQueue = Arc::new(Mutex::new(work_rx));
        let (done_tx, mut done_rx) = if progress.is_some() {
            let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let workers: Vec<_> = (0..self.threads)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    queue.clone(),
                    action.clone(),
                    stats.clone(),
                    done_tx.clone(),
                ))
            })
            .collect();
        // only the workers may keep the results channel open
        drop(done_tx);

        for path in files {
            if work_tx.send(path).is_err() {
                error!("All workers stopped before the queue was filled");
                break;
            }
        }
        drop(work_tx);
        self.state = EngineState::Running;

        if let Some(progress) = progress.as_deref_mut() {
            progress.begin(total);
            if let Some(done_rx) = done_rx.as_mut() {
                while let Some(path) = done_rx.recv().await {
                    progress.item_done(&path);
                }
            }
        }

        self.state = EngineState::Draining;
        for handle in workers {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }

        if let Some(progress) = progress {
            progress.finish();
        }
        self.state = EngineState::Done;

        let snapshot = stats.snapshot();
        debug!("Run finished: {}", snapshot);
        snapshot
    }
}

async fn worker(
    id: usize,
    queue: WorkQueue,
    action: Arc<dyn Action>,
    stats: Arc<RunStatistics>,
    done: Option<mpsc::UnboundedSender<PathBuf>>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(path) = next else {
            break;
        };

        stats.log_processing(&path);
        match AssertUnwindSafe(action.run(&path, &stats)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to process {}: {:#}", path.display(), e),
            Err(_) => error!("Action panicked while processing {}", path.display()),
        }

        if let Some(done) = &done {
            // the receiver only goes away when nobody is watching progress
            let _ = done.send(path);
        }
    }
    debug!("Worker {} finished", id);
}
