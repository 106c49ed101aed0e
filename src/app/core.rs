use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::actions;
use crate::config::Config;
use crate::engine::{Action, BarProgress, Engine, Progress, StatsSnapshot};
use crate::files::collect_files;
use crate::http::{Fetcher, HttpFetcher};
use crate::lyrics;
use crate::tags::{LoftyStore, TagStore};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download lyrics and store them in every file found
    Tag {
        /// Replace lyrics already present in a file
        #[arg(short, long)]
        force: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove stored lyrics from every file found
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Edit stored lyrics with $EDITOR
    Edit {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print stored lyrics
    Show {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List files with and without lyrics
    Report {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Command {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Command::Tag { paths, .. }
            | Command::Remove { paths }
            | Command::Edit { paths }
            | Command::Show { paths }
            | Command::Report { paths } => paths,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Command::Tag { .. } => "Tagging",
            Command::Remove { .. } => "Removing",
            Command::Edit { .. } => "Editing",
            Command::Show { .. } => "Showing",
            Command::Report { .. } => "Reporting",
        }
    }

    /// Commands that print per file, or hand the terminal to an editor, run without a bar.
    fn draws_progress(&self) -> bool {
        matches!(self, Command::Tag { .. } | Command::Remove { .. })
    }
}

pub struct App {
    config: Arc<Config>,
}

impl App {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Run `command` over every file it names and return the run statistics.
    pub async fn run(&self, command: Command, progress: bool) -> Result<StatsSnapshot> {
        let files = collect_files(command.paths());
        let store: Arc<dyn TagStore> = Arc::new(LoftyStore);

        let mut threads = self.config.threads;
        let action: Arc<dyn Action> = match &command {
            Command::Tag { force, .. } => {
                let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&self.config.http)?);
                let manager = lyrics::setup_lyrics_manager(&self.config, fetcher);
                info!("Looking up lyrics with {:?}", manager.provider_names());
                Arc::new(actions::Tag::new(manager, store, *force))
            }
            Command::Remove { .. } => Arc::new(actions::Remove::new(store)),
            Command::Edit { .. } => {
                // one editor at a time
                threads = 1;
                Arc::new(actions::Edit::from_env(store))
            }
            Command::Show { .. } => Arc::new(actions::Show::new(store)),
            Command::Report { .. } => Arc::new(actions::Report::new(store)),
        };

        debug!("{} {} files", command.label(), files.len());
        let mut engine = Engine::new(threads);
        let mut bar = BarProgress::new(command.label());
        let progress: Option<&mut dyn Progress> = if progress && command.draws_progress() {
            Some(&mut bar)
        } else {
            None
        };

        Ok(engine.run(files, action, progress).await)
    }
}
