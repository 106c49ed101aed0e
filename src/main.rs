use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lyricstagger::app::{App, Command};
use lyricstagger::config::Config;

#[derive(Parser, Debug)]
#[command(name = "lyricstagger", version, about = "Download lyrics for music files and store them in their tags")]
struct Cli {
    /// Config file (default: <config dir>/lyricstagger/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    threads: Option<usize>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_logging() {
    // RUST_LOG wins; DEBUG=1 is a shortcut for debug output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if std::env::var_os("DEBUG").is_some() {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config)?;
    if let Some(threads) = cli.threads {
        config.threads = threads.max(1);
    }
    debug!("Running with {:?}", config);

    let app = App::new(Arc::new(config));
    let stats = app.run(cli.command, !cli.no_progress).await?;
    println!("{}", stats);

    Ok(())
}
