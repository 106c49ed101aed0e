mod darklyrics;
mod wikia;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::Fetcher;
use crate::lyrics::{LyricsProvider, SourceCache};

pub use darklyrics::DarkLyricsProvider;
pub use wikia::{gracenote_url, WikiaProvider};

/// Build the providers named in `lyrics_sources`, in that order.
pub fn get_enabled_providers(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<SourceCache>,
) -> Vec<Arc<dyn LyricsProvider>> {
    let mut providers: Vec<Arc<dyn LyricsProvider>> = Vec::new();

    debug!("Loading lyrics providers, configured sources: {:?}", config.lyrics_sources);

    for source in &config.lyrics_sources {
        match source.as_str() {
            "wikia" => {
                if let Some(wikia_config) = &config.sources.wikia {
                    info!("Enabling wikia lyrics source: {}", wikia_config.api_url);
                    providers.push(Arc::new(WikiaProvider::new(
                        wikia_config.clone(),
                        fetcher.clone(),
                    )) as Arc<dyn LyricsProvider>);
                } else {
                    warn!("Wikia lyrics source enabled but not configured");
                }
            }
            "darklyrics" => {
                if let Some(darklyrics_config) = &config.sources.darklyrics {
                    info!("Enabling darklyrics lyrics source: {}", darklyrics_config.base_url);
                    providers.push(Arc::new(DarkLyricsProvider::new(
                        darklyrics_config.clone(),
                        fetcher.clone(),
                        cache.clone(),
                    )) as Arc<dyn LyricsProvider>);
                } else {
                    warn!("Darklyrics lyrics source enabled but not configured");
                }
            }
            _ => {
                warn!("Unknown lyrics source: {}", source);
            }
        }
    }

    info!("Loaded {} lyrics providers", providers.len());
    for (i, provider) in providers.iter().enumerate() {
        debug!("Lyrics provider #{}: {}", i + 1, provider.name());
    }

    providers
}
