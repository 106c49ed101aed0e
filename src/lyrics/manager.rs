use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::lyrics::{LyricsProvider, LyricsResult, TrackQuery};

/// Tries the configured providers in priority order.
#[derive(Clone)]
pub struct LyricsManager {
    providers: Arc<Vec<Arc<dyn LyricsProvider>>>,
}

impl LyricsManager {
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self {
            providers: Arc::new(providers),
        }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First found result across all providers, or `Absent`.
    ///
    /// A provider that fails to connect is skipped; the lookup goes on with the next one.
    pub async fn fetch(&self, query: &TrackQuery) -> LyricsResult {
        for provider in self.providers.iter() {
            debug!("Trying {} for {}", provider.name(), query);
            match provider.fetch(query).await {
                Ok(result) if result.is_found() => {
                    info!("Found lyrics for {} on {}", query, provider.name());
                    return result;
                }
                Ok(_) => {
                    debug!("{} has no lyrics for {}", provider.name(), query);
                }
                Err(e) if e.is_connection() => {
                    warn!("{} unreachable for {}: {}", provider.name(), query, e);
                }
                Err(e) => {
                    error!("{} failed for {}: {}", provider.name(), query, e);
                }
            }
        }

        debug!("No provider has lyrics for {}", query);
        LyricsResult::Absent
    }
}
