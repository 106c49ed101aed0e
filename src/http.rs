use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{FetchError, FetchResult};

/// Minimal GET interface the providers are written against.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` with the given query parameters.
    ///
    /// Returns `Ok(None)` for every non-2xx response. Only transport failures are
    /// reported as errors.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> FetchResult<Option<String>>;
}

/// `reqwest` backed fetcher used by the binary.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> FetchResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        // No timeout unless configured: a hung request only stalls its own worker.
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> FetchResult<Option<String>> {
        debug!("Fetching {} {:?}", url, query);

        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::InvalidUrl {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    FetchError::connection(url, e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            debug!("Got HTTP {} for {}", status, url);
            return Ok(None);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::connection(url, e))?;
        Ok(Some(body))
    }
}
