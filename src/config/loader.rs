use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

const APP_NAME: &str = "lyricstagger";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Number of parallel workers used by the batch engine
    pub threads: usize,

    /// Enabled lyrics sources, in priority order
    pub lyrics_sources: Vec<String>,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Source specific settings
    pub sources: SourcesConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds; unset means requests never time out
    pub timeout_secs: Option<u64>,

    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SourcesConfig {
    pub wikia: Option<WikiaConfig>,
    pub darklyrics: Option<DarkLyricsConfig>,
}

/// lyrics.wikia.com settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WikiaConfig {
    /// Lookup endpoint answering `artist` / `song` queries
    pub api_url: String,
}

/// darklyrics.com settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DarkLyricsConfig {
    /// Site root; search, artist and album links are resolved against it
    pub base_url: String,
}

impl Default for WikiaConfig {
    fn default() -> Self {
        Self {
            api_url: "http://lyrics.wikia.com/api.php".to_string(),
        }
    }
}

impl Default for DarkLyricsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.darklyrics.com".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threads: 4,
            lyrics_sources: vec!["wikia".to_string(), "darklyrics".to_string()],
            http: HttpConfig::default(),
            sources: SourcesConfig {
                wikia: Some(WikiaConfig::default()),
                darklyrics: Some(DarkLyricsConfig::default()),
            },
        }
    }
}

impl Config {
    /// Load the configuration from `path` or the default location.
    ///
    /// A missing file is created with defaults. A file that fails to parse is
    /// reported and replaced by defaults for this run.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(default_config_path);

        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            debug!("Config file {:?} does not exist, writing defaults", config_path);
            let default_config = Config::default();
            let toml = toml::to_string_pretty(&default_config)?;

            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, toml)?;
            info!("Created default config file: {:?}", config_path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config = Self::from_toml(&content).unwrap_or_else(|e| {
            error!("Failed to parse config file {:?}: {}", config_path, e);
            warn!("Falling back to default config");
            Config::default()
        });

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        if config.threads == 0 {
            warn!("threads = 0 is not usable, running with 1 worker");
            config.threads = 1;
        }
        Ok(config)
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME).join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(format!("{}-config.toml", APP_NAME)))
}
