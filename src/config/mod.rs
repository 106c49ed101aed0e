mod loader;

pub use loader::{Config, DarkLyricsConfig, HttpConfig, SourcesConfig, WikiaConfig};
