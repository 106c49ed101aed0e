// Lyrics tagger library

pub mod actions;
pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod http;
pub mod lyrics;
pub mod tags;
pub mod utils;
