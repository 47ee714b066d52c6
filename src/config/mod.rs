//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingSettings, IndexSettings, LlmSettings, LogFormat, LoggingConfig,
    WebSearchSettings,
};
