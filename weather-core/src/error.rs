use std::path::PathBuf;

use thiserror::Error;

/// Startup failures while loading configuration. The process cannot proceed on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not load config file: {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing required configuration key '{key}' in {}", path.display())]
    MissingKey { key: &'static str, path: PathBuf },
}

/// Errors surfaced by [`crate::WeatherApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid WeatherAPI URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to build HTTP client")]
    Builder(#[source] reqwest::Error),

    #[error("Failed to send request to WeatherAPI.com ({operation})")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read WeatherAPI {operation} response body")]
    Body {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse WeatherAPI response JSON: {snippet}")]
    Json {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}
