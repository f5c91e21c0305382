use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

pub const API_KEY: &str = "weather.api.key";
pub const BASE_URL: &str = "weather.api.base.url";
pub const CURRENT_ENDPOINT: &str = "weather.api.current.endpoint";
pub const FORECAST_ENDPOINT: &str = "weather.api.forecast.endpoint";

/// Default location of the key-value source, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.properties";

const REQUIRED_KEYS: [&str; 4] = [API_KEY, BASE_URL, CURRENT_ENDPOINT, FORECAST_ENDPOINT];

/// On-disk formats understood by [`Config::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Java-style `key=value` lines.
    Properties,
    /// TOML; nested tables are flattened into dotted keys.
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Properties,
        }
    }
}

/// Immutable key/value configuration for the WeatherAPI.com client.
///
/// Built once at process start and handed to whoever needs it. The four
/// required keys are checked at construction, so the typed accessors never fail.
#[derive(Debug, Clone)]
pub struct Config {
    source: PathBuf,
    values: BTreeMap<String, String>,
}

impl Config {
    /// Load the configuration from `path`, choosing the parser from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let values = parse(ConfigFormat::from_path(path), &contents).map_err(|message| {
            ConfigError::Parse { path: path.to_path_buf(), message }
        })?;

        let config = Self::from_map(values, path)?;
        tracing::debug!(path = %path.display(), keys = config.values.len(), "configuration loaded");
        Ok(config)
    }

    /// Build a configuration from an in-memory mapping. `source` is only used in error messages.
    pub fn from_map<I, K, V>(entries: I, source: impl AsRef<Path>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values: BTreeMap<String, String> =
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let source = source.as_ref().to_path_buf();

        for key in REQUIRED_KEYS {
            let present = values.get(key).is_some_and(|v| !v.trim().is_empty());
            if !present {
                return Err(ConfigError::MissingKey { key, path: source });
            }
        }

        Ok(Self { source, values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn api_key(&self) -> &str {
        self.required(API_KEY)
    }

    pub fn base_url(&self) -> &str {
        self.required(BASE_URL)
    }

    pub fn current_endpoint(&self) -> &str {
        self.required(CURRENT_ENDPOINT)
    }

    pub fn forecast_endpoint(&self) -> &str {
        self.required(FORECAST_ENDPOINT)
    }

    // Presence of REQUIRED_KEYS is checked in `from_map`.
    fn required(&self, key: &str) -> &str {
        self.get(key).map(str::trim).unwrap_or_default()
    }
}

fn parse(format: ConfigFormat, contents: &str) -> Result<BTreeMap<String, String>, String> {
    match format {
        ConfigFormat::Properties => java_properties::read(contents.as_bytes())
            .map(|map| map.into_iter().collect())
            .map_err(|e| e.to_string()),
        ConfigFormat::Toml => {
            let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| e.to_string())?;
            let mut out = BTreeMap::new();
            flatten_toml("", &table, &mut out);
            Ok(out)
        }
    }
}

fn flatten_toml(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match value {
            toml::Value::Table(inner) => flatten_toml(&full_key, inner, out),
            toml::Value::String(s) => {
                out.insert(full_key, s.clone());
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}
