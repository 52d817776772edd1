use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable that overrides `api.key`.
pub const API_KEY_ENV: &str = "AERODATABOX_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,        // Scheme and host, no trailing slash
    pub host: String,            // Sent as x-rapidapi-host
    pub key: String,             // Sent as x-rapidapi-key
    pub timeout_seconds: u64,    // Per request
    pub cache_responses: bool,   // Reuse bodies for their Cache-Control max-age
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchConfig {
    pub default_span: Span,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub directory: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://aerodatabox.p.rapidapi.com".to_string(),
            host: "aerodatabox.p.rapidapi.com".to_string(),
            key: String::new(),
            timeout_seconds: 10,
            cache_responses: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file at `path`.
    /// If it doesn't exist, creates a default one. A file that exists but
    /// can't be read is left alone.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                Config::default()
            }),
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!("Could not read {}: {}. Using defaults.", path.display(), e);
                Config::default()
            }
            Err(_) => {
                let config = Config::default();
                // Save default config to disk for the user to edit later
                match toml::to_string_pretty(&config) {
                    Ok(toml_string) => {
                        if fs::write(path, toml_string).is_err() {
                            warn!("Could not write default {} to disk.", path.display());
                        }
                    }
                    Err(e) => warn!("Could not serialize default config: {}", e),
                }
                info!("Loaded default configuration.");
                config
            }
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        config
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Replaces the API key with `key` when it is present and non-empty.
    pub fn apply_env(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.key = key.trim().to_string();
        }
    }
}
