//! Configuration loading for the list client.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `MARKET_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Prefix shared by every recognised environment variable
pub const ENV_PREFIX: &str = "MARKET_";

/// Where list pages come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// The remote REST API
    #[default]
    Http,
    /// Static sample data
    Fixture,
}

impl FromStr for DataSourceKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" | "api" => Ok(DataSourceKind::Http),
            "fixture" | "mock" => Ok(DataSourceKind::Fixture),
            other => Err(ConfigError::InvalidDataSource {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceKind::Http => write!(f, "http"),
            DataSourceKind::Fixture => write!(f, "fixture"),
        }
    }
}

/// Application configuration derived from `MARKET_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub data_source: DataSourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_base_url: default_api_base_url(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            data_source: DataSourceKind::default(),
            fixture_path: None,
            default_page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
            scroll_threshold: default_scroll_threshold(),
            id_token: None,
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.id_token.is_some() {
            config.id_token = Some("[REDACTED]".to_string());
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_source == DataSourceKind::Http {
            let url =
                Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidApiBaseUrl {
                    value: self.api_base_url.clone(),
                    reason: source.to_string(),
                })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidApiBaseUrl {
                    value: self.api_base_url.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }

        if self.default_page_size == 0 || self.default_page_size > 100 {
            return Err(ConfigError::InvalidPageSize {
                value: self.default_page_size,
            });
        }

        if !(1_000..=120_000).contains(&self.request_timeout_ms) {
            return Err(ConfigError::InvalidRequestTimeout {
                value: self.request_timeout_ms,
            });
        }

        if self.scroll_threshold > 50 {
            return Err(ConfigError::InvalidScrollThreshold {
                value: self.scroll_threshold,
            });
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.fixture_path.is_some() && self.data_source != DataSourceKind::Fixture {
            return Err(ConfigError::FixturePathWithoutFixtureSource);
        }

        Ok(())
    }

    /// Per-request timeout as a duration
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_request_timeout_ms() -> u64 {
    20_000 // 20 seconds
}

fn default_scroll_threshold() -> usize {
    3 // rows from the end
}

fn default_user_agent() -> String {
    format!("vendor-lists/{}", env!("CARGO_PKG_VERSION"))
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid API base URL '{value}': {reason}")]
    InvalidApiBaseUrl { value: String, reason: String },
    #[error("invalid data source '{value}'; expected 'http' or 'fixture'")]
    InvalidDataSource { value: String },
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: String, value: String },
    #[error("default page size must be between 1 and 100, got {value}")]
    InvalidPageSize { value: u32 },
    #[error("request timeout must be between 1000 and 120000 ms, got {value}")]
    InvalidRequestTimeout { value: u64 },
    #[error("scroll threshold must be at most 50 rows, got {value}")]
    InvalidScrollThreshold { value: usize },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("MARKET_FIXTURE_PATH is set but MARKET_DATA_SOURCE is not 'fixture'")]
    FixturePathWithoutFixtureSource,
}

/// Loads configuration using layered `.env` files and `MARKET_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = take_non_empty(&mut layered, "PROFILE").unwrap_or(profile_hint);
        let api_base_url =
            take_non_empty(&mut layered, "API_BASE_URL").unwrap_or_else(default_api_base_url);
        let log_level = take_non_empty(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take_non_empty(&mut layered, "LOG_FORMAT")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(default_log_format);
        let data_source = match take_non_empty(&mut layered, "DATA_SOURCE") {
            Some(value) => value.parse()?,
            None => DataSourceKind::default(),
        };
        let fixture_path = take_non_empty(&mut layered, "FIXTURE_PATH").map(|p| {
            let path = PathBuf::from(p);
            if path.is_relative() {
                self.base_dir.join(path)
            } else {
                path
            }
        });
        let default_page_size =
            take_parsed(&mut layered, "DEFAULT_PAGE_SIZE")?.unwrap_or_else(default_page_size);
        let request_timeout_ms = take_parsed(&mut layered, "REQUEST_TIMEOUT_MS")?
            .unwrap_or_else(default_request_timeout_ms);
        let scroll_threshold =
            take_parsed(&mut layered, "SCROLL_THRESHOLD")?.unwrap_or_else(default_scroll_threshold);
        let id_token = take_non_empty(&mut layered, "ID_TOKEN").map(|t| t.trim().to_string());
        let user_agent =
            take_non_empty(&mut layered, "USER_AGENT").unwrap_or_else(default_user_agent);

        let config = AppConfig {
            profile,
            api_base_url,
            log_level,
            log_format,
            data_source,
            fixture_path,
            default_page_size,
            request_timeout_ms,
            scroll_threshold,
            id_token,
            user_agent,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn take_non_empty(layered: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    layered.remove(key).filter(|v| !v.trim().is_empty())
}

fn take_parsed<T: FromStr>(
    layered: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match take_non_empty(layered, key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}{key}"),
                value,
            }),
        None => Ok(None),
    }
}
