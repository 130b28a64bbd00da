use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_PER_PAGE: u32 = 10;
const CONFIG_DIR: &str = "config";

/// Client configuration, resolved once at startup and handed to the transport.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Origin of the storefront REST API (e.g. `https://api.magnetcraft.shop`)
    #[validate(url)]
    pub api_base_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Directory downloaded PDFs and chart images are saved into
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Page size used by the report list when none is given
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub default_per_page: u32,

    /// Raw `Cookie` header value carrying the admin session
    #[serde(default)]
    pub session_cookie: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl ClientConfig {
    /// Creates a configuration pointing at `api_base_url` with every other field defaulted.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            environment: default_environment(),
            request_timeout_secs: default_timeout_secs(),
            download_dir: default_download_dir(),
            default_per_page: default_per_page(),
            session_cookie: None,
            user_agent: default_user_agent(),
            log_level: default_log_level(),
            log_json: false,
        }
    }

    /// Gets the API base URL reference
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_DIR)
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_user_agent() -> String {
    format!("magnetcraft-admin/{}", env!("CARGO_PKG_VERSION"))
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("magnetcraft_admin={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    // Logs go to stderr so `--json` command output on stdout stays parseable.
    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Level and format to start tracing with. A configuration that failed to
/// load falls back to the defaults so the failure itself still gets logged.
pub fn log_settings(loaded: &Result<ClientConfig, ClientConfigError>) -> (&str, bool) {
    match loaded {
        Ok(config) => (config.log_level(), config.log_json),
        Err(_) => (DEFAULT_LOG_LEVEL, false),
    }
}

/// Loads client configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
///
/// Runs before tracing is initialised, so it reports problems only through
/// its error.
pub fn load_config() -> Result<ClientConfig, ClientConfigError> {
    let _ = dotenvy::dotenv();

    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("environment", run_env.as_str())?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let client_config: ClientConfig = config.try_deserialize()?;

    client_config.validate()?;
    Ok(client_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_per_page, 10);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.download_dir(), Path::new("downloads"));
    }

    #[test]
    fn rejects_non_url_base() {
        let cfg = ClientConfig::new("not a url");
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("api_base_url"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = ClientConfig::default();
        cfg.default_per_page = 0;
        cfg.request_timeout_secs = 0;
        cfg.log_level = "verbose".into();

        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("default_per_page"));
        assert!(fields.contains_key("request_timeout_secs"));
        assert!(fields.contains_key("log_level"));
    }

    #[test]
    fn log_settings_follow_loaded_config() {
        let mut cfg = ClientConfig::default();
        cfg.log_level = "debug".into();
        cfg.log_json = true;
        let loaded: Result<ClientConfig, ClientConfigError> = Ok(cfg);
        assert_eq!(log_settings(&loaded), ("debug", true));
    }

    #[test]
    fn log_settings_fall_back_when_loading_fails() {
        let mut cfg = ClientConfig::default();
        cfg.default_per_page = 0;
        let loaded = cfg
            .validate()
            .map(|_| cfg.clone())
            .map_err(ClientConfigError::Validation);
        assert!(loaded.is_err());
        assert_eq!(log_settings(&loaded), (DEFAULT_LOG_LEVEL, false));
    }
}
