//! Configuration file support for keepcache.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `KEEPCACHE_`, `__` between
//!    section and key, e.g. `KEEPCACHE_REMOTE__TOKEN`)
//! 2. An explicit `--config <path>` (TOML or JSON, by extension)
//! 3. Local config file (`./keepcache.toml`)
//! 4. XDG config file (`~/.config/keepcache/config.toml`)
//! 5. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/keepcache/keepcache.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite:///var/lib/keepcache/keepcache.db?mode=rwc"  # optional
//!
//! [remote]
//! url = "https://keep.example.com"
//! token = "..."  # or use KEEPCACHE_REMOTE__TOKEN
//! accept_invalid_certs = false
//! timeout_seconds = 30
//!
//! [sync]
//! enabled = true
//! interval_minutes = 5
//! retry_delay_seconds = 30
//! max_retries = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use keepcache::remote::ClientOptions;
use keepcache::retry::RetryConfig;
use keepcache::sync::{DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECS};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Token value shipped in sample configs; never a real key.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_KARAKEEP_API_KEY_HERE";

const APP_NAME: &str = "keepcache";

/// Configuration problems. All of them are fatal for the command at hand.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Remote URL is not configured (set remote.url or KEEPCACHE_REMOTE__URL)")]
    MissingUrl,

    #[error("Remote URL '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Remote token is not configured (set remote.token or KEEPCACHE_REMOTE__TOKEN)")]
    MissingToken,

    #[error("Remote token is still the placeholder value; replace it with a real API key")]
    PlaceholderToken,

    #[error("Could not determine a default database location")]
    NoDatabaseLocation,
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Remote bookmark manager.
    pub remote: RemoteConfig,
    /// Sync schedule and retry policy.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Defaults to `sqlite://~/.local/state/keepcache/keepcache.db` if not specified.
    pub url: Option<String>,
}

/// Remote bookmark manager configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the remote, without the `/api/v1` suffix.
    pub url: Option<String>,
    /// API key sent as a bearer token.
    pub token: Option<String>,
    /// Skip TLS certificate validation (self-signed private deployments).
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            accept_invalid_certs: false,
            timeout_seconds: 30,
        }
    }
}

/// Sync schedule and retry policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether the daemon runs the scheduler at all.
    pub enabled: bool,
    /// Minutes between incremental cycles.
    pub interval_minutes: u64,
    /// Delay before the first retry of a failed request.
    pub retry_delay_seconds: u64,
    /// Retries after the first attempt.
    pub max_retries: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/keepcache/config.toml)
    /// 3. Local config file (./keepcache.toml)
    /// 4. The explicit file, which must exist
    /// 5. Environment variables with the KEEPCACHE_ prefix
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut files = Vec::new();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            files.push(xdg_config);
        }

        let local_config = PathBuf::from("keepcache.toml");
        if local_config.exists() {
            files.push(local_config);
        }

        Self::from_sources(&files, explicit, Self::environment())
    }

    /// `KEEPCACHE_REMOTE__TOKEN` -> `remote.token`.
    fn environment() -> Environment {
        Environment::with_prefix("KEEPCACHE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources(
        files: &[PathBuf],
        explicit: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        for path in files {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(path) = explicit {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize::<Config>()?)
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the file
    /// if it doesn't exist.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }
        Self::default_state_dir()
            .map(|state_dir| {
                let db_path = state_dir.join("keepcache.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
            .ok_or(ConfigError::NoDatabaseLocation)
    }

    /// Validated client options for the remote.
    pub fn remote_settings(&self) -> Result<ClientOptions, ConfigError> {
        let raw_url = self
            .remote
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;

        let parsed = Url::parse(raw_url).map_err(|e| ConfigError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: raw_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let token = self
            .remote
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        if token == PLACEHOLDER_TOKEN {
            return Err(ConfigError::PlaceholderToken);
        }

        Ok(ClientOptions::new(raw_url, token)
            .accept_invalid_certs(self.remote.accept_invalid_certs)
            .with_timeout(Duration::from_secs(self.remote.timeout_seconds))
            .with_retry(self.retry()))
    }

    /// Retry policy for remote requests.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(
            Duration::from_secs(self.sync.retry_delay_seconds),
            self.sync.max_retries,
        )
    }

    /// Interval between incremental cycles.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_minutes.saturating_mul(60))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/keepcache` or `~/.local/state/keepcache`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            // state_dir() returns None on macOS/Windows
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::environment().source(Some(map))
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("keepcache-config-test-{nonce}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.remote.url.is_none());
        assert!(config.remote.token.is_none());
        assert!(!config.remote.accept_invalid_certs);
        assert_eq!(config.remote.timeout_seconds, 30);
        assert!(config.sync.enabled);
        assert_eq!(config.sync.interval_minutes, 5);
        assert_eq!(config.sync.retry_delay_seconds, 30);
        assert_eq!(config.sync.max_retries, 3);
    }

    #[test]
    fn test_config_partial_override() {
        let config = from_toml(
            r#"
            [sync]
            interval_minutes = 15
        "#,
        );

        assert_eq!(config.sync.interval_minutes, 15);
        assert!(config.sync.enabled);
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync_interval(), Duration::from_secs(900));
    }

    #[test]
    fn test_environment_overrides_files() {
        let file = temp_file(
            "keepcache.toml",
            r#"
            [remote]
            url = "https://file.example.com"
            token = "from-file"
        "#,
        );

        let config = Config::from_sources(
            &[file],
            None,
            env(&[
                ("KEEPCACHE_REMOTE__TOKEN", "from-env"),
                ("KEEPCACHE_SYNC__MAX_RETRIES", "7"),
                ("KEEPCACHE_SYNC__ENABLED", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(config.remote.url.as_deref(), Some("https://file.example.com"));
        assert_eq!(config.remote.token.as_deref(), Some("from-env"));
        assert_eq!(config.sync.max_retries, 7);
        assert!(!config.sync.enabled);
    }

    #[test]
    fn test_explicit_json_file() {
        let file = temp_file(
            "settings.json",
            r#"{"remote": {"url": "https://json.example.com", "accept_invalid_certs": true}}"#,
        );

        let config = Config::from_sources(&[], Some(&file), env(&[])).unwrap();
        assert_eq!(config.remote.url.as_deref(), Some("https://json.example.com"));
        assert!(config.remote.accept_invalid_certs);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = std::env::temp_dir().join("keepcache-does-not-exist.toml");
        let err = Config::from_sources(&[], Some(&missing), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let file = temp_file("broken.toml", "[sync\ninterval_minutes = 5");
        assert!(Config::from_sources(&[], Some(&file), env(&[])).is_err());
    }

    #[test]
    fn test_remote_settings_valid() {
        let config = from_toml(
            r#"
            [remote]
            url = "https://keep.example.com/"
            token = "secret"
            timeout_seconds = 10

            [sync]
            retry_delay_seconds = 2
            max_retries = 1
        "#,
        );

        let options = config.remote_settings().unwrap();
        assert_eq!(options.base_url, "https://keep.example.com/");
        assert_eq!(options.token, "secret");
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.retry, RetryConfig::new(Duration::from_secs(2), 1));
    }

    #[test]
    fn test_remote_settings_missing_url() {
        let config = from_toml("[remote]\ntoken = \"secret\"");
        assert!(matches!(config.remote_settings(), Err(ConfigError::MissingUrl)));
    }

    #[test]
    fn test_remote_settings_invalid_url() {
        let config = from_toml("[remote]\nurl = \"not a url\"\ntoken = \"secret\"");
        assert!(matches!(
            config.remote_settings(),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let config = from_toml("[remote]\nurl = \"ftp://keep.example.com\"\ntoken = \"secret\"");
        assert!(matches!(
            config.remote_settings(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_remote_settings_missing_token() {
        let config = from_toml("[remote]\nurl = \"https://keep.example.com\"\ntoken = \"  \"");
        assert!(matches!(config.remote_settings(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_remote_settings_rejects_placeholder_token() {
        let config = from_toml(&format!(
            "[remote]\nurl = \"https://keep.example.com\"\ntoken = \"{PLACEHOLDER_TOKEN}\""
        ));
        assert!(matches!(
            config.remote_settings(),
            Err(ConfigError::PlaceholderToken)
        ));
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let url = Config::default().database_url().unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("keepcache.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let config = from_toml("[database]\nurl = \"sqlite:///tmp/cache.db?mode=rwc\"");
        assert_eq!(config.database_url().unwrap(), "sqlite:///tmp/cache.db?mode=rwc");
    }
}
