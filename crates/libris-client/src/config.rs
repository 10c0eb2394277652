//! # Client Configuration
//!
//! Where the backend lives, how long cached data stays fresh and where the
//! session is persisted.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LIBRIS_API_BASE_URL=http://library.local:8081                      │
//! │     LIBRIS_DEMO_MODE=true                                              │
//! │     LIBRIS_DB_PATH / LIBRIS_SESSION_PATH                               │
//! │     LIBRIS_REQUEST_TIMEOUT_SECS=10                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/libris/libris.toml (Linux)                               │
//! │     ~/Library/Application Support/org.libris.libris/libris.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8081, demo off, 30s timeout, 5 min stale time     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # libris.toml
//! [api]
//! base_url = "http://localhost:8081"
//! request_timeout_secs = 30
//!
//! [demo]
//! enabled = true
//! database_path = "/tmp/libris-demo.db"   # omit for in-memory
//! seed_sample_data = true
//!
//! [cache]
//! stale_time_secs = 300
//! retry = 1
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

const CONFIG_FILE: &str = "libris.toml";
const SESSION_FILE: &str = "session.json";
const DEMO_DB_FILE: &str = "libris-demo.db";

// =============================================================================
// API Settings
// =============================================================================

/// REST backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Server origin; endpoints live under `{base_url}/api/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Demo Settings
// =============================================================================

/// In-process backend used instead of the REST server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSettings {
    /// Route every call to the demo backend.
    #[serde(default)]
    pub enabled: bool,

    /// SQLite file. `None` keeps everything in memory for the process.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Fill an empty database with the sample catalogue on start.
    #[serde(default = "default_true")]
    pub seed_sample_data: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DemoSettings {
    fn default() -> Self {
        DemoSettings {
            enabled: false,
            database_path: None,
            seed_sample_data: true,
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Query cache behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long fetched data is served without refetching (seconds).
    #[serde(default = "default_stale_time")]
    pub stale_time_secs: u64,

    /// Extra attempts after a failed fetch. Mutations never retry.
    #[serde(default = "default_retry")]
    pub retry: u32,
}

fn default_stale_time() -> u64 {
    300
}

fn default_retry() -> u32 {
    1
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            stale_time_secs: default_stale_time(),
            retry: default_retry(),
        }
    }
}

impl CacheSettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// Where the logged-in session is kept between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Explicit session file. Defaults to the per-user data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Keep the session in memory only.
    #[serde(default)]
    pub ephemeral: bool,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub demo: DemoSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (libris.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Config(format!("{}: {}", parent.display(), e)))?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(e.to_string()))?;
        std::fs::write(&path, contents)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;

        info!(?path, "Client config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.api.base_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "API base URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIBRIS_API_BASE_URL") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(demo) = std::env::var("LIBRIS_DEMO_MODE") {
            match demo.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.demo.enabled = true,
                "false" | "0" | "no" | "off" => self.demo.enabled = false,
                _ => warn!(value = %demo, "Unknown LIBRIS_DEMO_MODE value"),
            }
        }

        if let Ok(path) = std::env::var("LIBRIS_DB_PATH") {
            self.demo.database_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("LIBRIS_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }

        if let Ok(secs) = std::env::var("LIBRIS_REQUEST_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.api.request_timeout_secs = s;
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("org", "libris", "libris")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Session file to use, or `None` for an in-memory session.
    pub fn session_path(&self) -> Option<PathBuf> {
        if self.session.ephemeral {
            return None;
        }
        self.session
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join(SESSION_FILE)))
    }

    /// Suggested location for a persistent demo database.
    pub fn default_demo_db_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join(DEMO_DB_FILE))
    }

    /// REST origin without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8081");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
        assert!(!config.demo.enabled);
        assert_eq!(config.cache.stale_time(), Duration::from_secs(300));
        assert_eq!(config.cache.retry, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://library".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://library.example.org/".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), "https://library.example.org");

        config.api.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [demo]
            enabled = true

            [cache]
            retry = 0
            "#,
        )
        .unwrap();

        assert!(config.demo.enabled);
        assert!(config.demo.seed_sample_data);
        assert_eq!(config.cache.retry, 0);
        assert_eq!(config.cache.stale_time_secs, 300);
        assert_eq!(config.api.base_url, "http://localhost:8081");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("libris.toml");

        let mut config = ClientConfig::default();
        config.api.base_url = "http://library.local:9000".to_string();
        config.session.ephemeral = true;
        config.save(Some(path.clone())).unwrap();

        let loaded = ClientConfig::load(Some(path)).unwrap();
        assert!(loaded.session.ephemeral);
        assert!(loaded.session_path().is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[cache]"));
    }
}
