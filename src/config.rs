//! Configuration file handling.
//!
//! Settings come from an optional `.socialscope.toml`, overridden by CLI
//! flags. API credentials are never stored in the file; they are read
//! from `API_DOMAIN` and `API_KEY`.

use crate::cli::CommonArgs;
use crate::error::ConfigError;
use crate::fanout::{DEFAULT_MAX_WORKERS, DEFAULT_TASK_TIMEOUT, MAX_WORKERS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".socialscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Fan-out settings.
    #[serde(default)]
    pub fanout: FanoutConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// `limit` sent to the tweet and classification endpoints.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// `max_profiles` sent to the social mapper.
    #[serde(default = "default_max_profiles")]
    pub max_profiles: u32,

    /// Server-side timeout (seconds) sent to the classification endpoint.
    #[serde(default = "default_classify_timeout")]
    pub classify_timeout: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            limit: default_limit(),
            max_profiles: default_max_profiles(),
            classify_timeout: default_classify_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TASK_TIMEOUT.as_secs()
}

fn default_limit() -> u32 {
    100
}

fn default_max_profiles() -> u32 {
    300
}

fn default_classify_timeout() -> u32 {
    110
}

/// Fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Maximum requests in flight. Clamped to `1..=64`.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cache files.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Entries older than this are refetched. Unset means never stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_hours: Option<u64>,

    /// Read cached results at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            max_age_hours: None,
            enabled: true,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Negative-sentiment objects shown.
    #[serde(default = "default_top_negative")]
    pub top_negative: usize,

    /// Most viewed tweets shown.
    #[serde(default = "default_top_viewed")]
    pub top_viewed: usize,

    /// Trending topics shown.
    #[serde(default = "default_top_topics")]
    pub top_topics: usize,

    /// Topic labels dropped before counting (classifier refusals).
    #[serde(default = "default_topic_blocklist")]
    pub topic_blocklist: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_negative: default_top_negative(),
            top_viewed: default_top_viewed(),
            top_topics: default_top_topics(),
            topic_blocklist: default_topic_blocklist(),
        }
    }
}

fn default_top_negative() -> usize {
    5
}

fn default_top_viewed() -> usize {
    3
}

fn default_top_topics() -> usize {
    5
}

fn default_topic_blocklist() -> Vec<String> {
    vec!["I'm sorry".to_string()]
}

/// API endpoint and key, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub domain: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `API_DOMAIN` and `API_KEY` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        Ok(Self {
            domain: read("API_DOMAIN")?,
            api_key: read("API_KEY")?,
        })
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &CommonArgs) {
        if let Some(concurrency) = args.concurrency {
            self.fanout.max_workers = concurrency;
        }

        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
    }

    /// Effective worker bound after clamping.
    pub fn max_workers(&self) -> usize {
        self.fanout.max_workers.clamp(1, MAX_WORKERS)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
