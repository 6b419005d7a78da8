//! SocialScope - reverse face search and tweet sentiment analysis
//!
//! Two command-line tools share this library:
//!
//! - `face-search` asks the social-mapping API for profiles matching a name
//!   and photo on several platforms at once.
//! - `post-analysis` fetches tweets for a username, hashtag or keyword
//!   query, classifies every tweet, and reports statistics, negative
//!   sentiment and trending topics.
//!
//! Both fan their requests out through [`fanout::FanOut`], which runs
//! independent tasks with bounded concurrency and isolates failures.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fanout;
pub mod models;
pub mod report;
pub mod search;

use anyhow::{Context, Result};
use cli::CommonArgs;
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// stays clean for reports.
pub fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Handle --init-config: write a default .socialscope.toml.
///
/// Returns `Ok(false)` when the file already exists.
pub fn init_config_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Load configuration from `--config`, the default file, or built-in defaults,
/// then apply command-line overrides.
pub fn load_config(args: &CommonArgs) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", CONFIG_FILE_NAME);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}

/// A progress bar over `len` tasks, or a hidden one.
pub fn progress_bar(len: usize, message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
