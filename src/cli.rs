//! Command-line interface argument parsing.
//!
//! Both binaries share [`CommonArgs`] (concurrency, timeout, config file,
//! output format, log verbosity) and add their own search parameters.

use crate::models::SearchType;
use clap::{ArgGroup, Args, Parser};
use std::path::PathBuf;

/// Flags shared by `face-search` and `post-analysis`.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Maximum number of API requests in flight (1-64)
    ///
    /// Overrides `fanout.max_workers` from the config file.
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .socialscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .socialscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl CommonArgs {
    /// Validate the shared flags.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.debug && self.quiet {
            return Err("Cannot use both --debug and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output (default)
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Search social media profiles based on name and photo.
///
/// Requires API_DOMAIN and API_KEY in the environment.
///
/// Examples:
///   face-search --platforms twitter,youtube,myspace --name "Jane Doe" --photo_url https://example.com/jane.jpg
///   face-search --platforms vk --name "Jane Doe" --photo_url https://example.com/jane.jpg --format json
#[derive(Parser, Debug, Clone)]
#[command(name = "face-search", author, version, about, long_about = None)]
pub struct FaceSearchArgs {
    /// Comma-separated list of platforms to search (e.g. twitter,youtube,myspace)
    #[arg(
        long,
        value_name = "LIST",
        value_delimiter = ',',
        required_unless_present = "init_config"
    )]
    pub platforms: Vec<String>,

    /// Full name of the person to search for
    #[arg(long, value_name = "NAME", required_unless_present = "init_config")]
    pub name: Option<String>,

    /// URL of the photo to use for search
    #[arg(
        long = "photo_url",
        value_name = "URL",
        required_unless_present = "init_config"
    )]
    pub photo_url: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl FaceSearchArgs {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Platform names, trimmed, with empty entries dropped.
    pub fn platform_list(&self) -> Vec<String> {
        self.platforms
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn photo_url(&self) -> &str {
        self.photo_url.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        self.common.validate()?;

        if self.common.init_config {
            return Ok(());
        }

        if self.platform_list().is_empty() {
            return Err("At least one platform is required".to_string());
        }

        if self.name().trim().is_empty() {
            return Err("Name must not be empty".to_string());
        }

        let photo = self.photo_url();
        if !photo.starts_with("http://") && !photo.starts_with("https://") {
            return Err("Photo URL must start with 'http://' or 'https://'".to_string());
        }

        Ok(())
    }
}

/// Analyze tweets for sentiment and trend analysis.
///
/// Requires API_DOMAIN and API_KEY in the environment. Results are cached
/// as tweets_{query}.json, tweets_sentiments_{query}.json and
/// tweets_topics_{query}.json.
///
/// Examples:
///   post-analysis --username elonmusk
///   post-analysis --hashtags rustlang --verbose
///   post-analysis --keywords "open source" --no-cache
#[derive(Parser, Debug, Clone)]
#[command(name = "post-analysis", author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("query")
        .args(["username", "hashtags", "keywords"])
        .multiple(false)
))]
pub struct PostAnalysisArgs {
    /// Twitter username to analyze
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Hashtags to search for
    #[arg(long, value_name = "TAGS")]
    pub hashtags: Option<String>,

    /// Keywords to search for
    #[arg(long, value_name = "WORDS")]
    pub keywords: Option<String>,

    /// Display detailed tweet information (URLs, views, likes)
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for cached results
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Ignore cached results and refetch everything
    #[arg(long)]
    pub no_cache: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl PostAnalysisArgs {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The query and how to search for it.
    pub fn query(&self) -> Option<(&str, SearchType)> {
        if let Some(ref username) = self.username {
            Some((username.as_str(), SearchType::Username))
        } else if let Some(ref hashtags) = self.hashtags {
            Some((hashtags.as_str(), SearchType::Hashtags))
        } else {
            self.keywords
                .as_deref()
                .map(|keywords| (keywords, SearchType::Keywords))
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        self.common.validate()?;

        if self.common.init_config {
            return Ok(());
        }

        match self.query() {
            None => Err("One of --username, --hashtags or --keywords is required".to_string()),
            Some((query, _)) if query.trim().is_empty() => {
                Err("Search query must not be empty".to_string())
            }
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_args(argv: &[&str]) -> FaceSearchArgs {
        FaceSearchArgs::try_parse_from(std::iter::once("face-search").chain(argv.iter().copied()))
            .unwrap()
    }

    fn post_args(argv: &[&str]) -> Result<PostAnalysisArgs, clap::Error> {
        PostAnalysisArgs::try_parse_from(std::iter::once("post-analysis").chain(argv.iter().copied()))
    }

    #[test]
    fn test_face_search_parses_platform_list() {
        let args = face_args(&[
            "--platforms",
            "twitter, youtube,,myspace",
            "--name",
            "Jane Doe",
            "--photo_url",
            "https://example.com/p.jpg",
        ]);
        assert_eq!(args.platform_list(), vec!["twitter", "youtube", "myspace"]);
        assert_eq!(args.name(), "Jane Doe");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_face_search_requires_arguments() {
        let result =
            FaceSearchArgs::try_parse_from(["face-search", "--platforms", "twitter"]);
        assert!(result.is_err());

        let args = face_args(&["--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_face_search_rejects_bad_photo_url() {
        let args = face_args(&[
            "--platforms",
            "twitter",
            "--name",
            "Jane",
            "--photo_url",
            "ftp://nope",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_post_analysis_query_is_exclusive() {
        assert!(post_args(&["--username", "a", "--hashtags", "b"]).is_err());

        let args = post_args(&["--hashtags", "rust", "--verbose"]).unwrap();
        assert_eq!(args.query(), Some(("rust", SearchType::Hashtags)));
        assert!(args.verbose);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_post_analysis_requires_a_query() {
        let args = post_args(&["--verbose"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_common_validation() {
        let args = post_args(&["--keywords", "x", "--debug", "--quiet"]).unwrap();
        assert!(args.validate().is_err());

        let args = post_args(&["--keywords", "x", "--concurrency", "0"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = CommonArgs::default();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.debug = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.debug = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
