//! post-analysis - sentiment and trend analysis of tweets
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, missing API_DOMAIN/API_KEY, no tweets found,
//!       or runtime error

use anyhow::{Context, Result};
use socialscope::analysis::{load_classifications, load_tweets, PostAnalysis, Session};
use socialscope::api::ApiClient;
use socialscope::cache::ResultCache;
use socialscope::cli::{OutputFormat, PostAnalysisArgs};
use socialscope::config::{Credentials, CONFIG_FILE_NAME};
use socialscope::fanout::FanOut;
use socialscope::{init_config_file, init_logging, load_config, report};
use std::path::Path;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = PostAnalysisArgs::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.common.init_config {
        return handle_init_config();
    }

    init_logging(args.common.log_level());

    info!("post-analysis v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn handle_init_config() -> Result<()> {
    if !init_config_file(Path::new(CONFIG_FILE_NAME))? {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Run the analysis workflow. Returns the process exit code.
async fn run_analysis(args: PostAnalysisArgs) -> Result<i32> {
    let credentials = Credentials::from_env()?;
    let config = load_config(&args.common)?;

    let (query, search_type) = args
        .query()
        .context("One of --username, --hashtags or --keywords is required")?;

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.cache.dir.clone());

    let session = Session {
        client: ApiClient::from_credentials(&credentials, config.api.clone())
            .context("Failed to create API client")?,
        fanout: FanOut::new(config.max_workers()),
        cache: ResultCache::new(cache_dir, config.cache.max_age_hours),
        timeout: config.request_timeout(),
        read_cache: config.cache.enabled && !args.no_cache,
        show_progress: !args.common.quiet && args.common.format == OutputFormat::Text,
    };

    let tweets = load_tweets(&session, search_type, query).await;
    if tweets.is_empty() {
        eprintln!("No tweets found for the specified query.");
        return Ok(1);
    }

    let (sentiments, topics) = load_classifications(&session, search_type, query, &tweets).await;

    let analysis = PostAnalysis::build(
        query,
        search_type,
        &tweets,
        &sentiments,
        &topics,
        &config.report,
    );

    let output = match args.common.format {
        OutputFormat::Json => format!("{}\n", report::generate_json_report(&analysis)?),
        OutputFormat::Text => report::generate_post_report(&analysis, args.verbose),
    };
    print!("{}", output);

    Ok(0)
}
