//! face-search - find social media profiles by name and photo
//!
//! Exit codes:
//!   0 - Success (including when no profile was found)
//!   1 - Invalid arguments, missing API_DOMAIN/API_KEY, or runtime error

use anyhow::{Context, Result};
use socialscope::api::ApiClient;
use socialscope::cli::{FaceSearchArgs, OutputFormat};
use socialscope::config::{Credentials, CONFIG_FILE_NAME};
use socialscope::fanout::FanOut;
use socialscope::search::{search_profiles, SearchRequest};
use socialscope::{init_config_file, init_logging, load_config, progress_bar, report};
use std::path::Path;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = FaceSearchArgs::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.common.init_config {
        return handle_init_config();
    }

    init_logging(args.common.log_level());

    info!("face-search v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_search(args).await {
        error!("Search failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
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

async fn run_search(args: FaceSearchArgs) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let config = load_config(&args.common)?;

    let client = ApiClient::from_credentials(&credentials, config.api.clone())
        .context("Failed to create API client")?;
    let fanout = FanOut::new(config.max_workers());

    let request = SearchRequest {
        platforms: args.platform_list(),
        name: args.name().to_string(),
        photo_url: args.photo_url().to_string(),
    };

    let json = args.common.format == OutputFormat::Json;
    let pb = progress_bar(
        request.platforms.len(),
        "Searching profiles",
        args.common.quiet || json,
    );

    let outcome = search_profiles(&client, fanout, config.request_timeout(), &request, &pb).await;
    pb.finish_and_clear();

    info!(
        "Found {} profiles, {} platforms failed",
        outcome.profiles.len(),
        outcome.failed_platforms.len()
    );

    let output = match args.common.format {
        OutputFormat::Json => report::generate_json_report(&outcome)?,
        OutputFormat::Text => report::generate_profiles_report(&outcome),
    };
    print!("{}", output);
    if json {
        println!();
    }

    Ok(())
}
