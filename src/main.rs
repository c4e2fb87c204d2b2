//! Token-Sifter main entry point
//!
//! This is the command-line interface for the Token-Sifter token-listing scraper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use token_sifter::config::{load_config_with_hash, validate, Config};
use token_sifter::run_crawl;
use tracing_subscriber::EnvFilter;

/// Token-Sifter: A polite token-listing scraper
///
/// Token-Sifter walks every page of a paginated token listing, visits each
/// token's detail page and writes name, symbol and contract address of every
/// token to a single JSON document.
#[derive(Parser, Debug)]
#[command(name = "token-sifter")]
#[command(version)]
#[command(about = "A polite token-listing scraper", long_about = None)]
struct Cli {
    /// Where to write the token metadata JSON document
    #[arg(short = 'm', long = "metadata-file", value_name = "PATH")]
    metadata_file: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "watch")]
    dry_run: bool,

    /// Crawl again every scrape period until interrupted
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.watch {
        handle_watch(config).await?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("token_sifter=info,warn"),
            1 => EnvFilter::new("token_sifter=debug,info"),
            2 => EnvFilter::new("token_sifter=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or the defaults) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(path) = &cli.metadata_file {
        config.output.metadata_path = path.to_string_lossy().into_owned();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Token-Sifter Dry Run ===\n");

    println!("Target:");
    println!("  Listing URL: {}", config.target.listing_url);
    println!("  Page parameter: {}", config.target.page_param);
    println!("  Detail routes: {}", config.target.detail_routes.join(", "));

    println!("\nPoliteness:");
    println!("  Domain glob: {}", config.crawler.domain_glob);
    println!("  Parallelism: {}", config.crawler.parallelism);
    println!(
        "  Delay: {}ms + up to {}ms random",
        config.crawler.delay_ms, config.crawler.random_delay_ms
    );
    println!(
        "  Request timeout: {}s, {} retries",
        config.crawler.request_timeout_secs, config.crawler.max_retries
    );
    match config.crawler.crawl_timeout() {
        Some(limit) => println!("  Crawl timeout: {}s", limit.as_secs()),
        None => println!("  Crawl timeout: none"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Metadata file: {}", config.output.metadata_path);

    println!("\n✓ Configuration is valid");
}

/// Handles a single crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let report = run_crawl(config).await.context("Crawl failed")?;
    tracing::info!(
        "Crawl completed successfully: {} tokens",
        report.tokens_collected
    );
    Ok(())
}

/// Handles --watch: one crawl per scrape period until Ctrl-C
async fn handle_watch(config: Config) -> anyhow::Result<()> {
    let period = config.crawler.scrape_period();

    loop {
        tokio::select! {
            result = handle_crawl(config.clone()) => result?,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted during crawl, nothing was written");
                return Ok(());
            }
        }

        tracing::info!("Next crawl in {}s", period.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}
