//! Site-Harvest main entry point
//!
//! This is the command-line interface: it accepts one site URL and prints
//! the extracted content of every discovered page.

use anyhow::{bail, Context};
use clap::Parser;
use site_harvest::config::{load_config_with_hash, Config};
use site_harvest::harvest::Harvester;
use site_harvest::output::{format_markdown_report, print_statistics, write_markdown_report};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Harvest: discover a site's pages and fetch their text
///
/// URLs come from the site's sitemap.xml and the internal links of the
/// seed page; pages are fetched in parallel with a fixed concurrency cap.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "Discover a website's pages and fetch their content", long_about = None)]
struct Cli {
    /// Website URL to harvest (scheme optional)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages fetched at once (overrides config)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=100))]
    concurrency: Option<u32>,

    /// Sitemap request timeout in seconds (overrides config)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    sitemap_timeout: Option<u64>,

    /// Only print the discovered URL list, without fetching pages
    #[arg(long)]
    list_only: bool,

    /// Write the markdown report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let seed = cli.url.trim();
    if seed.is_empty() {
        bail!("Please enter a valid URL.");
    }

    let config = resolve_config(&cli)?;
    let harvester = Harvester::new(&config).context("Failed to initialize harvester")?;

    if cli.list_only {
        for url in harvester.discover(seed).await {
            println!("{}", url);
        }
        return Ok(());
    }

    tracing::info!(
        "Harvesting {} with at most {} concurrent fetches",
        seed,
        harvester.limit()
    );
    let report = harvester.harvest(seed).await;

    let report_path = cli
        .output
        .clone()
        .or_else(|| config.output.report_path.as_ref().map(PathBuf::from));

    match report_path {
        Some(path) => {
            write_markdown_report(&report, &path)?;
            if !cli.quiet {
                print_statistics(&report);
                println!("\n✓ Report written to: {}", path.display());
            }
        }
        None => print!("{}", format_markdown_report(&report)),
    }

    Ok(())
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_from(path)?,
        None => Config::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.fetcher.max_concurrent_fetches = concurrency;
    }
    if let Some(timeout) = cli.sitemap_timeout {
        config.sitemap.timeout_secs = timeout;
    }

    site_harvest::config::validate(&config)?;
    Ok(config)
}

fn load_from(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so the report on stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
