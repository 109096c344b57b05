//! KP-Harvest main entry point
//!
//! Command-line driver: harvests one category and writes records to stdout
//! as JSON lines. Logs and statistics go to stderr.

use anyhow::Context;
use clap::Parser;
use kp_harvest::config::load_config_with_hash;
use kp_harvest::output::{print_statistics, JsonLinesSink};
use kp_harvest::{HarvestRequest, Harvester, HtmlSession};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// KP-Harvest: a category-driven classifieds harvester
///
/// Resolves a category of kupujemprodajem.com, walks its search pages and
/// prints one JSON object per listing. With --enrich every listing's detail
/// page is visited as well.
#[derive(Parser, Debug)]
#[command(name = "kp-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A category-driven classifieds harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Category to harvest, by display name or slug
    #[arg(long, required_unless_present = "list_categories")]
    category: Option<String>,

    /// Restrict the harvest to one subcategory of the category
    #[arg(long, requires = "category")]
    subcategory: Option<String>,

    /// Number of search pages to fetch (defaults to [harvest] max-pages)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Visit every listing's detail page and emit full records
    #[arg(long)]
    enrich: bool,

    /// Print the top-level categories and exit
    #[arg(long, conflicts_with_all = ["category", "enrich", "pages"])]
    list_categories: bool,

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

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let session = HtmlSession::from_config(&config.user_agent, config.session.navigation_timeout())
        .context("Failed to build HTTP client")?;
    let mut harvester = Harvester::new(Arc::new(session), Arc::new(config)).await?;

    let outcome = if cli.list_categories {
        handle_list_categories(&mut harvester).await
    } else {
        handle_harvest(&mut harvester, &cli).await
    };

    if let Err(e) = harvester.close().await {
        tracing::warn!("Failed to close session: {}", e);
    }
    outcome
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs are written to stderr; stdout carries only records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kp_harvest=info,warn"),
            1 => EnvFilter::new("kp_harvest=debug,info"),
            2 => EnvFilter::new("kp_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --list-categories: one JSON object per category
async fn handle_list_categories(harvester: &mut Harvester) -> anyhow::Result<()> {
    let categories = harvester.list_categories().await?;

    let mut out = BufWriter::new(io::stdout());
    for category in &categories {
        serde_json::to_writer(&mut out, category)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    tracing::info!("Listed {} categories", categories.len());
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(harvester: &mut Harvester, cli: &Cli) -> anyhow::Result<()> {
    let category = cli
        .category
        .clone()
        .context("--category is required unless --list-categories is given")?;

    let mut request = HarvestRequest::new(category).enrich(cli.enrich);
    if let Some(subcategory) = &cli.subcategory {
        request = request.subcategory(subcategory.clone());
    }
    if let Some(pages) = cli.pages {
        request = request.max_pages(pages);
    }

    let mut sink = JsonLinesSink::new(BufWriter::new(io::stdout()));
    match harvester.harvest(&request, &mut sink).await {
        Ok(stats) => {
            if !cli.quiet {
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
