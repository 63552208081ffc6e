//! Cite-Ripple main entry point
//!
//! This is the command-line interface for the Cite-Ripple citation graph crawler.

use anyhow::Context;
use cite_ripple::config::{load_config_with_hash, validate, Config};
use cite_ripple::crawler::{run_crawl, CrawlOptions, HttpFetcher};
use cite_ripple::output::print_statistics;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Cite-Ripple: a citation graph crawler
///
/// Starting from a "cited by" listing, Cite-Ripple follows citation pages
/// depth-first, builds a directed citation graph and keeps GEXF, GraphML,
/// JSON and HTML exports of it up to date while the crawl runs.
#[derive(Parser, Debug)]
#[command(name = "cite-ripple")]
#[command(version)]
#[command(about = "A citation graph crawler", long_about = None)]
struct Cli {
    /// Listing page to start from ("cited by" or search results URL)
    #[arg(value_name = "URL")]
    url: String,

    /// Levels of "cited by" pages to follow below the start page [default: 1]
    #[arg(short, long)]
    depth: Option<u32>,

    /// Results pages to walk per listing [default: 1]
    #[arg(short, long)]
    pages: Option<u32>,

    /// Prefix for the exported files [default: output]
    #[arg(short, long, value_name = "PREFIX")]
    output: Option<String>,

    /// Log every extracted record and its context as JSON
    #[arg(long)]
    debug: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Options summary shown in the HTML view and stored with SQLite runs
    fn invocation(&self, config: &Config) -> String {
        format!(
            "{} depth={} pages={} output={}",
            self.url, config.crawler.depth, config.crawler.pages, config.output.prefix
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid options")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            interrupt.cancel();
        }
    });

    let fetcher =
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP client")?;
    let options = CrawlOptions {
        start_url: cli.url.clone(),
        debug: cli.debug,
        invocation: cli.invocation(&config),
        config_hash,
    };

    let stats = run_crawl(&config, fetcher, cancel, options)
        .await
        .context("Crawl failed")?;

    if !cli.quiet {
        print_statistics(&stats);
    }

    Ok(())
}

/// Applies command-line flags on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.depth {
        config.crawler.depth = depth;
    }
    if let Some(pages) = cli.pages {
        config.crawler.pages = pages;
    }
    if let Some(prefix) = &cli.output {
        config.output.prefix = prefix.clone();
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cite_ripple=info,warn"),
            1 => EnvFilter::new("cite_ripple=debug,info"),
            2 => EnvFilter::new("cite_ripple=trace,debug"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let cli = Cli::parse_from(["cite-ripple", "https://scholar.google.com/scholar?cites=1"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.crawler.depth, 1);
        assert_eq!(config.crawler.pages, 1);
        assert_eq!(config.output.prefix, "output");
        assert!(!cli.debug);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "cite-ripple",
            "https://scholar.google.com/scholar?cites=1",
            "--depth",
            "3",
            "--pages",
            "2",
            "--output",
            "runs/graph",
            "--debug",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.crawler.depth, 3);
        assert_eq!(config.crawler.pages, 2);
        assert_eq!(config.output.prefix, "runs/graph");
        assert!(cli.debug);
        assert_eq!(
            cli.invocation(&config),
            "https://scholar.google.com/scholar?cites=1 depth=3 pages=2 output=runs/graph"
        );
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["cite-ripple", "-v", "-q", "https://example.com"]);
        assert!(result.is_err());
    }
}
