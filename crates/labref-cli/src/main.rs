//! labref — Evidence enrichment for Productivity Lab protocol seeds.
//!
//! Resolves `PubMed search: ...` placeholders in each protocol's references
//! into real PubMed citations, preferring guidelines, systematic reviews,
//! meta-analyses and randomized trials.
//!
//! ```bash
//! labref --input protocols_500.seed.json --output protocols_500.enriched.json
//! ```

mod config;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use labref_common::SandboxClient;
use labref_enrich::document::{load_document, save_document, validate};
use labref_enrich::sources::pubmed::PubMedClient;
use labref_enrich::{Enricher, EvidenceResolver, RunSummary};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Enrich protocol references with PubMed evidence
#[derive(Parser)]
#[command(name = "labref")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input seed file (e.g. protocols_500.seed.json)
    #[arg(long)]
    input: PathBuf,

    /// Enriched output file (e.g. protocols_500.enriched.json)
    #[arg(long)]
    output: PathBuf,

    /// Maximum references per protocol
    #[arg(long)]
    max_per_protocol: Option<usize>,

    /// Prefer papers from the last N years (0 disables)
    #[arg(long)]
    prefer_years: Option<u32>,

    /// NCBI API key
    #[arg(long, env = "NCBI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pause between protocols in seconds, to respect rate limits
    #[arg(long)]
    sleep: Option<f64>,

    /// Path to labref.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "labref_cli=debug,labref_enrich=debug,labref_common=debug,warn"
    } else {
        "labref_cli=info,labref_enrich=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("static template")
            .progress_chars("=> "),
    );
    pb.set_message("Enriching protocols");
    pb
}

fn print_summary(output: &Path, summary: &RunSummary) {
    println!();
    println!("{} Output written to: {}", style("✓").green().bold(), style(output.display()).bold());
    println!("Protocols processed:          {}", summary.total);
    println!("Protocols with enriched refs: {}", style(summary.enriched).green());
    println!("Flagged for manual review:    {}", style(summary.needs_review).yellow());
    println!();
    println!(
        "{}",
        style("Tip: review the 'needs_review' protocols first, then the higher-risk ones.").dim()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(n) = cli.max_per_protocol {
        config.enrichment.max_per_protocol = n;
    }
    if let Some(years) = cli.prefer_years {
        config.enrichment.prefer_years = years;
    }
    if let Some(secs) = cli.sleep {
        config.enrichment.sleep_secs = secs;
    }
    if cli.api_key.is_some() {
        config.pubmed.api_key = cli.api_key.clone();
    }
    config.validate()?;

    let mut document = load_document(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let total = validate(&document).context("invalid JSON")?;
    info!(
        total,
        max_per_protocol = config.enrichment.max_per_protocol,
        prefer_years = config.enrichment.prefer_years,
        "Loaded protocols"
    );

    let api_key = config.pubmed.api_key.clone().map(SecretString::from);
    let client = PubMedClient::with_client(SandboxClient::with_timeout(config.timeout())?, api_key);
    let enricher = Enricher::new(
        EvidenceResolver::new(client, config.resolver_settings()),
        config.delay(),
    );

    let pb = progress_bar(total);
    let summary = enricher
        .run_with_progress(&mut document, |done, _| pb.set_position(done as u64))
        .await?;
    pb.finish_and_clear();

    save_document(&cli.output, &document)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    print_summary(&cli.output, &summary);
    Ok(())
}
