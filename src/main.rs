use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ingestor::cli::{Cli, Commands};
use ingestor::config::{Config, IngestConfig};
use ingestor::domain::{AdapterResult, ItemCore, RunResult, SourceItem};
use ingestor::errors::IngestResult;
use ingestor::services::IngestService;
use ingestor::sources::{HttpFetcher, SourceRegistry};
use ingestor::storage::FileCacheStore;

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ingestor=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> IngestResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run {
            hours_back,
            no_cache,
            json,
            output,
        } => {
            let sources = config
                .load_sources()?
                .with_overrides(hours_back, no_cache.then_some(false));
            cmd_run(&config, &sources, json, output)
        }
        Commands::Sources => cmd_sources(&config.load_sources()?),
        Commands::ClearCache => cmd_clear_cache(&config),
    }
}

fn cmd_run(
    config: &Config,
    sources: &IngestConfig,
    json: bool,
    output: Option<PathBuf>,
) -> IngestResult<()> {
    if sources.enabled_sources().next().is_none() {
        println!("No sources configured.");
        return Ok(());
    }

    let cache = Arc::new(FileCacheStore::new(&config.cache_dir, sources.cache_enabled));
    let fetcher = HttpFetcher::new(cache, config.http_timeout);
    let registry = SourceRegistry::new(fetcher, &config.adapters);
    let service = IngestService::new(registry, config.service_options());

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(service.run_all(sources))?;

    match output {
        Some(path) => {
            fs::write(&path, serde_json::to_string_pretty(&result)?)?;
            println!("Wrote results to {}", path.display());
        }
        None if json => println!("{}", serde_json::to_string_pretty(&result)?),
        None => print_summary(&result),
    }

    Ok(())
}

fn print_summary(result: &RunResult) {
    println!(
        "Ingestion run at {} (last {} hours)\n",
        result.executed_at.to_rfc3339(),
        result.hours_back
    );

    for (name, outcome) in &result.sources {
        match outcome {
            AdapterResult::Ok { items, failures } => {
                println!("{} ({} items):", name, items.len());
                for item in items {
                    print_item(item);
                }
                for failure in failures {
                    println!("  ! {} [{}]: {}", failure.parameter, failure.kind, failure.message);
                }
            }
            AdapterResult::Failed(detail) => {
                println!("{}: FAILED [{}] {}", name, detail.kind, detail.message);
            }
        }
        println!();
    }

    println!(
        "Run complete: {} items from {} sources, {} failed.",
        result.total_items(),
        result.sources.len(),
        result.failed_sources().len()
    );
}

fn print_item(item: &SourceItem) {
    let label = match item {
        SourceItem::Video(_) => "transcript",
        SourceItem::Article(_) => "full text",
    };
    let present = if item.enriched_text().is_some() { "yes" } else { "no" };

    println!(
        "  - {} ({})",
        item.title(),
        item.published_at().format("%Y-%m-%d %H:%M UTC")
    );
    println!("    {}", item.url());
    println!("    {}: {}", label, present);
}

fn cmd_sources(sources: &IngestConfig) -> IngestResult<()> {
    if sources.sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("Configured sources (last {} hours):\n", sources.hours_back);
    for source in &sources.sources {
        let status = if source.enabled { "" } else { " (disabled)" };
        println!(
            "  {} [{}] ({} params){}",
            source.name,
            source.kind,
            source.params.len(),
            status
        );
        for param in &source.params {
            println!("    {}", param);
        }
    }

    Ok(())
}

fn cmd_clear_cache(config: &Config) -> IngestResult<()> {
    let removed = FileCacheStore::new(&config.cache_dir, true).clear()?;
    println!("Removed {} cached entries.", removed);
    Ok(())
}
