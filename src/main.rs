use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use listing_scraper::apis::create_adapter;
use listing_scraper::app::ports::{ClassifierPort, HttpClientPort};
use listing_scraper::common::constants::get_supported_sources;
use listing_scraper::common::types::Source;
use listing_scraper::config::{Config, Overrides};
use listing_scraper::infra::{GeminiClassifier, ReqwestHttp};
use listing_scraper::observability::{init_logging, init_metrics};
use listing_scraper::pipeline::{BatchClassifier, Pipeline, PipelineResult, SourceRun, StopReason};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "listing_scraper")]
#[command(about = "Collects FINN listings into a CSV file, optionally classified by an LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all configured sources and write the CSV
    Run {
        /// Config file (defaults to $LISTING_SCRAPER_CONFIG or ./config.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Search query applied to every source
        #[arg(long)]
        query: Option<String>,
        /// Sources to run (comma-separated). Available: finn_jobs, finn_torget
        #[arg(long, value_delimiter = ',')]
        sources: Option<Vec<String>>,
        /// Only part-time positions (job sources)
        #[arg(long)]
        part_time: bool,
        /// Classify listings with Gemini (needs GEMINI_API_KEY)
        #[arg(long)]
        classify: bool,
        /// Listings per classifier request
        #[arg(long)]
        batch_size: Option<usize>,
        /// Output CSV path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the supported sources
    Sources,
}

fn parse_sources(names: Vec<String>) -> Result<Vec<Source>> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| n.parse::<Source>().map_err(anyhow::Error::from))
        .collect()
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let http: Arc<dyn HttpClientPort> = match config.request_timeout_secs {
        Some(secs) => Arc::new(ReqwestHttp::with_timeout(Duration::from_secs(secs))?),
        None => Arc::new(ReqwestHttp::new()),
    };

    let mut pipeline = Pipeline::new(config.output_path.clone());
    for source in &config.sources {
        pipeline = pipeline.with_source(SourceRun::new(
            create_adapter(source.kind, http.clone()),
            source.query.clone(),
            source.filters.clone(),
        ));
    }

    if config.classifier.enabled {
        let client = GeminiClassifier::from_env(config.classifier.model.as_deref())
            .context("classifier is enabled but could not be constructed")?;
        info!("Classifying with {} model {}", client.provider_name(), client.model());
        let mut classifier = BatchClassifier::new(Arc::new(client)).with_batch_size(config.batch_size);
        if let Some(rubric) = &config.classifier.rubric {
            classifier = classifier.with_rubric(rubric.clone());
        }
        pipeline = pipeline.with_classifier(classifier);
    }

    Ok(pipeline)
}

fn print_summary(result: &PipelineResult) {
    println!("\nPipeline results:");
    for summary in &result.per_source {
        let status = match &summary.stop {
            StopReason::Exhausted => "complete".to_string(),
            StopReason::Failed(reason) => format!("stopped early: {reason}"),
        };
        println!(
            "   {} ({}): {} listings from {} pages, {}",
            summary.source, summary.query, summary.listings, summary.pages, status
        );
    }
    if let Some(report) = &result.classification {
        println!(
            "   Classified in {} batches ({} failed): {} relevant, {} irrelevant, {} unclassified",
            report.batches, report.failed_batches, report.relevant, report.irrelevant, report.unclassified
        );
    }
    match &result.output_file {
        Some(path) => println!("   Output file: {}", path.display()),
        None => println!("   No listings found, no output written"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => {
            for name in get_supported_sources() {
                println!("{name}");
            }
        }
        Commands::Run {
            config,
            query,
            sources,
            part_time,
            classify,
            batch_size,
            output,
        } => {
            let overrides = Overrides {
                query,
                sources: sources.map(parse_sources).transpose()?,
                part_time,
                classify,
                batch_size,
                output_path: output,
            };
            let config_path = Config::resolve_path(config.as_deref());
            let config = Config::load(config.as_deref())?.apply(overrides)?;

            let _log_guard = init_logging(&config.log_dir);
            match &config_path {
                Some(path) => info!("Loaded config from {}", path.display()),
                None => info!("No config file found, using defaults"),
            }
            let metrics_handle = match init_metrics() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Metrics disabled: {}", e);
                    None
                }
            };

            let pipeline = build_pipeline(&config)?;
            let result = pipeline.run().await?;
            print_summary(&result);

            if let Some(handle) = metrics_handle {
                debug!("Run metrics:\n{}", handle.render());
            }
        }
    }
    Ok(())
}
