//! ConsentLens - what could be inferred about you from your own files?
//!
//! Ingests a local folder of emails, notes, CVs and transcripts, runs
//! attribute inference over several document slices and explains each
//! prediction with signal terms and supporting sentences.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreachable API, failed request, etc.)

mod analysis;
mod cli;
mod client;
mod config;
mod explanation;
mod inference;
mod ingestion;
mod models;
mod report;
mod server;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command, ReportArgs, ScanArgs, TrainArgs};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisRequest, DocType};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    if matches!(args.command, Command::Serve(_)) {
        init_server_logging(&args);
    } else {
        init_logging(&args);
    }

    info!("ConsentLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .consentlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the API address, ingestion excludes, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Server logging honours RUST_LOG and includes request traces.
fn init_server_logging(args: &Args) {
    let default_filter = if args.verbose {
        "consentlens=debug,tower_http=debug"
    } else if args.quiet {
        "consentlens=warn,tower_http=warn"
    } else {
        "consentlens=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Dispatch the subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match &args.command {
        Command::Serve(_) => {
            println!("🚀 Starting ConsentLens API on {}", config.server.bind_addr);
            println!("   Models: {}", config.server.artifacts_dir.display());
            server::serve(&config).await?;
            Ok(0)
        }
        Command::Train(train) => handle_train(train, args.quiet),
        Command::Scan(scan) => handle_scan(scan, &config),
        Command::Report(report) => handle_report(report, &config, args.quiet).await,
        Command::InitConfig => handle_init_config().map(|_| 0),
    }
}

/// Train all attribute models and write their artifacts.
fn handle_train(train: &TrainArgs, quiet: bool) -> Result<i32> {
    let start_time = Instant::now();
    println!("🧠 Training attribute models");
    println!("   Data: {}", train.data_path.display());

    let written = inference::train::train_all(&train.data_path, &train.output_dir, !quiet)
        .with_context(|| format!("Training failed for {}", train.data_path.display()))?;

    for path in &written {
        println!("     📦 {}", path.display());
    }
    println!(
        "\n✅ Trained {} models in {:.1}s. Artifacts saved to: {}",
        written.len(),
        start_time.elapsed().as_secs_f64(),
        train.output_dir.display()
    );
    Ok(0)
}

/// Ingest a folder locally and list what the API would index.
fn handle_scan(scan: &ScanArgs, config: &Config) -> Result<i32> {
    println!("\n🔍 Scanning {} (no API call)...\n", scan.folder.display());

    let options = ingestion::IngestOptions::from(&config.ingest);
    let documents = ingestion::FolderIngester::new(options).ingest_folder(&scan.folder)?;

    if documents.is_empty() {
        println!("   No supported documents were found in that folder.");
        return Ok(0);
    }

    let mut store = store::DocumentStore::new();
    store.replace_all(documents);

    println!("   Found {} documents:\n", store.len());
    for doc in store.all() {
        println!(
            "     📄 [{}] {} ({} chars)",
            doc.doc_type,
            doc.source_file,
            doc.clean_text.chars().count()
        );
    }
    println!();
    for (doc_type, count) in store.counts_by_type() {
        println!("   {}: {}", report::friendly_label(&doc_type), count);
    }

    println!("\n✅ Scan complete.");
    Ok(0)
}

/// Ingest through the API, analyze and render the scenarios.
async fn handle_report(report_args: &ReportArgs, config: &Config, quiet: bool) -> Result<i32> {
    let api = client::ApiClient::new(&config.client.api_url, config.client.timeout_seconds)?;
    println!("📥 Ingesting {} via {}", report_args.folder, api.base_url());
    let mut controller = client::Controller::new(api);

    let spinner = busy_spinner(quiet, "Indexing documents...");
    let ingested = controller.submit_ingest(&report_args.folder).await;
    spinner.finish_and_clear();
    if ingested.is_err() {
        return Ok(fail_with(&controller));
    }

    if !report_args.ingest_only && controller.can_analyze() {
        let request = build_analysis_request(report_args, config);
        println!("🔬 Running scenario analysis...");
        let spinner = busy_spinner(quiet, "Analyzing scenarios...");
        let analyzed = controller.run_analysis_with(&request).await;
        spinner.finish_and_clear();
        if analyzed.is_err() {
            return Ok(fail_with(&controller));
        }
    }

    let Some(ingest) = controller.ingest_summary() else {
        return Ok(fail_with(&controller));
    };
    let session = report::SessionReport::new(ingest, controller.analysis());
    let output = session.render(config.report.format)?;

    match &report_args.output {
        Some(path) => {
            report::write_report(&output, path)?;
            println!("\n✅ Report saved to: {}", path.display());
        }
        None => {
            println!();
            print!("{}", output);
        }
    }

    Ok(0)
}

fn build_analysis_request(report_args: &ReportArgs, config: &Config) -> AnalysisRequest {
    // Names were checked by Args::validate.
    let doc_types = report_args.doc_types.as_ref().map(|names| {
        names
            .iter()
            .filter_map(|name| name.parse::<DocType>().ok())
            .collect::<Vec<_>>()
    });

    AnalysisRequest {
        doc_types,
        top_k_features: report_args
            .top_k_features
            .unwrap_or(config.analysis.top_k_features),
        max_supporting_sentences: report_args
            .max_supporting_sentences
            .unwrap_or(config.analysis.max_supporting_sentences),
    }
}

fn busy_spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("   {spinner} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn fail_with(controller: &client::Controller) -> i32 {
    let message = controller.error_message().unwrap_or("Request failed");
    eprintln!("\n❌ {}", message);
    1
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
