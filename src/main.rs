//! threatbrief - reactive indicator triage
//!
//! A CLI tool that sends indicators (text, file hash, URL, IP, domain and
//! files) to a set of analysis backends, keeps only the freshest answer of
//! each, and folds them into one final summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, unreadable file, etc.)
//!   2 - The run finished with an error reported by a backend

mod cli;
mod client;
mod config;
mod console;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use client::{Backend, HttpBackend};
use config::{Config, CONFIG_FILE};
use console::{parse_command, Command, HELP};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Field, Report, ReportMetadata, SelectedFile, Snapshot};
use pipeline::{Input, Pipeline, PipelineOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
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

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first so `general.verbose` can set the log level
    let (config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("threatbrief v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        ConfigSource::File(path) => info!("Loaded config from: {}", path),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(e) => warn!("Failed to load config, using defaults: {}", e),
    }

    let outcome = if args.interactive {
        run_interactive(args, config).await
    } else {
        run_once(args, config).await
    };

    match outcome {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .threatbrief.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your backend and adjust routes or timeouts.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` overrides the verbosity flags.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Where the configuration came from. Reported once logging is up.
enum ConfigSource {
    File(String),
    Defaults,
    Fallback(String),
}

/// Load configuration from file or use defaults, then apply CLI overrides.
///
/// An explicit `--config` must load; a broken default file falls back to
/// defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        (config, ConfigSource::File(config_path.display().to_string()))
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigSource::File(CONFIG_FILE.to_string())),
            Ok(None) => (Config::default(), ConfigSource::Defaults),
            Err(e) => (Config::default(), ConfigSource::Fallback(format!("{:#}", e))),
        }
    };

    config.merge_with_args(args);
    Ok((config, source))
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let backend = HttpBackend::new(config.backend.clone())
        .context("Failed to create backend client")?;
    info!("Backend: {}", backend.base_url());

    let backend: Arc<dyn Backend> = Arc::new(backend);
    Ok(Pipeline::new(
        backend,
        PipelineOptions::from(&config.pipeline),
    ))
}

/// Read a file from disk as an upload candidate.
async fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SelectedFile { name, bytes })
}

/// Feed every indicator given on the command line, wait for the pipeline
/// to settle and write the report. Returns exit code (0 or 2).
async fn run_once(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();
    let mut pipeline = build_pipeline(&config)?;

    for field in Field::ALL {
        if let Some(value) = field_arg(&args, field) {
            pipeline.submit(Input::Edit {
                field,
                value: value.to_string(),
            });
        }
    }

    if let Some(ref path) = args.file {
        let file = read_selected_file(path).await?;
        info!("Selected {} ({} bytes)", file.name, file.bytes.len());
        pipeline.submit(Input::SelectFile(file));
        pipeline.submit(Input::Upload);
    }

    if args.summarize {
        pipeline.submit(Input::Summarize);
    }

    let spinner = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Waiting for backend responses...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let settle_timeout = Duration::from_secs(config.pipeline.settle_timeout_seconds);
    let settled = tokio::time::timeout(settle_timeout, pipeline.settle()).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if settled.is_err() {
        warn!(
            "Gave up waiting after {}s with {} request(s) in flight",
            config.pipeline.settle_timeout_seconds,
            pipeline.in_flight()
        );
    }

    let snapshot = pipeline.snapshot();
    let report = build_report(&config, &pipeline, snapshot, start_time);
    write_report(&config, &report)?;

    let stats = report.metadata.stats;
    info!(
        "Done: {} issued, {} applied, {} stale discarded in {:.1}s",
        stats.issued, stats.applied, stats.discarded, report.metadata.duration_seconds
    );

    Ok(exit_code(&report.snapshot))
}

/// Read console commands from stdin while applying backend completions as
/// they arrive.
async fn run_interactive(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();
    let mut pipeline = build_pipeline(&config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_status = report::status_line(&pipeline.snapshot());

    if !args.quiet {
        println!("{}", HELP);
    }

    loop {
        tokio::select! {
            Some((ticket, completion)) = pipeline.next_completion(), if pipeline.in_flight() > 0 => {
                pipeline.apply(ticket, completion);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    debug!("End of input");
                    pipeline.settle().await;
                    break;
                };

                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => run_command(&config, &mut pipeline, command, start_time).await?,
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
        }

        let status = report::status_line(&pipeline.snapshot());
        if status != last_status {
            println!("{}", status);
            last_status = status;
        }
    }

    Ok(exit_code(&pipeline.snapshot()))
}

async fn run_command(
    config: &Config,
    pipeline: &mut Pipeline,
    command: Command,
    start_time: Instant,
) -> Result<()> {
    match command {
        Command::Set(field, value) => pipeline.submit(Input::Edit { field, value }),
        Command::File(path) => match read_selected_file(&path).await {
            Ok(file) => {
                println!("Selected {} ({} bytes)", file.name, file.bytes.len());
                pipeline.submit(Input::SelectFile(file));
            }
            Err(e) => eprintln!("{:#}", e),
        },
        Command::Upload => pipeline.submit(Input::Upload),
        Command::Summarize => pipeline.submit(Input::Summarize),
        Command::Show => {
            let report = build_report(config, pipeline, pipeline.snapshot(), start_time);
            println!("{}", render_report(config, &report)?);
        }
        Command::Wait => pipeline.settle().await,
        Command::Help => println!("{}", HELP),
        // Handled by the caller.
        Command::Quit => {}
    }
    Ok(())
}

fn field_arg(args: &Args, field: Field) -> Option<&str> {
    match field {
        Field::Text => args.text.as_deref(),
        Field::Hash => args.hash.as_deref(),
        Field::Url => args.url.as_deref(),
        Field::Ip => args.ip.as_deref(),
        Field::Domain => args.domain.as_deref(),
    }
}

fn build_report(
    config: &Config,
    pipeline: &Pipeline,
    snapshot: Snapshot,
    start_time: Instant,
) -> Report {
    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        backend_url: config.backend.url.clone(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
        stats: pipeline.stats(),
    };

    Report { metadata, snapshot }
}

fn render_report(config: &Config, report: &Report) -> Result<String> {
    match OutputFormat::from_config(&config.general.format) {
        OutputFormat::Json => report::generate_json_report(report),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(report)),
    }
}

fn write_report(config: &Config, report: &Report) -> Result<()> {
    let output = render_report(config, report)?;

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to: {}", path);
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// 2 when the shared error slot is set, 0 otherwise.
fn exit_code(snapshot: &Snapshot) -> i32 {
    if snapshot.error.is_some() {
        2
    } else {
        0
    }
}
