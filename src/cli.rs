//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// threatbrief - one brief from many threat-intel backends
///
/// Feed indicators (text, file hash, URL, IP, domain, file) to the
/// summarizer, reputation, DNS and upload backends and get a single
/// aggregated report.
///
/// Examples:
///   threatbrief --hash 44d88612fea8a8f36de82e1278abb02f
///   threatbrief --url http://malware.test --domain malware.test --format json
///   threatbrief --file ./invoice.pdf --text "attachment from unknown sender" --summarize
///   threatbrief --interactive
///   threatbrief --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Free text to summarize (sent only with --summarize or `summarize`)
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// File hash to look up
    #[arg(long, value_name = "HASH")]
    pub hash: Option<String>,

    /// URL to look up
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// IP address to look up
    #[arg(long, value_name = "IP")]
    pub ip: Option<String>,

    /// Domain for the DNS reputation lookup
    #[arg(long, value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// File to upload for metadata extraction
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Request a language-model summary of --text
    #[arg(short, long)]
    pub summarize: bool,

    /// Read commands from stdin instead of running once
    #[arg(short, long)]
    pub interactive: bool,

    /// Backend base URL
    #[arg(long, value_name = "URL", env = "THREATBRIEF_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Let superseded requests run to completion (their responses are still discarded)
    #[arg(long)]
    pub keep_superseded: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .threatbrief.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .threatbrief.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a config file value; unknown values fall back to Markdown.
    pub fn from_config(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether any indicator or action was given on the command line.
    pub fn has_indicators(&self) -> bool {
        self.text.is_some()
            || self.hash.is_some()
            || self.url.is_some()
            || self.ip.is_some()
            || self.domain.is_some()
            || self.file.is_some()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.interactive && !self.has_indicators() {
            return Err(
                "Provide at least one of --text, --hash, --url, --ip, --domain, --file, or use --interactive"
                    .to_string(),
            );
        }

        if self.summarize && self.text.is_none() && !self.interactive {
            return Err("--summarize needs --text".to_string());
        }

        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref path) = self.file {
            if !path.is_file() {
                return Err(format!("File does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings. `--quiet` wins over
    /// a config file that asks for verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
