//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.threatbrief.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".threatbrief.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Pipeline behaviour.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output path. Stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format: "markdown" or "json".
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "markdown".to_string()
}

/// Where and how the analysis backends are reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Route of each capability, relative to `url`.
    #[serde(default)]
    pub routes: RoutesConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: default_timeout(),
            routes: RoutesConfig::default(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// Backend routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_summarize_route")]
    pub summarize: String,
    #[serde(default = "default_scan_route")]
    pub scan: String,
    #[serde(default = "default_dns_route")]
    pub dns: String,
    #[serde(default = "default_upload_route")]
    pub upload: String,
    #[serde(default = "default_aggregate_route")]
    pub aggregate: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            summarize: default_summarize_route(),
            scan: default_scan_route(),
            dns: default_dns_route(),
            upload: default_upload_route(),
            aggregate: default_aggregate_route(),
        }
    }
}

fn default_summarize_route() -> String {
    "/gpt".to_string()
}

fn default_scan_route() -> String {
    "/vt/scan".to_string()
}

fn default_dns_route() -> String {
    "/vt/dns".to_string()
}

fn default_upload_route() -> String {
    "/upload".to_string()
}

fn default_aggregate_route() -> String {
    "/complete_summary".to_string()
}

/// Pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Abort a group's in-flight request when a newer one is issued.
    /// Stale responses are discarded either way.
    #[serde(default = "default_true")]
    pub abort_superseded: bool,

    /// Upper bound on how long a one-shot run waits for in-flight calls.
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            abort_superseded: true,
            settle_timeout_seconds: default_settle_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_settle_timeout() -> u64 {
    600
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(format) = args.format {
            self.general.format = format.as_str().to_string();
        }

        if args.keep_superseded {
            self.pipeline.abort_superseded = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.backend.routes.scan, "/vt/scan");
        assert_eq!(config.backend.routes.aggregate, "/complete_summary");
        assert!(config.pipeline.abort_superseded);
        assert_eq!(config.general.output, None);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "json"
verbose = true

[backend]
url = "https://triage.internal"
timeout_seconds = 30

[backend.routes]
scan = "/api/v2/scan"

[pipeline]
abort_superseded = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, "json");
        assert!(config.general.verbose);
        assert_eq!(config.backend.url, "https://triage.internal");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.backend.routes.scan, "/api/v2/scan");
        assert_eq!(config.backend.routes.dns, "/vt/dns");
        assert!(!config.pipeline.abort_superseded);
        assert_eq!(config.pipeline.settle_timeout_seconds, 600);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[backend]\nurl = \"http://10.1.2.3:9000\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.url, "http://10.1.2.3:9000");
        assert_eq!(config.backend.timeout_seconds, 120);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[backend\nurl = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[backend.routes]"));
        assert!(toml_str.contains("[pipeline]"));
    }
}
