//! Command-line arguments and run options

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::settings::ConfigOverrides;
use crate::errors::DeployError;
use crate::logs::{LogLevel, LogOptions};
use crate::utils::VERSION;

/// Verify container images and deploy a Marathon group for one environment
#[derive(Debug, Clone, Parser)]
#[command(name = "deployctl", version = VERSION)]
pub struct CliArgs {
    /// Environment (e.g. "prod")
    #[arg(short = 'e', long = "env")]
    pub env: String,

    /// Config file
    #[arg(short = 'f', long = "file", default_value = "deploy.yaml")]
    pub config_file: PathBuf,

    /// Marathon host (e.g. "www.example.com"), overrides the config file
    #[arg(long = "marathon-host")]
    pub marathon_host: Option<String>,

    /// Marathon cURL options (e.g. '-H "OauthEmail: no-reply@example.com"'); only -H is supported
    #[arg(long = "marathon-curlopts", allow_hyphen_values = true)]
    pub marathon_curl_opts: Option<String>,

    /// Add ?force=true to the Marathon request
    #[arg(long = "marathon-force")]
    pub marathon_force: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub skip_prompt: bool,

    /// Verbose mode, e.g. dump the Marathon JSON
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long = "json-logs")]
    pub json_logs: bool,

    /// Timeout for each HTTP request, in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout_secs: u64,

    /// URL scheme used to reach registries
    #[arg(long = "registry-scheme", default_value = "https", hide = true)]
    pub registry_scheme: String,

    /// URL scheme used to reach Marathon
    #[arg(long = "marathon-scheme", default_value = "https", hide = true)]
    pub marathon_scheme: String,
}

impl CliArgs {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level.clone(),
            json_format: self.json_logs,
        }
    }

    /// Resolve paths and collect the options of a deployment run
    pub fn into_options(self) -> Result<AppOptions, DeployError> {
        let config_path = std::path::absolute(&self.config_file).map_err(|e| {
            DeployError::ConfigError(format!(
                "Error parsing config file path '{}': {}",
                self.config_file.display(),
                e
            ))
        })?;
        if !config_path.is_file() {
            return Err(DeployError::ConfigError(format!(
                "Invalid config file path '{}'",
                self.config_file.display()
            )));
        }

        Ok(AppOptions {
            config_path,
            overrides: ConfigOverrides {
                environment: self.env,
                marathon_host: self.marathon_host,
                marathon_curl_opts: self.marathon_curl_opts,
            },
            force: self.marathon_force,
            skip_prompt: self.skip_prompt,
            verbose: self.verbose,
            http: HttpOptions {
                timeout: Duration::from_secs(self.timeout_secs),
                registry_scheme: self.registry_scheme,
                marathon_scheme: self.marathon_scheme,
            },
        })
    }
}

/// Options of a single deployment run
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Absolute path of the config file; manifests are resolved next to it
    pub config_path: PathBuf,

    /// Environment and command-line overrides
    pub overrides: ConfigOverrides,

    /// Add `?force=true` to the submission
    pub force: bool,

    /// Submit without asking for confirmation
    pub skip_prompt: bool,

    /// Print the rendered payload
    pub verbose: bool,

    /// HTTP client options
    pub http: HttpOptions,
}

/// HTTP client options
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Timeout for each request
    pub timeout: Duration,

    /// Scheme for registry manifest requests
    pub registry_scheme: String,

    /// Scheme for Marathon requests
    pub marathon_scheme: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            registry_scheme: "https".to_string(),
            marathon_scheme: "https".to_string(),
        }
    }
}

impl AppOptions {
    /// Directory holding the config file
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
