//! Deploy configuration file

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::config::headers::{parse_curl_headers, HeaderPair};
use crate::errors::DeployError;

/// Top-level deploy configuration (`deploy.yaml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployConfig {
    /// Marathon scheduler settings
    #[serde(default)]
    pub marathon: MarathonSettings,

    /// Image defaults shared by every environment
    #[serde(default)]
    pub image: ImageConfig,

    /// Environment name to environment settings
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

/// Marathon scheduler settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarathonSettings {
    /// Scheduler host, without scheme or path
    #[serde(default)]
    pub host: String,

    /// Extra request headers sent with every submission
    #[serde(default, deserialize_with = "header_pairs")]
    pub headers: Vec<HeaderPair>,
}

fn header_pairs<'de, D>(deserializer: D) -> Result<Vec<HeaderPair>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(BTreeMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .collect())
}

/// Image coordinates; every field may be overridden per environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tag_template: Option<String>,
}

/// Settings for one deploy environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub marathon: EnvironmentMarathon,

    /// Logical image key to image overrides
    #[serde(default)]
    pub images: BTreeMap<String, ImageConfig>,
}

/// Per-environment Marathon settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentMarathon {
    /// Manifest path, relative to the config file's directory
    #[serde(default)]
    pub file: String,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub environment: String,
    pub marathon_host: Option<String>,
    pub marathon_curl_opts: Option<String>,
}

impl DeployConfig {
    /// Parse a config document and apply command-line overrides
    pub fn load(data: &[u8], overrides: &ConfigOverrides) -> Result<Self, DeployError> {
        let mut config: DeployConfig = serde_yaml::from_slice(data)
            .map_err(|e| DeployError::ParseError(format!("Invalid config YAML: {}", e)))?;

        if !config.environments.contains_key(&overrides.environment) {
            return Err(DeployError::ConfigError(format!(
                "Environment {} not found in config",
                overrides.environment
            )));
        }

        if let Some(host) = overrides.marathon_host.as_deref().filter(|h| !h.is_empty()) {
            config.marathon.host = host.to_string();
        }

        if let Some(curl_opts) = overrides.marathon_curl_opts.as_deref().filter(|o| !o.is_empty()) {
            config.marathon.headers = parse_curl_headers(curl_opts);
        }

        if config.marathon.host.contains('/') {
            return Err(DeployError::ConfigError(format!(
                "Marathon hostname cannot contain forward slash. Found: {}",
                config.marathon.host
            )));
        }

        Ok(config)
    }

    /// Settings for a named environment
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, DeployError> {
        self.environments
            .get(name)
            .ok_or_else(|| DeployError::ConfigError(format!("Environment {} not found in config", name)))
    }
}
