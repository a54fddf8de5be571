//! Marathon group models
//!
//! Every optional field is an `Option` and is left out of the rendered JSON when it was
//! absent from the manifest. A field that is present keeps its value even when it is zero,
//! so `ports: [0]` (dynamic port assignment) survives rendering.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A Marathon group: nested apps and sub-groups deployed together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentGroup {
    /// Group path, e.g. `/team/service`
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<Vec<DeploymentApp>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<DeploymentGroup>>,
}

/// A single Marathon application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeploymentApp {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<f64>,

    /// Memory in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,

    /// Disk in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Vec<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch: Option<Vec<FetchUri>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_urls: Option<Vec<String>>,

    /// Service ports; `0` asks Marathon to assign one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_definitions: Option<Vec<PortDefinition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_ports: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_launch_delay_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_kill_grace_period_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_checks: Option<Vec<HealthCheck>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_strategy: Option<UpgradeStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddress>,
}

/// An artifact fetched into the sandbox before launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchUri {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
}

/// A named service port
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortDefinition {
    /// Always rendered; `0` means dynamically assigned
    #[serde(default)]
    pub port: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Container specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Container {
    /// Containerizer; only `DOCKER` passes validation
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerContainer>,
}

/// A volume mounted into the container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,

    /// `RO` or `RW`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Docker engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerContainer {
    /// Image reference; must carry a tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<DockerParameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_pull_image: Option<bool>,
}

/// A `docker run` option passed through as `--key=value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerParameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthCheck {
    /// `HTTP`, `HTTPS`, `TCP` or `COMMAND`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<HealthCheckCommand>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_index: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_failures: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthCheckCommand {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpgradeStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_health_capacity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_over_capacity: Option<f64>,
}

/// IP-per-task networking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IpAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
}

/// Response body of a group update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub details: Vec<ResultDetail>,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub deployment_id: String,
}

/// Validation errors Marathon reports for one path of the submitted group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub errors: Vec<String>,
}

impl fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message: '{}', version: '{}', deploymentId: '{}'",
            self.message, self.version, self.deployment_id
        )?;
        for detail in &self.details {
            write!(f, "\n  {}: {}", detail.path, detail.errors.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_display() {
        let result = DeploymentResult {
            message: "Object is not valid".to_string(),
            details: vec![ResultDetail {
                path: "/apps(0)/cpus".to_string(),
                errors: vec!["must be positive".to_string(), "required".to_string()],
            }],
            ..Default::default()
        };
        assert_eq!(
            result.to_string(),
            "message: 'Object is not valid', version: '', deploymentId: ''\n  /apps(0)/cpus: must be positive; required"
        );
    }

    #[test]
    fn test_result_parse_partial() {
        let result: DeploymentResult =
            serde_json::from_str(r#"{"version":"2024-01-01T00:00:00Z","deploymentId":"abc123"}"#).unwrap();
        assert_eq!(result.deployment_id, "abc123");
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_volume_without_container_path() {
        let volume: Volume = serde_yaml::from_str("hostPath: /x").unwrap();
        assert_eq!(volume.container_path, None);
        assert_eq!(serde_json::to_string(&volume).unwrap(), r#"{"hostPath":"/x"}"#);

        let volume: Volume = serde_yaml::from_str("containerPath: /run/pald\nmode: RO").unwrap();
        assert_eq!(
            serde_json::to_string(&volume).unwrap(),
            r#"{"containerPath":"/run/pald","mode":"RO"}"#
        );
    }
}
