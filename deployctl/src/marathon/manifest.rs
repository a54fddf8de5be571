//! Manifest loading: template → YAML → validated group → JSON

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::marathon::models::DeploymentGroup;
use crate::marathon::validate::validate;
use crate::template;

/// Variables available to manifest templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestVars {
    /// Image key to fully-qualified image, used as `{{ images.<key> }}`
    pub images: BTreeMap<String, String>,
}

/// Load, render, parse and validate a manifest, returning the JSON payload
pub async fn prepare(path: &Path, vars: &ManifestVars) -> Result<Vec<u8>, DeployError> {
    info!("Preparing Marathon manifest {}", path.display());

    let raw = File::new(path).read_string().await?;
    let rendered = template::render(&raw, vars)?;
    let group = parse_yaml(&rendered)?;
    validate(&group)?;
    let json = to_json(&group)?;

    debug!("Rendered {} bytes of JSON for group {}", json.len(), group.id);
    Ok(json)
}

/// Parse a rendered manifest into a group.
///
/// An empty document yields an empty group, which validation then rejects.
pub fn parse_yaml(text: &str) -> Result<DeploymentGroup, DeployError> {
    if text.trim().is_empty() {
        return Ok(DeploymentGroup::default());
    }
    serde_yaml::from_str(text)
        .map_err(|e| DeployError::ParseError(format!("Invalid Marathon YAML: {}", e)))
}

/// Render a group as JSON indented by four spaces
pub fn to_json(group: &DeploymentGroup) -> Result<Vec<u8>, DeployError> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    group.serialize(&mut serializer)?;
    Ok(out)
}
