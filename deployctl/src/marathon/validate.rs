//! Semantic validation of a parsed group

use crate::errors::DeployError;
use crate::marathon::models::{DeploymentApp, DeploymentGroup};

/// The only supported containerizer
pub const CONTAINER_TYPE_DOCKER: &str = "DOCKER";

/// Validate a group tree.
///
/// Each group checks its own id, then its apps in order, then its sub-groups in order;
/// the first failure is returned.
pub fn validate(group: &DeploymentGroup) -> Result<(), DeployError> {
    validate_group(group, "group")
}

fn validate_group(group: &DeploymentGroup, path: &str) -> Result<(), DeployError> {
    if group.id.is_empty() {
        return Err(DeployError::InvalidIdError(path.to_string()));
    }

    for (i, app) in group.apps.iter().flatten().enumerate() {
        validate_app(app, &format!("{}.apps[{}]", path, i))?;
    }

    for (i, child) in group.groups.iter().flatten().enumerate() {
        validate_group(child, &format!("{}.groups[{}]", path, i))?;
    }

    Ok(())
}

fn validate_app(app: &DeploymentApp, path: &str) -> Result<(), DeployError> {
    if app.id.is_empty() {
        return Err(DeployError::InvalidIdError(path.to_string()));
    }

    let container = app.container.as_ref();
    let container_type = container
        .and_then(|c| c.container_type.as_deref())
        .unwrap_or_default();
    if container_type != CONTAINER_TYPE_DOCKER {
        return Err(DeployError::InvalidContainerTypeError {
            path: path.to_string(),
            expected: CONTAINER_TYPE_DOCKER,
            found: container_type.to_string(),
        });
    }

    let image = container
        .and_then(|c| c.docker.as_ref())
        .and_then(|d| d.image.as_deref())
        .unwrap_or_default();
    if !has_tag(image) {
        return Err(DeployError::MissingImageTagError {
            path: path.to_string(),
            image: image.to_string(),
        });
    }

    Ok(())
}

/// Whether the last path segment of an image reference carries a `:tag`.
///
/// A registry port (`localhost:5000/app`) does not count as a tag.
fn has_tag(image: &str) -> bool {
    image
        .rsplit('/')
        .next()
        .map(|last| last.contains(':'))
        .unwrap_or(false)
}
