//! Resolve configured image keys to fully-qualified descriptors

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::settings::{EnvironmentConfig, ImageConfig};
use crate::errors::DeployError;
use crate::images::descriptor::ImageDescriptor;
use crate::images::tag_vars::TagVarsCache;

/// Resolve every image of `environment`, overrides taking precedence over `defaults`.
///
/// Keys are resolved in sorted order and the first failure aborts resolution.
pub async fn resolve(
    defaults: &ImageConfig,
    environments: &BTreeMap<String, EnvironmentConfig>,
    environment: &str,
    tag_vars: &TagVarsCache,
) -> Result<BTreeMap<String, ImageDescriptor>, DeployError> {
    let env = environments.get(environment).ok_or_else(|| {
        DeployError::ConfigError(format!("Environment {} not found in config", environment))
    })?;

    let mut images = BTreeMap::new();
    for (image_key, overrides) in &env.images {
        let repository = pick(&overrides.repository, &defaults.repository)
            .ok_or_else(|| missing("repository", image_key))?;
        let name = pick(&overrides.name, &defaults.name).ok_or_else(|| missing("name", image_key))?;
        let tag_template = pick(&overrides.tag_template, &defaults.tag_template)
            .ok_or_else(|| missing("tag", image_key))?;

        let tag = tag_vars.render_tag(tag_template).await?;
        let image = ImageDescriptor::new(repository, name, tag);
        debug!("Resolved image {} = {}", image_key, image);
        images.insert(image_key.clone(), image);
    }

    Ok(images)
}

fn pick<'a>(value: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.as_deref().filter(|v| !v.is_empty()))
}

fn missing(field: &'static str, image_key: &str) -> DeployError {
    DeployError::MissingFieldError {
        field,
        image_key: image_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::images::tag_vars::tests::FakeGit;

    fn image(repository: Option<&str>, name: Option<&str>, tag: Option<&str>) -> ImageConfig {
        ImageConfig {
            repository: repository.map(String::from),
            name: name.map(String::from),
            tag_template: tag.map(String::from),
        }
    }

    fn environments(key: &str, overrides: ImageConfig) -> BTreeMap<String, EnvironmentConfig> {
        let mut env = EnvironmentConfig::default();
        env.images.insert(key.to_string(), overrides);
        let mut environments = BTreeMap::new();
        environments.insert("prod".to_string(), env);
        environments
    }

    fn cache() -> TagVarsCache {
        TagVarsCache::new(Arc::new(FakeGit::default()))
    }

    #[tokio::test]
    async fn test_resolve_defaults() {
        let defaults = image(Some("index.docker.io"), None, Some("latest"));
        let envs = environments("hello", image(None, Some("library/hello-world"), None));

        let images = resolve(&defaults, &envs, "prod", &cache()).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(
            images["hello"],
            ImageDescriptor::new("index.docker.io", "library/hello-world", "latest")
        );
    }

    #[tokio::test]
    async fn test_resolve_override_wins() {
        let defaults = image(Some("index.docker.io"), Some("library/default"), Some("latest"));
        let envs = environments(
            "api",
            image(Some("registry.example.com"), Some("team/api"), Some("{{ git_branch }}")),
        );

        let images = resolve(&defaults, &envs, "prod", &cache()).await.unwrap();
        assert_eq!(
            images["api"],
            ImageDescriptor::new("registry.example.com", "team/api", "main")
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_fields() {
        let cases = [
            (image(None, Some("n"), Some("t")), "Could not find image repository in config for hello"),
            (image(Some("r"), None, Some("t")), "Could not find image name in config for hello"),
            (image(Some("r"), Some("n"), None), "Could not find image tag in config for hello"),
        ];

        for (overrides, expected) in cases {
            let envs = environments("hello", overrides);
            let err = resolve(&ImageConfig::default(), &envs, "prod", &cache())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_environment() {
        let envs = environments("hello", ImageConfig::default());
        let err = resolve(&ImageConfig::default(), &envs, "qa", &cache())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_resolve_bad_tag_template() {
        let envs = environments("hello", image(Some("r"), Some("n"), Some("{{ unknown_var }}")));
        let err = resolve(&ImageConfig::default(), &envs, "prod", &cache())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::TemplateError(_)));
    }
}
