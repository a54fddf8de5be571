//! Deployment run: config → images → manifest → Marathon

use std::collections::BTreeMap;
use std::sync::Arc;

use colored::Colorize;
use futures::future::try_join_all;
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::config::headers::{redacted, to_header_map};
use crate::config::settings::DeployConfig;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::images::descriptor::ImageDescriptor;
use crate::images::git::GitCli;
use crate::images::resolver::resolve;
use crate::images::tag_vars::TagVarsCache;
use crate::marathon::client::MarathonClient;
use crate::marathon::manifest::{prepare, ManifestVars};
use crate::marathon::models::DeploymentResult;
use crate::registry::client::RegistryClient;

/// Run one deployment.
///
/// `confirm` is asked before anything is submitted unless `skip_prompt` is set; it runs on
/// the blocking pool since terminal prompts block. Any error aborts the run and nothing is
/// submitted after a failed stage.
pub async fn run<F>(options: AppOptions, confirm: F) -> Result<DeploymentResult, DeployError>
where
    F: FnOnce(&str) -> Result<bool, DeployError> + Send + 'static,
{
    let environment = options.overrides.environment.clone();

    // Config
    let data = File::new(&options.config_path).read_bytes().await?;
    let config = DeployConfig::load(&data, &options.overrides)?;
    println!("Environment: {}", environment.bold());
    println!("Config File: {}", options.config_path.display());

    // Images
    let tag_vars = TagVarsCache::new(Arc::new(GitCli::new(options.config_dir())));
    let images = resolve(&config.image, &config.environments, &environment, &tag_vars).await?;
    verify_images(&options, &images).await?;

    let vars = ManifestVars {
        images: images
            .iter()
            .map(|(key, image)| (key.clone(), image.to_string()))
            .collect(),
    };
    println!("Images:");
    for (key, image) in &vars.images {
        println!("* {} = {}", key, image.green());
    }

    // Manifest
    if config.marathon.host.is_empty() {
        return Err(DeployError::ConfigError(
            "Deploy target unknown. Valid options: Marathon".to_string(),
        ));
    }
    let manifest_file = &config.environment(&environment)?.marathon.file;
    let payload = prepare(&options.config_dir().join(manifest_file), &vars).await?;

    let marathon = MarathonClient::new(options.http.timeout)?.with_scheme(&options.http.marathon_scheme);
    println!("Marathon File: {}", manifest_file);
    println!("Marathon URL: {}", marathon.groups_url(&config.marathon.host, options.force));
    if !config.marathon.headers.is_empty() {
        println!("Marathon Headers:");
        for (key, value) in redacted(&config.marathon.headers) {
            println!("* {} = {}", key, value);
        }
    }
    if options.verbose {
        println!("Marathon Config: {}", String::from_utf8_lossy(&payload));
    }

    // Submit
    if !options.skip_prompt && !ask(confirm).await? {
        warn!("Deployment of {} declined at prompt", environment);
        return Err(DeployError::CancelledError("Deployment cancelled".to_string()));
    }

    let headers = to_header_map(&config.marathon.headers)?;
    let result = marathon
        .submit(&config.marathon.host, &payload, &headers, options.force)
        .await?;

    info!(
        "Deployed {} to {} as {}",
        environment, config.marathon.host, result.deployment_id
    );
    Ok(result)
}

async fn ask<F>(confirm: F) -> Result<bool, DeployError>
where
    F: FnOnce(&str) -> Result<bool, DeployError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || confirm("Deploy?"))
        .await
        .map_err(|e| DeployError::CancelledError(format!("Confirmation prompt failed: {}", e)))?
}

/// Check every image concurrently; the first failure wins
async fn verify_images(
    options: &AppOptions,
    images: &BTreeMap<String, ImageDescriptor>,
) -> Result<(), DeployError> {
    let registry = RegistryClient::new(options.http.timeout)?.with_scheme(&options.http.registry_scheme);
    info!("Verifying {} image(s)", images.len());
    try_join_all(images.values().map(|image| registry.check_exists(image))).await?;
    Ok(())
}
