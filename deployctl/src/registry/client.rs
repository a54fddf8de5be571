//! Registry image existence checks

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::DeployError;
use crate::images::descriptor::ImageDescriptor;
use crate::registry::challenge::RegistryChallenge;

/// Outcome of a manifest request that did not fail outright
#[derive(Debug)]
enum ManifestStatus {
    /// Image and tag exist
    Found,

    /// Registry answered 401, with the `WWW-Authenticate` header if any
    Unauthorized { challenge: Option<String> },
}

/// Authentication state of a single existence check.
///
/// `Unauthenticated` may move to `Authenticated` once; a 401 in `Authenticated` moves to
/// `Failed`, so a second challenge is never followed.
#[derive(Debug)]
enum AuthState {
    Unauthenticated,
    Authenticated { token: String },
    Failed(DeployError),
}

#[derive(Debug, Default, Deserialize)]
struct ManifestResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    error: Option<RegistryErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    detail: Option<RegistryErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryErrorDetail {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    action: String,
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Client for the registry v2 manifest API
pub struct RegistryClient {
    client: Client,
    scheme: String,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(timeout: Duration) -> Result<Self, DeployError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            scheme: "https".to_string(),
        })
    }

    /// Use a different URL scheme for manifest requests (e.g. `http` for local registries)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Manifest endpoint for an image
    pub fn manifest_url(&self, image: &ImageDescriptor) -> String {
        format!(
            "{}://{}/v2/{}/manifests/{}",
            self.scheme, image.repository, image.name, image.tag
        )
    }

    /// Verify `image` exists, answering at most one bearer challenge
    pub async fn check_exists(&self, image: &ImageDescriptor) -> Result<(), DeployError> {
        image.validate()?;

        let mut state = AuthState::Unauthenticated;
        loop {
            state = match state {
                AuthState::Unauthenticated => match self.fetch_manifest(image, None).await {
                    Ok(ManifestStatus::Found) => break,
                    Ok(ManifestStatus::Unauthorized { challenge }) => {
                        debug!("Registry requires authentication for {}", image);
                        match self.authenticate(challenge.as_deref()).await {
                            Ok(token) => AuthState::Authenticated { token },
                            Err(e) => AuthState::Failed(e),
                        }
                    }
                    Err(e) => AuthState::Failed(e),
                },
                AuthState::Authenticated { token } => {
                    match self.fetch_manifest(image, Some(&token)).await {
                        Ok(ManifestStatus::Found) => break,
                        Ok(ManifestStatus::Unauthorized { .. }) => {
                            AuthState::Failed(DeployError::UnexpectedAuthError(self.manifest_url(image)))
                        }
                        Err(e) => AuthState::Failed(e),
                    }
                }
                AuthState::Failed(e) => {
                    warn!("Image check failed for {}: {}", image, e);
                    return Err(e);
                }
            };
        }

        info!("Verified image {}", image);
        Ok(())
    }

    async fn authenticate(&self, challenge: Option<&str>) -> Result<String, DeployError> {
        let challenge = RegistryChallenge::parse(challenge.unwrap_or_default())?;
        self.fetch_token(&challenge).await
    }

    async fn fetch_manifest(
        &self,
        image: &ImageDescriptor,
        token: Option<&str>,
    ) -> Result<ManifestStatus, DeployError> {
        let url = self.manifest_url(image);
        debug!("GET {} (authenticated: {})", url, token.is_some());

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeployError::from_transport("GET", &url, e))?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => {
                let challenge = response
                    .headers()
                    .get(header::WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                Ok(ManifestStatus::Unauthorized { challenge })
            }
            StatusCode::NOT_FOUND => Err(DeployError::ImageNotFoundError(image.to_string())),
            StatusCode::OK => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| DeployError::from_transport("GET", &url, e))?;
                check_manifest_body(&url, &body)?;
                Ok(ManifestStatus::Found)
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(DeployError::UnexpectedStatusError {
                    method: "GET",
                    url,
                    status: status.to_string(),
                    body,
                })
            }
        }
    }

    async fn fetch_token(&self, challenge: &RegistryChallenge) -> Result<String, DeployError> {
        let mut auth_url = Url::parse(&challenge.realm).map_err(|e| DeployError::TokenError {
            url: challenge.realm.clone(),
            reason: format!("Error parsing realm URL: {}", e),
        })?;
        auth_url
            .query_pairs_mut()
            .clear()
            .append_pair("service", &challenge.service)
            .append_pair("scope", &challenge.scope);
        let auth_url = auth_url.to_string();
        debug!("GET {} (token)", auth_url);

        let token_error = |reason: String| DeployError::TokenError {
            url: auth_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&auth_url)
            .send()
            .await
            .map_err(|e| DeployError::from_transport("GET", &auth_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeployError::from_transport("GET", &auth_url, e))?;
        if !status.is_success() {
            return Err(token_error(format!("Unexpected response status {}: {}", status, body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| token_error(format!("Error parsing json: {}", e)))?;

        match parsed.token.or(parsed.access_token) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(token_error(format!("Auth token invalid. Response: {}", body))),
        }
    }
}

fn check_manifest_body(url: &str, body: &str) -> Result<(), DeployError> {
    let registry_error = |reason: String| DeployError::RegistryError {
        url: url.to_string(),
        reason,
    };

    let manifest: ManifestResponse = serde_json::from_str(body)
        .map_err(|e| registry_error(format!("Error parsing response json: {}", e)))?;

    if let Some(error) = manifest.error.as_ref().filter(|e| !e.code.is_empty()) {
        let detail = error
            .detail
            .as_ref()
            .map(|d| format!(" (type: {}, name: {}, action: {})", d.kind, d.name, d.action))
            .unwrap_or_default();
        return Err(registry_error(format!("({}) {}{}", error.code, error.message, detail)));
    }

    if manifest.name.is_empty() || manifest.tag.is_empty() {
        return Err(registry_error(format!(
            "Image name/tag invalid: name '{}', tag '{}'",
            manifest.name, manifest.tag
        )));
    }

    Ok(())
}
