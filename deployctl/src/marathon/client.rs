//! Marathon group submission

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client};
use tracing::{debug, error, info};

use crate::errors::DeployError;
use crate::marathon::models::DeploymentResult;

const GROUPS_PATH: &str = "v2/groups";

/// HTTP client for the Marathon groups API
pub struct MarathonClient {
    client: Client,
    scheme: String,
}

impl MarathonClient {
    /// Create a new Marathon client; redirects are reported, never followed
    pub fn new(timeout: Duration) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            scheme: "https".to_string(),
        })
    }

    /// Use a different URL scheme (e.g. `http` for a local Marathon)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Groups endpoint for `host`
    pub fn groups_url(&self, host: &str, force: bool) -> String {
        let mut url = format!("{}://{}/{}", self.scheme, host, GROUPS_PATH);
        if force {
            url.push_str("?force=true");
        }
        url
    }

    /// PUT a rendered group and interpret Marathon's answer
    pub async fn submit(
        &self,
        host: &str,
        payload: &[u8],
        headers: &HeaderMap,
        force: bool,
    ) -> Result<DeploymentResult, DeployError> {
        let url = self.groups_url(host, force);
        debug!("PUT {}", url);

        let mut request_headers = headers.clone();
        request_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .put(&url)
            .headers(request_headers)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| DeployError::from_transport("PUT", &url, e))?;

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| DeployError::from_transport("PUT", &url, e))?;

        let result = parse_result(&body).map_err(|e| {
            DeployError::ParseError(format!(
                "Error parsing response json ({}): {}\nResponse:\n{}",
                status, e, body
            ))
        })?;

        if status.is_redirection() {
            error!("Marathon redirected the deployment to '{}'", location);
            return Err(DeployError::RedirectError {
                status: status.to_string(),
                location,
                result: result.to_string(),
            });
        }
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            error!("Marathon rejected the group: {}", result.message);
            return Err(DeployError::SchedulerRejectedError {
                status: status.to_string(),
                result: result.to_string(),
                payload: String::from_utf8_lossy(payload).into_owned(),
            });
        }
        if !status.is_success() {
            error!("Marathon PUT failed: {}", status);
            return Err(DeployError::UnexpectedStatusError {
                method: "PUT",
                url,
                status: status.to_string(),
                body: result.to_string(),
            });
        }
        if result.deployment_id.is_empty() {
            return Err(DeployError::IncompleteResultError(result.to_string()));
        }

        info!("Marathon accepted deployment {}", result.deployment_id);
        Ok(result)
    }
}

/// Parse a response body, treating an empty body as an empty result
fn parse_result(body: &str) -> Result<DeploymentResult, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(DeploymentResult::default());
    }
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_url() {
        let client = MarathonClient::new(Duration::from_secs(5)).unwrap();
        assert_eq!(client.groups_url("example.com", false), "https://example.com/v2/groups");
        assert_eq!(
            client.groups_url("example.com", true),
            "https://example.com/v2/groups?force=true"
        );
    }

    #[test]
    fn test_parse_result() {
        assert_eq!(parse_result("").unwrap(), DeploymentResult::default());
        assert_eq!(parse_result("  \n").unwrap(), DeploymentResult::default());
        assert_eq!(
            parse_result(r#"{"deploymentId":"abc123"}"#).unwrap().deployment_id,
            "abc123"
        );
        assert!(parse_result("<html>").is_err());
    }
}
