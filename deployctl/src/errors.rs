//! Error types for deployctl

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for deployctl
///
/// Each variant carries the coordinate, URL, status or body needed to diagnose the
/// failure without re-running the deployment.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unable to load '{}'", path.display())]
    FileLoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Could not find image {field} in config for {image_key}")]
    MissingFieldError { field: &'static str, image_key: String },

    #[error("Source control error: {0}")]
    SourceControlError(String),

    #[error("GET {url}\nRegistry search error: {reason}")]
    RegistryError { url: String, reason: String },

    #[error("Docker image/tag ({0}) not found")]
    ImageNotFoundError(String),

    #[error("Authentication challenge error: {0}")]
    AuthChallengeError(String),

    #[error("GET {url}\nToken error: {reason}")]
    TokenError { url: String, reason: String },

    #[error("GET {0}\nHTTP response should not be 401 when token is provided")]
    UnexpectedAuthError(String),

    #[error("{method} {url}\nUnexpected response status {status}: {body}")]
    UnexpectedStatusError {
        method: &'static str,
        url: String,
        status: String,
        body: String,
    },

    #[error("{0} id must not be empty")]
    InvalidIdError(String),

    #[error("{path} container type must be {expected}. Found: '{found}'")]
    InvalidContainerTypeError {
        path: String,
        expected: &'static str,
        found: String,
    },

    #[error("{path} container docker image '{image}' must have a tag")]
    MissingImageTagError { path: String, image: String },

    #[error("JSON encoding error: {0}")]
    EncodingError(#[from] serde_json::Error),

    #[error("{status}\nResult: {result}\n\nConfig: {payload}")]
    SchedulerRejectedError {
        status: String,
        result: String,
        payload: String,
    },

    #[error("{status}. Location: {location}\nResult: {result}")]
    RedirectError {
        status: String,
        location: String,
        result: String,
    },

    #[error("Deployment ID empty. Result: {0}")]
    IncompleteResultError(String),

    #[error("Request cancelled: {0}")]
    CancelledError(String),
}

impl DeployError {
    /// Classify a transport failure, keeping timeouts distinct from other HTTP errors
    pub fn from_transport(method: &str, url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeployError::CancelledError(format!("{} {} timed out: {}", method, url, err))
        } else {
            DeployError::HttpError(err)
        }
    }
}

impl From<tera::Error> for DeployError {
    fn from(err: tera::Error) -> Self {
        DeployError::TemplateError(error_chain(&err))
    }
}

/// Render an error and all of its sources on one line
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
