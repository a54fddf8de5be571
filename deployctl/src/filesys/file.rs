//! File operations

use std::path::PathBuf;

use tokio::fs;

use crate::errors::DeployError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read file contents as bytes
    pub async fn read_bytes(&self) -> Result<Vec<u8>, DeployError> {
        fs::read(&self.path)
            .await
            .map_err(|source| DeployError::FileLoadError {
                path: self.path.clone(),
                source,
            })
    }

    /// Read file contents as UTF-8 text
    pub async fn read_string(&self) -> Result<String, DeployError> {
        let bytes = self.read_bytes().await?;
        String::from_utf8(bytes).map_err(|e| DeployError::FileLoadError {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}
