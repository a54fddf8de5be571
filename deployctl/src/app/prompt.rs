//! Interactive confirmation

use inquire::Confirm;

use crate::errors::DeployError;

/// Ask a yes/no question on the terminal; defaults to "no"
pub fn confirm(prompt: &str) -> Result<bool, DeployError> {
    Confirm::new(prompt)
        .with_default(false)
        .prompt()
        .map_err(|e| DeployError::CancelledError(format!("Confirmation prompt failed: {}", e)))
}
