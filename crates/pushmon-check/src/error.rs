//! Check engine error types.

use thiserror::Error;

/// Errors that can occur while setting up check execution.
///
/// Per-request and per-cycle failures are absorbed and logged by the
/// check tasks; they never surface here.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type CheckResult<T> = Result<T, CheckError>;
