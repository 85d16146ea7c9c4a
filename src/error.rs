use thiserror::Error;

/// Failure taxonomy for the check suite.
///
/// `Configuration` aborts the run before any scenario starts; the rest fail
/// the scenario that raised them. Visibility probes never surface here, they
/// degrade to `false` instead.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Navigation to {url} failed within {timeout_ms}ms: {reason}")]
    Navigation {
        url: String,
        timeout_ms: u64,
        reason: String,
    },
    #[error("Element '{selector}' not visible within {timeout_ms}ms")]
    ElementNotFound { selector: String, timeout_ms: u64 },
    #[error("Assertion failed: {0}")]
    Assertion(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    /// Whether a bounded retry is worth attempting. Configuration problems
    /// and failed assertions stay wrong no matter how often we ask.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckError::Navigation { .. } | CheckError::Http(_) | CheckError::Browser(_)
        )
    }
}

impl From<chromiumoxide::error::CdpError> for CheckError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CheckError::Browser(err.to_string())
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
