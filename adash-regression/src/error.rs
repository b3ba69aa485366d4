//! Binary-level error type and exit code mapping

use adash_core::error::AdashError;

/// Error returned by the suite entry point.
///
/// Scenario failures are not errors of the runner itself; they are
/// surfaced as [`RegressionError::ScenariosFailed`] only after the
/// report has been rendered.
#[derive(Debug, thiserror::Error)]
pub enum RegressionError {
    /// Configuration loading, CLI overrides or validation failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// At least one scenario did not pass.
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    /// JSON serialisation failed during report rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from adash-core.
    #[error("{0}")]
    Core(AdashError),
}

impl From<AdashError> for RegressionError {
    fn from(e: AdashError) -> Self {
        match e {
            AdashError::Config(inner) => Self::Config(inner.to_string()),
            AdashError::Io(inner) => Self::Io(inner),
            other => Self::Core(other),
        }
    }
}

impl RegressionError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | All scenarios passed            |
    /// | 1    | At least one scenario failed    |
    /// | 2    | Configuration error             |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::ScenariosFailed { .. } | Self::JsonSerialize(_) | Self::Core(_) => 1,
        }
    }
}
