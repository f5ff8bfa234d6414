//! Core error types.
//!
//! Unlike the excluded API layer, nothing here converts to an HTTP
//! response — `CoreError` is consumed by the dispatcher, which maps each
//! kind to a verdict or a retry decision per the error handling table.

/// Which entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Submission,
    Problem,
    TestCase,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submission => "submission",
            Self::Problem => "problem",
            Self::TestCase => "testcase",
        };
        f.write_str(s)
    }
}

/// Core-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(NotFoundKind),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("sandbox setup failed: {0}")]
    SandboxSetup(String),

    #[error("sandbox start failed: {0}")]
    SandboxStart(String),

    #[error("sandbox wait failed: {0}")]
    SandboxWait(String),

    #[error("{0}")]
    EmptyOutput(String),

    #[error("time limit exceeded")]
    TimeLimit,

    #[error("judgement cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(String),

    #[error("docker error: {0}")]
    Docker(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Errors C4 is allowed to retry (§7: SandboxSetup/SandboxStart/SandboxWait).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::SandboxSetup(_) | Self::SandboxStart(_) | Self::SandboxWait(_)
        )
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound(NotFoundKind::Submission),
            _ => CoreError::Database(err.to_string()),
        }
    }
}

impl From<bollard::errors::Error> for CoreError {
    fn from(err: bollard::errors::Error) -> Self {
        CoreError::Docker(err.to_string())
    }
}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
