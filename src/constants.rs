//! Application-wide constants
//!
//! This module contains all constant values used throughout the judge core.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SUBMISSION STATUS / RESULT CODES
// =============================================================================

/// Numeric `Submission.status` codes.
pub mod submission_status {
    pub const SUBMITTED: i16 = 1;
    pub const EXECUTING: i16 = 2;
    pub const FINISHED: i16 = 3;
}

/// Numeric `Submission.result` codes. Meaningful only when
/// `status == FINISHED`.
pub mod submission_result {
    pub const OK: i16 = 1;
    pub const COMPILE_ERROR: i16 = 2;
    pub const RUNTIME_ERROR: i16 = 3;
    pub const TIME_LIMIT_EXCEEDED: i16 = 4;
    pub const MEMORY_LIMIT_EXCEEDED: i16 = 5;
    pub const WRONG_ANSWER: i16 = 6;
    pub const UNSUPPORTED_LANGUAGE: i16 = 7;
}

// =============================================================================
// CONTENT LIMITS
// =============================================================================

/// Minimum accepted `Submission.content` size in bytes.
pub const MIN_SUBMISSION_CONTENT_BYTES: usize = 1;

/// Maximum accepted `Submission.content` size in bytes.
pub const MAX_SUBMISSION_CONTENT_BYTES: usize = 64_000;

/// Maximum accepted `Submission.language` tag length in bytes.
pub const MAX_LANGUAGE_TAG_BYTES: usize = 32;

// =============================================================================
// SANDBOX / CONTAINER DEFAULTS
// =============================================================================

/// Fixed in-container working directory the host workdir is bind-mounted to.
pub const CONTAINER_WORKDIR: &str = "/work";

/// Number of attempts when downloading a helper library/jar.
pub const HELPER_DOWNLOAD_MAX_ATTEMPTS: u32 = 3;

/// Delay between helper-library download attempts.
pub const HELPER_DOWNLOAD_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// Minimum host-side soft deadline, used in `max(5s, 2 * time_limit)`.
pub const HOST_SOFT_DEADLINE_FLOOR: std::time::Duration = std::time::Duration::from_secs(5);

/// Literal grading-result string used when neither stdout nor stderr is
/// configured to be captured for a language.
pub const NO_OUTPUT_STREAM_LOG: &str = "No output stream";

/// Exit code the POSIX `timeout` utility uses when it kills the wrapped
/// command after `$TIME_LIMIT` elapses. Command templates wrap the
/// submission in `timeout $TIME_LIMIT ...`, so a container that exits
/// with this code ran out of in-container time rather than failing.
pub const TIMEOUT_COMMAND_EXIT_CODE: i64 = 124;

// =============================================================================
// JUNIT POST-FILTER MARKERS
// =============================================================================

pub mod junit {
    /// Marks the start of the machine-readable results block.
    pub const RESULTS_BANNER: &str = "Thanks for using JUnit!";
    /// Marks (and terminates scanning at) the final summary line.
    pub const FINISHED_MARKER: &str = "Test run finished";
    /// Leading glyphs stripped from each kept line (JUnit's tree-drawing
    /// box characters).
    pub const TREE_GLYPHS: &[char] = &['│', '├', '└', '─'];
}

// =============================================================================
// SCHEDULER DEFAULTS
// =============================================================================

/// Default worker pool size when `logic.judge.schedule` is absent.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 1;

/// Default delay between retry attempts for transient sandbox errors.
pub const DEFAULT_SUBMISSION_RETRY_DELAY: std::time::Duration =
    std::time::Duration::from_secs(1);

/// Maximum retry attempts for a transient `SandboxSetup`/`SandboxStart`/
/// `SandboxWait` failure before giving up with `RuntimeError("infrastructure")`.
pub const MAX_JUDGEMENT_RETRIES: u32 = 3;

/// Default grace period the scheduler waits for in-flight judgements to
/// finish on `stop()` before force-aborting their containers.
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: std::time::Duration =
    std::time::Duration::from_secs(30);

// =============================================================================
// CONFIG DEFAULTS
// =============================================================================

/// Default path to the judge YAML configuration file.
pub const DEFAULT_JUDGE_CONFIG_PATH: &str = "config/judge.yaml";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// SUPPORTED LANGUAGE TAG (used only as an example/default in docs & tests)
// =============================================================================

/// Well-known language tag that receives the JUnit post-filter.
pub const LANGUAGE_JAVA: &str = "java";
