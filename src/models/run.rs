//! Per-language run configuration and the in-memory outcome of one run.
//!
//! `LanguageRunConfig` is constructed once at startup from
//! `logic.judge.languages[]` (see [`crate::config`]) and held for the
//! process lifetime. `RunOutcome` never touches the database or the
//! filesystem; it is produced by [`crate::runner`] and consumed by
//! [`crate::classifier`].

/// Command-template placeholder tokens substituted by
/// [`crate::runner::placeholder::substitute`].
pub mod placeholders {
    pub const TIME_LIMIT: &str = "$TIME_LIMIT";
    pub const TEST_FILE: &str = "$TEST_FILE";
    pub const MAIN_FILE: &str = "$MAIN_FILE";
}

/// Process-wide, per-language sandbox configuration (spec §3).
///
/// Deserialized directly from one entry of `logic.judge.languages[]`
/// (see `Language` in [`crate::config`]), which wraps this with the
/// `value`/`name` display fields.
#[derive(Debug, Clone)]
pub struct LanguageRunConfig {
    /// Normalized lowercase tag, matched against `submission.language`.
    pub language: String,
    /// Container image reference.
    pub image: String,
    /// Ordered argv tokens; `$TIME_LIMIT`/`$TEST_FILE`/`$MAIN_FILE` are
    /// substituted per-run.
    pub command_template: Vec<String>,
    /// Container CPU quota, in the same units bollard's `HostConfig::cpu_quota`
    /// expects (microseconds of CPU time per 100ms period).
    pub cpu_quota: i64,
    /// Basename the submission source is written to inside the workdir.
    pub code_file_name: String,
    /// Basename the test harness source is written to inside the workdir.
    pub test_file_name: String,
    /// Whether stdout contributes to the assembled grading log.
    pub stdout_captured: bool,
    /// Whether stderr contributes to the assembled grading log.
    pub stderr_captured: bool,
    /// URL of an auxiliary jar/library staged into the sandbox before run.
    pub download_test_url: Option<String>,
    /// Basename the staged helper library is written as.
    pub test_library_name: Option<String>,
}

impl LanguageRunConfig {
    /// Whether this language needs a helper library staged before running.
    pub fn needs_helper_library(&self) -> bool {
        self.download_test_url.is_some() && self.test_library_name.is_some()
    }
}

/// Raw outcome of one sandboxed run (spec §3), before [`crate::classifier`]
/// maps it to a `Verdict`.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Assembled grading log: `[stderr if configured] ++ [stdout if
    /// configured]`, newline-joined, filtered per language (e.g. JUnit).
    pub return_log: String,
    pub time_limit_exceeded: bool,
    pub memory_limit_exceeded: bool,
    pub stdout: String,
    pub stderr: String,
    /// The container's process exit status. The embedded test harness is
    /// the correctness check (spec §4.2 non-goals: no golden-output
    /// diffing in the core) — zero is its success signal for every
    /// language except Java, which reports success via the JUnit marker
    /// text instead.
    pub exit_code: i64,
}
