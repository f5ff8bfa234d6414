//! C2: maps a raw [`RunOutcome`] to a [`Verdict`] plus the grading log
//! shown to the user, and hosts the JUnit post-filter [`crate::runner`]
//! applies to Java output.

use crate::constants::LANGUAGE_JAVA;
use crate::models::run::RunOutcome;
use crate::models::submission::Verdict;

/// Classify a completed run (spec §4.2's table). The order of checks
/// matters: TLE and MLE win over any marker found in the log.
///
/// Golden-output diffing is explicitly out of scope (spec §4.2 non-goals):
/// the embedded test harness is itself the correctness check, and is
/// expected to exit non-zero or print a diagnostic on failure. For every
/// language but Java that check is the process exit status; Java's JUnit
/// runner instead signals success via the `"Test run finished"` marker
/// the post-filter already isolated in `return_log`.
pub fn classify(outcome: &RunOutcome, language: &str) -> (Verdict, String) {
    if outcome.time_limit_exceeded {
        return (Verdict::TimeLimitExceeded, outcome.return_log.clone());
    }
    if outcome.memory_limit_exceeded {
        return (Verdict::MemoryLimitExceeded, outcome.return_log.clone());
    }
    if outcome.stdout.is_empty() && outcome.stderr.is_empty() {
        return (Verdict::RuntimeError, "no output".to_string());
    }

    let ok_marker = if language == LANGUAGE_JAVA {
        outcome.return_log.contains(crate::constants::junit::FINISHED_MARKER)
    } else {
        outcome.exit_code == 0
    };

    if ok_marker {
        return (Verdict::Ok, outcome.return_log.clone());
    }
    (Verdict::RuntimeError, outcome.return_log.clone())
}

/// The JUnit post-filter (spec §4.2), applied by [`crate::runner`] to the
/// assembled log when `language == "java"`.
pub mod junit {
    use regex::Regex;
    use std::sync::OnceLock;

    use crate::constants::junit::{FINISHED_MARKER, RESULTS_BANNER, TREE_GLYPHS};

    fn ansi_csi() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"))
    }

    /// Strip the raw JUnit console banner down to the human-readable
    /// results block, stopping at the final summary line.
    ///
    /// Input with no results banner is returned unchanged rather than
    /// emptied, so that filtering an already-filtered log (which no
    /// longer contains the banner) is a no-op — `filter(filter(x)) ==
    /// filter(x)`.
    pub fn filter(combined_log: &str) -> String {
        let mut in_results = false;
        let mut kept = Vec::new();

        for line in combined_log.lines() {
            if !in_results {
                if line.contains(RESULTS_BANNER) {
                    in_results = true;
                }
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let stripped = ansi_csi().replace_all(line, "");
            let trimmed_glyphs = stripped.trim_start_matches(TREE_GLYPHS);
            let cleaned = trimmed_glyphs.trim().to_string();

            if cleaned.contains(FINISHED_MARKER) {
                kept.push(cleaned);
                break;
            }

            kept.push(cleaned);
        }

        if !in_results {
            return combined_log.to_string();
        }

        kept.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(return_log: &str, stdout: &str, stderr: &str, exit_code: i64) -> RunOutcome {
        RunOutcome {
            return_log: return_log.to_string(),
            time_limit_exceeded: false,
            memory_limit_exceeded: false,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    #[test]
    fn time_limit_exceeded_wins_over_everything_else() {
        let mut o = outcome("Test run finished: ok", "ok", "", 0);
        o.time_limit_exceeded = true;
        let (verdict, _) = classify(&o, "java");
        assert_eq!(verdict, Verdict::TimeLimitExceeded);
    }

    #[test]
    fn memory_limit_exceeded_wins_over_marker() {
        let mut o = outcome("Test run finished: ok", "ok", "", 0);
        o.memory_limit_exceeded = true;
        let (verdict, _) = classify(&o, "java");
        assert_eq!(verdict, Verdict::MemoryLimitExceeded);
    }

    #[test]
    fn empty_streams_are_runtime_error() {
        let o = outcome("", "", "", 0);
        let (verdict, log) = classify(&o, "python");
        assert_eq!(verdict, Verdict::RuntimeError);
        assert_eq!(log, "no output");
    }

    #[test]
    fn non_java_success_is_ok_on_zero_exit() {
        let o = outcome("2", "2", "", 0);
        let (verdict, _) = classify(&o, "python");
        assert_eq!(verdict, Verdict::Ok);
    }

    #[test]
    fn non_java_nonzero_exit_is_runtime_error() {
        let o = outcome("assertion failed", "", "assertion failed", 1);
        let (verdict, _) = classify(&o, "python");
        assert_eq!(verdict, Verdict::RuntimeError);
    }

    #[test]
    fn java_zero_exit_without_marker_is_not_ok() {
        // Java success is judged by the JUnit marker alone, not exit code.
        let o = outcome("some unrelated output", "some unrelated output", "", 0);
        let (verdict, _) = classify(&o, "java");
        assert_eq!(verdict, Verdict::RuntimeError);
    }

    #[test]
    fn finished_marker_is_ok() {
        let o = outcome("Test run finished: 5 tests successful", "...", "", 1);
        let (verdict, _) = classify(&o, "java");
        assert_eq!(verdict, Verdict::Ok);
    }

    #[test]
    fn junit_filter_keeps_only_the_results_block() {
        let raw = "Compiling...\n\x1b[1mThanks for using JUnit! Here are the results:\x1b[0m\n│ ✔ addsTwoNumbers()\n├─ ✔ subtractsTwoNumbers()\n\nTest run finished: 5 tests successful\n";
        let filtered = junit::filter(raw);
        assert!(filtered.contains("addsTwoNumbers"));
        assert!(filtered.ends_with("Test run finished: 5 tests successful"));
        assert!(!filtered.contains('\x1b'));
        assert!(!filtered.starts_with('│'));
    }

    #[test]
    fn junit_filter_is_idempotent() {
        let raw = "Thanks for using JUnit!\n│ ✔ one()\nTest run finished: 1 test successful\n";
        let once = junit::filter(raw);
        let twice = junit::filter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn junit_filter_without_banner_passes_through_unchanged() {
        let raw = "no banner here\njust noise\n";
        assert_eq!(junit::filter(raw), raw);
    }
}
