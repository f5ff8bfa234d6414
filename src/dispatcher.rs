//! C3: orchestrates one submission end-to-end (spec §4.3). All
//! persistence side effects go through the repository traits; the only
//! thing callers observe is the final `status=Finished` row.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::classifier;
use crate::db::repositories::{ProblemRepository, TestCaseRepository};
use crate::error::{CoreError, NotFoundKind};
use crate::lifecycle::Lifecycle;
use crate::models::submission::{SubmissionPatch, Verdict};
use crate::runner::LanguageRunner;
use crate::utils::time::format_timeout;

/// Orchestrates one judgement. Holds no per-submission state; every
/// field here is shared, long-lived infrastructure built once at
/// startup.
pub struct Dispatcher {
    lifecycle: Arc<Lifecycle>,
    problems: Arc<dyn ProblemRepository>,
    test_cases: Arc<dyn TestCaseRepository>,
    runners: HashMap<String, Arc<LanguageRunner>>,
}

impl Dispatcher {
    pub fn new(
        lifecycle: Arc<Lifecycle>,
        problems: Arc<dyn ProblemRepository>,
        test_cases: Arc<dyn TestCaseRepository>,
        runners: HashMap<String, Arc<LanguageRunner>>,
    ) -> Self {
        Self {
            lifecycle,
            problems,
            test_cases,
            runners,
        }
    }

    /// `judge(submission_uuid)` (spec §4.3). Blocking for the duration of
    /// the run; returns once the submission has reached a terminal state
    /// or, for `Cancelled`, without writing one (the caller is expected
    /// to resubmit on the next start).
    pub async fn judge(&self, submission_uuid: Uuid, cancel: CancelToken) {
        let submission = match self.lifecycle.load(submission_uuid).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                tracing::warn!(%submission_uuid, "submission not found, dropping");
                return;
            }
            Err(e) => {
                tracing::error!(%submission_uuid, error = %e, "failed to load submission");
                return;
            }
        };

        if let Err(msg) = crate::utils::validation::validate_submission_content(&submission.content)
            .and_then(|_| crate::utils::validation::validate_language_tag(&submission.language))
        {
            self.finish(submission_uuid, Verdict::RuntimeError, msg).await;
            return;
        }

        let problem = match self.problems.load(submission.problem_uuid).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                self.finish(submission_uuid, Verdict::RuntimeError, "problem not found")
                    .await;
                return;
            }
            Err(e) => {
                tracing::error!(%submission_uuid, error = %e, "failed to load problem");
                self.finish(submission_uuid, Verdict::RuntimeError, "infrastructure")
                    .await;
                return;
            }
        };

        let Some(test_case_entry) = problem.test_case_for_language(&submission.language) else {
            self.finish(submission_uuid, Verdict::UnsupportedLanguage, "unsupported language")
                .await;
            return;
        };

        let Some(runner) = self.runners.get(&submission.language) else {
            self.finish(submission_uuid, Verdict::UnsupportedLanguage, "unsupported language")
                .await;
            return;
        };

        let test_case = match self
            .test_cases
            .load_by_problem_and_language(problem.uuid, &submission.language)
            .await
        {
            Ok(Some(tc)) => tc,
            Ok(None) => {
                self.finish(submission_uuid, Verdict::UnsupportedLanguage, "unsupported language")
                    .await;
                return;
            }
            Err(e) => {
                tracing::error!(%submission_uuid, error = %e, "failed to load test case");
                self.finish(submission_uuid, Verdict::RuntimeError, "infrastructure")
                    .await;
                return;
            }
        };
        debug_assert_eq!(test_case.uuid, test_case_entry.test_case_uuid);

        if let Err(e) = self
            .lifecycle
            .transition(submission_uuid, SubmissionPatch::executing())
            .await
        {
            tracing::error!(%submission_uuid, error = %e, "failed to mark submission executing");
            return;
        }

        let time_limit = format_timeout(problem.time_limit_ms());
        tracing::info!(%submission_uuid, language = %submission.language, %time_limit, "judgement started");

        let run_result = runner
            .run(
                &test_case.test_file_content,
                &submission.content,
                problem.time_limit_ms(),
                problem.memory_limit_bytes(),
                cancel,
            )
            .await;

        let (verdict, log) = match run_result {
            Ok(outcome) => classifier::classify(&outcome, &submission.language),
            Err(CoreError::Cancelled) => {
                tracing::info!(%submission_uuid, "judgement cancelled, leaving for resubmission");
                return;
            }
            Err(e) if e.is_transient() => {
                // Leave status=Executing: the scheduler's retry loop (spec
                // §4.4/§7) checks for an unfinished submission to decide
                // whether to re-enqueue, so a premature Finished write here
                // would hide the failure from it.
                tracing::warn!(%submission_uuid, error = %e, "transient sandbox failure, leaving for scheduler retry");
                return;
            }
            Err(e) => classify_run_error(submission_uuid, e),
        };

        tracing::debug!(%submission_uuid, %verdict, "judgement classified");
        self.finish(submission_uuid, verdict, log).await;
        tracing::info!(%submission_uuid, %verdict, "judgement finished");
    }

    async fn finish(&self, submission_uuid: Uuid, verdict: Verdict, log: impl Into<String>) {
        let patch = SubmissionPatch::finished(verdict.code(), log);
        if let Err(e) = self.lifecycle.transition(submission_uuid, patch).await {
            tracing::error!(%submission_uuid, error = %e, "failed to persist verdict");
        }
    }
}

fn classify_run_error(submission_uuid: Uuid, err: CoreError) -> (Verdict, String) {
    tracing::warn!(%submission_uuid, error = %err, "language runner returned an error");
    match err {
        CoreError::TimeLimit => (Verdict::TimeLimitExceeded, "time limit exceeded".to_string()),
        CoreError::EmptyOutput(msg) => (Verdict::RuntimeError, msg),
        CoreError::NotFound(NotFoundKind::TestCase) => {
            (Verdict::UnsupportedLanguage, "unsupported language".to_string())
        }
        other => (Verdict::RuntimeError, other.to_string()),
    }
}
