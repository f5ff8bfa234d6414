//! C4: bounded worker pool over [`crate::dispatcher::Dispatcher`] (spec
//! §4.4). FIFO ingress, at-most-one in-flight judgement per uuid,
//! transient-error retry, panic-safe workers, graceful drain on `stop()`.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::config::JudgeConfig;
use crate::constants::MAX_JUDGEMENT_RETRIES;
use crate::dispatcher::Dispatcher;
use crate::lifecycle::Lifecycle;
use crate::models::submission::{SubmissionPatch, Verdict};

enum Job {
    Judge { uuid: Uuid, attempt: u32 },
}

/// Owns the worker tasks and the per-uuid in-flight set. Cloning is
/// cheap: every clone shares the same queue and worker pool.
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Job>,
    cancel: CancelToken,
    workers: Mutex<JoinSet<()>>,
    shutdown_grace_period: std::time::Duration,
}

impl Scheduler {
    /// Start `config.schedule` worker loops, each repeatedly dequeuing a
    /// uuid and invoking the dispatcher.
    pub fn start(config: &JudgeConfig, dispatcher: Arc<Dispatcher>, lifecycle: Arc<Lifecycle>) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let in_flight = Arc::new(Mutex::new(HashSet::<Uuid>::new()));
        let cancel = CancelToken::new();

        let mut workers = JoinSet::new();
        for worker_id in 0..config.schedule.max(1) {
            let rx = Arc::clone(&rx);
            let in_flight = Arc::clone(&in_flight);
            let dispatcher = Arc::clone(&dispatcher);
            let lifecycle = Arc::clone(&lifecycle);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let retry_delay = config.submission_retry_delay;

            workers.spawn(async move {
                worker_loop(
                    worker_id,
                    rx,
                    in_flight,
                    dispatcher,
                    lifecycle,
                    cancel,
                    tx,
                    retry_delay,
                )
                .await;
            });
        }

        Arc::new(Self {
            tx,
            cancel,
            workers: Mutex::new(workers),
            shutdown_grace_period: config.shutdown_grace_period,
        })
    }

    /// `schedule(submission_uuid)` (spec §4.4): non-blocking enqueue.
    /// Never fails; a closed channel only happens after `stop()`, at
    /// which point new work is simply dropped.
    pub fn schedule(&self, submission_uuid: Uuid) {
        let _ = self.tx.send(Job::Judge {
            uuid: submission_uuid,
            attempt: 1,
        });
    }

    /// Signals cancellation to every in-flight judgement and waits up to
    /// `shutdown_grace_period` for workers to drain before returning.
    /// Containers left running past the grace period are force-aborted
    /// by the cancellation propagating into `wait_container`.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut workers = self.workers.lock().await;
        let drained = tokio::time::timeout(self.shutdown_grace_period, async {
            while workers.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!("shutdown grace period elapsed, aborting remaining workers");
            workers.abort_all();
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    dispatcher: Arc<Dispatcher>,
    lifecycle: Arc<Lifecycle>,
    cancel: CancelToken,
    tx: mpsc::UnboundedSender<Job>,
    retry_delay: std::time::Duration,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };

        let Some(Job::Judge { uuid, attempt }) = job else {
            return;
        };

        {
            let mut guard = in_flight.lock().await;
            if !guard.insert(uuid) {
                // Another worker already has this uuid in flight; the
                // late duplicate is a no-op (spec §4.4 guarantee).
                continue;
            }
        }

        let dispatcher = Arc::clone(&dispatcher);
        let cancel_for_run = cancel.clone();
        let result = futures::FutureExt::catch_unwind(futures::future::AssertUnwindSafe(
            dispatcher.judge(uuid, cancel_for_run),
        ))
        .await;

        in_flight.lock().await.remove(&uuid);

        if let Err(panic) = result {
            tracing::error!(worker_id, %uuid, ?panic, "worker panicked, recovering");
            mark_infrastructure_failure(&lifecycle, uuid).await;
            continue;
        }

        if should_retry(&lifecycle, uuid).await {
            if attempt < MAX_JUDGEMENT_RETRIES {
                let tx = tx.clone();
                let delay = retry_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Job::Judge {
                        uuid,
                        attempt: attempt + 1,
                    });
                });
            } else {
                tracing::warn!(worker_id, %uuid, attempt, "exhausted retries, marking infrastructure failure");
                mark_infrastructure_failure(&lifecycle, uuid).await;
            }
        }
    }
}

/// Re-check the persisted submission after a judgement: if it never
/// reached `Finished` the underlying error was transient and swallowed
/// inside the dispatcher (it only logs, doesn't distinguish retryable
/// vs terminal to the caller), so retry up to the configured maximum.
async fn should_retry(lifecycle: &Arc<Lifecycle>, uuid: Uuid) -> bool {
    match lifecycle.load(uuid).await {
        Ok(Some(s)) => !s.is_finished(),
        _ => false,
    }
}

async fn mark_infrastructure_failure(lifecycle: &Arc<Lifecycle>, uuid: Uuid) {
    let patch = SubmissionPatch::finished(Verdict::RuntimeError.code(), "infrastructure");
    if let Err(e) = lifecycle.transition(uuid, patch).await {
        tracing::error!(%uuid, error = %e, "failed to record panic-recovered verdict");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JudgeConfig;
    use crate::db::repositories::{MockProblemRepository, MockSubmissionRepository, MockTestCaseRepository};
    use crate::constants::submission_status;
    use crate::models::{Problem, Submission};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(pool_size: usize) -> JudgeConfig {
        JudgeConfig {
            schedule: pool_size,
            submission_retry_delay: std::time::Duration::from_millis(10),
            shutdown_grace_period: std::time::Duration::from_millis(200),
            languages: vec![],
        }
    }

    fn submission(uuid: Uuid) -> Submission {
        Submission {
            uuid,
            problem_uuid: Uuid::new_v4(),
            author_uuid: Uuid::new_v4(),
            content: "x".to_string(),
            language: "cobol".to_string(),
            status: submission_status::SUBMITTED,
            result: None,
            grading_result: None,
            created_time: 0,
        }
    }

    #[tokio::test]
    async fn schedule_runs_the_dispatcher_for_an_unsupported_language() {
        let uuid = Uuid::new_v4();
        let call_count = Arc::new(AtomicUsize::new(0));

        let mut submissions = MockSubmissionRepository::new();
        let counted = Arc::clone(&call_count);
        submissions.expect_load().returning(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Some(submission(uuid)))
        });
        submissions.expect_update().returning(|_, _| Ok(()));

        let lifecycle = Arc::new(Lifecycle::new(Arc::new(submissions)));

        let mut problems = MockProblemRepository::new();
        let problem_uuid = Uuid::new_v4();
        problems.expect_load().returning(move |_| {
            Ok(Some(Problem {
                uuid: problem_uuid,
                time_limit_ms: 1000,
                memory_limit_bytes: 256_000_000,
                test_case_list: sqlx::types::Json(vec![]),
            }))
        });
        let test_cases = MockTestCaseRepository::new();

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&lifecycle),
            Arc::new(problems),
            Arc::new(test_cases),
            HashMap::new(),
        ));

        let scheduler = Scheduler::start(&test_config(1), dispatcher, lifecycle);
        scheduler.schedule(uuid);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        scheduler.stop().await;

        assert!(call_count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn exhausted_retries_marks_infrastructure_failure() {
        use crate::models::run::LanguageRunConfig;
        use crate::models::{ProblemTestCaseEntry, TestCase};
        use crate::runner::container::MockContainerRuntime;
        use crate::runner::LanguageRunner;

        let uuid = Uuid::new_v4();
        let problem_uuid = Uuid::new_v4();
        let load_count = Arc::new(AtomicUsize::new(0));
        let finished_count = Arc::new(AtomicUsize::new(0));

        let mut submissions = MockSubmissionRepository::new();
        let counted = Arc::clone(&load_count);
        submissions.expect_load().returning(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Submission {
                uuid,
                problem_uuid,
                author_uuid: Uuid::new_v4(),
                content: "print(1)".to_string(),
                language: "python".to_string(),
                status: submission_status::SUBMITTED,
                result: None,
                grading_result: None,
                created_time: 0,
            }))
        });
        submissions
            .expect_update()
            .withf(|_, patch| patch.status == submission_status::EXECUTING)
            .returning(|_, _| Ok(()));
        let counted_finished = Arc::clone(&finished_count);
        submissions
            .expect_update()
            .withf(|_, patch| patch.status == submission_status::FINISHED)
            .returning(move |_, _| {
                counted_finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let lifecycle = Arc::new(Lifecycle::new(Arc::new(submissions)));

        let mut problems = MockProblemRepository::new();
        problems.expect_load().returning(move |_| {
            Ok(Some(Problem {
                uuid: problem_uuid,
                time_limit_ms: 1000,
                memory_limit_bytes: 256_000_000,
                test_case_list: sqlx::types::Json(vec![ProblemTestCaseEntry {
                    test_case_uuid: Uuid::new_v4(),
                    language: "python".to_string(),
                }]),
            }))
        });

        let mut test_cases = MockTestCaseRepository::new();
        test_cases.expect_load_by_problem_and_language().returning(move |p, lang| {
            Ok(Some(TestCase {
                uuid: Uuid::new_v4(),
                of_problem_uuid: p,
                language: lang.to_string(),
                test_file_content: "assert output == '2'".to_string(),
            }))
        });

        let mut container = MockContainerRuntime::new();
        container.expect_create_container().returning(|_| Ok("c1".to_string()));
        container.expect_start_container().returning(|_| Ok(()));
        container.expect_wait_container().returning(|_, _, _| {
            Err(crate::error::CoreError::SandboxWait("daemon unreachable".to_string()))
        });
        container.expect_remove_container().returning(|_| Ok(()));

        let language_config = LanguageRunConfig {
            language: "python".to_string(),
            image: "judge/python:3.12".to_string(),
            command_template: vec!["python3".to_string(), "$MAIN_FILE".to_string()],
            cpu_quota: 100_000,
            code_file_name: "main.py".to_string(),
            test_file_name: "test.py".to_string(),
            stdout_captured: true,
            stderr_captured: true,
            download_test_url: None,
            test_library_name: None,
        };
        let runner = Arc::new(LanguageRunner::new(
            language_config,
            Arc::new(container),
            std::env::temp_dir().join("judge-core-scheduler-retry-test-cache"),
        ));
        let mut runners = HashMap::new();
        runners.insert("python".to_string(), runner);

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&lifecycle),
            Arc::new(problems),
            Arc::new(test_cases),
            runners,
        ));

        let scheduler = Scheduler::start(&test_config(1), dispatcher, lifecycle);
        scheduler.schedule(uuid);

        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        scheduler.stop().await;

        assert_eq!(load_count.load(Ordering::SeqCst), MAX_JUDGEMENT_RETRIES as usize);
        assert_eq!(finished_count.load(Ordering::SeqCst), 1);
    }
}
