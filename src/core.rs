//! `JudgeCore`: wires C1..C6 into the crate's public facade.
//!
//! Mirrors the teacher's `AppState` (constructed once at startup, held
//! for the process lifetime, cheap to clone) but exposes only the
//! in-process surface spec §6 allows for the core: `schedule(uuid)` and
//! `stop()`. Everything else — loading submissions, invoking the
//! runner, writing verdicts — is an internal collaborator, not part of
//! the public contract.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::repositories::{
    PgProblemRepository, PgSubmissionRepository, PgTestCaseRepository, ProblemRepository,
    SubmissionRepository, TestCaseRepository,
};
use crate::dispatcher::Dispatcher;
use crate::lifecycle::Lifecycle;
use crate::runner::container::{BollardRuntime, ContainerRuntime};
use crate::runner::LanguageRunner;
use crate::scheduler::Scheduler;
use crate::warmer;

/// The assembled judge core: one [`Dispatcher`] per process, one
/// [`LanguageRunner`] per configured language, fronted by a [`Scheduler`].
///
/// Built once via [`JudgeCore::build`] and held behind an `Arc` by
/// whatever ambient binary or service owns the process (here,
/// `src/bin/judged.rs`).
pub struct JudgeCore {
    scheduler: Arc<Scheduler>,
}

impl JudgeCore {
    /// Construct the full core from configuration plus the two
    /// externally-owned clients (database pool, container runtime),
    /// matching the teacher's `AppState::new` pattern of taking
    /// already-connected resources rather than connecting itself.
    ///
    /// Spawns C5 (image warming) as a side effect, per spec §4.5 —
    /// "at startup, ... spawn a fire-and-forget background task".
    pub fn build(config: &Config, pool: PgPool, docker: Arc<dyn ContainerRuntime>) -> Self {
        let submissions: Arc<dyn SubmissionRepository> =
            Arc::new(PgSubmissionRepository::new(pool.clone()));
        let problems: Arc<dyn ProblemRepository> = Arc::new(PgProblemRepository::new(pool.clone()));
        let test_cases: Arc<dyn TestCaseRepository> = Arc::new(PgTestCaseRepository::new(pool));

        let lifecycle = Arc::new(Lifecycle::new(submissions));

        let helper_cache_dir = std::env::temp_dir().join("judge-core-helper-cache");
        let mut runners = HashMap::new();
        let mut images = Vec::new();
        for language_config in &config.judge.languages {
            images.push((language_config.language.clone(), language_config.image.clone()));
            let runner = Arc::new(LanguageRunner::new(
                language_config.clone(),
                Arc::clone(&docker),
                helper_cache_dir.clone(),
            ));
            runners.insert(language_config.language.clone(), runner);
        }

        warmer::warm(Arc::clone(&docker), images);

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&lifecycle),
            problems,
            test_cases,
            runners,
        ));

        let scheduler = Scheduler::start(&config.judge, dispatcher, lifecycle);

        Self { scheduler }
    }

    /// Connect to Postgres and Docker per `config`, run migrations, and
    /// build the core — the path `src/bin/judged.rs` uses at startup.
    pub async fn connect_and_build(config: &Config) -> Result<Self, BuildError> {
        let pool = crate::db::connection::create_pool(&config.database)
            .await
            .map_err(BuildError::Database)?;

        crate::db::run_migrations(&pool)
            .await
            .map_err(BuildError::Migration)?;

        let docker = BollardRuntime::connect(&config.docker.socket_path).map_err(BuildError::Docker)?;

        Ok(Self::build(config, pool, Arc::new(docker)))
    }

    /// `schedule(submission_uuid)` (spec §6): non-blocking enqueue of a
    /// judgement.
    pub fn schedule(&self, submission_uuid: Uuid) {
        self.scheduler.schedule(submission_uuid);
    }

    /// `stop()` (spec §6): drain in-flight judgements up to the
    /// configured grace period, then abort.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }
}

/// Errors from [`JudgeCore::connect_and_build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("database connection failed: {0}")]
    Database(sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("docker connection failed: {0}")]
    Docker(crate::error::CoreError),
}
