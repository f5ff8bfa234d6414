//! Ambient worker binary that makes `judge-core` runnable standalone.
//!
//! Not part of the Judge Core contract (spec §6: "no CLI surface is
//! part of the core") — this is scaffolding the surrounding API service
//! would otherwise provide: it connects Postgres and Docker, builds a
//! [`judge_core::JudgeCore`], polls `Submitted` rows the way the
//! excluded API layer's POST handler would push them in one at a time,
//! and calls `schedule()`. Mirrors the teacher's `main.rs` connect/log
//! sequence.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use judge_core::config::Config;
use judge_core::core::JudgeCore;
use judge_core::db::connection::create_pool;
use judge_core::db::repositories::{PgSubmissionRepository, SubmissionRepository};

/// How often the polling loop checks for newly `Submitted` rows.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Max rows fetched per poll tick.
const POLL_BATCH_SIZE: i64 = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting judged");

    let config = Config::load()?;

    tracing::info!("connecting to database...");
    let pool = create_pool(&config.database).await?;

    tracing::info!("running database migrations...");
    judge_core::db::run_migrations(&pool).await?;

    tracing::info!("connecting to docker...");
    let docker = judge_core::runner::container::BollardRuntime::connect(&config.docker.socket_path)
        .map_err(|e| anyhow::anyhow!("docker connect failed: {e}"))?;

    let core = Arc::new(JudgeCore::build(&config, pool.clone(), Arc::new(docker)));
    let pending_repo: Arc<dyn SubmissionRepository> = Arc::new(PgSubmissionRepository::new(pool));

    tracing::info!(workers = config.judge.schedule, languages = config.judge.languages.len(), "judge core ready");

    let poll_core = Arc::clone(&core);
    let poll_handle = tokio::spawn(async move {
        poll_loop(poll_core, pending_repo).await;
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining in-flight judgements");
    poll_handle.abort();
    core.stop().await;
    tracing::info!("judged stopped");

    Ok(())
}

/// Repeatedly fetch `Submitted` rows and hand their uuids to the
/// scheduler. A later poll tick re-observing a row this tick already
/// scheduled is a harmless duplicate `schedule()` call (spec §4.4:
/// "duplicate enqueues collapse onto whichever judgement is currently
/// in progress") — once a submission transitions to `Executing` it no
/// longer matches the `pending` query, so in practice each row is
/// handed off exactly once.
async fn poll_loop(core: Arc<JudgeCore>, submissions: Arc<dyn SubmissionRepository>) {
    loop {
        match submissions.pending(POLL_BATCH_SIZE).await {
            Ok(rows) => {
                for submission in rows {
                    core.schedule(submission.uuid);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll pending submissions");
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
