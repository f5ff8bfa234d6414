//! Problem repository (C6's `load_problem`).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, NotFoundKind};
use crate::models::Problem;

/// Read access to problems, as the dispatcher needs it.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ProblemRepository: Send + Sync {
    async fn load(&self, uuid: Uuid) -> CoreResult<Option<Problem>>;
}

/// Postgres-backed [`ProblemRepository`].
pub struct PgProblemRepository {
    pool: PgPool,
}

impl PgProblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemRepository for PgProblemRepository {
    async fn load(&self, uuid: Uuid) -> CoreResult<Option<Problem>> {
        let problem = sqlx::query_as::<_, Problem>(
            r#"SELECT uuid, time_limit_ms, memory_limit_bytes, test_case_list FROM problems WHERE uuid = $1"#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, NotFoundKind::Problem))?;

        Ok(problem)
    }
}

fn map_sqlx_err(err: sqlx::Error, kind: NotFoundKind) -> CoreError {
    match err {
        sqlx::Error::RowNotFound => CoreError::NotFound(kind),
        other => CoreError::Database(other.to_string()),
    }
}
