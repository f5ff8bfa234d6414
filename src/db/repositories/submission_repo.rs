//! Submission repository: the load/update surface C6 exposes to the
//! dispatcher (spec §4.6). `update` takes a partial [`SubmissionPatch`],
//! matching the "patch is a partial update" contract, and fails if no
//! matching document exists.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, NotFoundKind};
use crate::models::{Submission, SubmissionPatch};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SubmissionRepository: Send + Sync {
    async fn load(&self, uuid: Uuid) -> CoreResult<Option<Submission>>;
    async fn update(&self, uuid: Uuid, patch: SubmissionPatch) -> CoreResult<()>;
    /// Submissions in `Submitted` status, oldest first — backs the
    /// ambient `judged` worker's polling loop (not part of the §6
    /// in-process contract itself).
    async fn pending(&self, limit: i64) -> CoreResult<Vec<Submission>>;
}

/// Postgres-backed [`SubmissionRepository`].
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn load(&self, uuid: Uuid) -> CoreResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT uuid, problem_uuid, author_uuid, content, language,
                   status, result, grading_result, created_time
            FROM submissions WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::Database(e.to_string()))?;

        Ok(submission)
    }

    async fn update(&self, uuid: Uuid, patch: SubmissionPatch) -> CoreResult<()> {
        let rows = sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2, result = $3, grading_result = $4
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .bind(patch.status)
        .bind(patch.result)
        .bind(patch.grading_result)
        .execute(&self.pool)
        .await
        .map_err(|e| CoreError::Database(e.to_string()))?;

        if rows.rows_affected() == 0 {
            return Err(CoreError::NotFound(NotFoundKind::Submission));
        }

        Ok(())
    }

    async fn pending(&self, limit: i64) -> CoreResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT uuid, problem_uuid, author_uuid, content, language,
                   status, result, grading_result, created_time
            FROM submissions
            WHERE status = 1
            ORDER BY created_time
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::Database(e.to_string()))?;

        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{submission_result, submission_status};

    #[tokio::test]
    async fn update_not_found_surfaces_as_core_error() {
        let mut mock = MockSubmissionRepository::new();
        mock.expect_update()
            .returning(|_, _| Err(CoreError::NotFound(NotFoundKind::Submission)));

        let patch = SubmissionPatch::finished(submission_result::OK, "ok");
        let err = mock.update(Uuid::new_v4(), patch).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(NotFoundKind::Submission)));
    }

    #[tokio::test]
    async fn executing_patch_has_no_result() {
        let mut mock = MockSubmissionRepository::new();
        mock.expect_update()
            .withf(|_, patch| patch.status == submission_status::EXECUTING && patch.result.is_none())
            .returning(|_, _| Ok(()));

        mock.update(Uuid::new_v4(), SubmissionPatch::executing())
            .await
            .unwrap();
    }
}
