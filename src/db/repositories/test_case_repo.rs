//! Test case repository (C6's `load_testcase`).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::TestCase;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TestCaseRepository: Send + Sync {
    /// Find the test case for `(of_problem_uuid, language)`. Spec §3
    /// guarantees at most one match; a second match is a data-integrity
    /// error the external CRUD layer is responsible for preventing.
    async fn load_by_problem_and_language(
        &self,
        of_problem_uuid: Uuid,
        language: &str,
    ) -> CoreResult<Option<TestCase>>;
}

/// Postgres-backed [`TestCaseRepository`].
pub struct PgTestCaseRepository {
    pool: PgPool,
}

impl PgTestCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestCaseRepository for PgTestCaseRepository {
    async fn load_by_problem_and_language(
        &self,
        of_problem_uuid: Uuid,
        language: &str,
    ) -> CoreResult<Option<TestCase>> {
        let test_case = sqlx::query_as::<_, TestCase>(
            r#"
            SELECT uuid, of_problem_uuid, language, test_file_content
            FROM test_cases
            WHERE of_problem_uuid = $1 AND language = $2
            "#,
        )
        .bind(of_problem_uuid)
        .bind(language)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::Database(e.to_string()))?;

        Ok(test_case)
    }
}
