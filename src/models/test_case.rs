//! Test case model: the reference test harness source for one
//! `(problem_uuid, language)` pair.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Test case database model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub uuid: Uuid,
    pub of_problem_uuid: Uuid,
    pub language: String,
    pub test_file_content: String,
}
