//! Problem model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One entry of a `Problem`'s embedded `test_case_list` (spec §3):
/// the test-case row for one language. Deduplicated on `language` by
/// the external CRUD layer at write time; the core treats a second
/// match for the same `(problem_uuid, language)` as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemTestCaseEntry {
    pub test_case_uuid: Uuid,
    pub language: String,
}

/// Problem database model: the reference record loaded by the dispatcher.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub uuid: Uuid,
    pub time_limit_ms: i64,
    pub memory_limit_bytes: i64,
    #[sqlx(json)]
    pub test_case_list: sqlx::types::Json<Vec<ProblemTestCaseEntry>>,
}

impl Problem {
    /// Select the test-case entry matching `language`, per spec §4.3 step 3.
    ///
    /// Returns `None` if there is no match (→ `UnsupportedLanguage`). A
    /// second match for the same language is a data-integrity error the
    /// external CRUD layer is responsible for preventing; the core picks
    /// the first match rather than treating it as fatal.
    pub fn test_case_for_language(&self, language: &str) -> Option<&ProblemTestCaseEntry> {
        self.test_case_list
            .0
            .iter()
            .find(|entry| entry.language == language)
    }

    pub fn time_limit_ms(&self) -> u64 {
        self.time_limit_ms.max(0) as u64
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit_bytes.max(0) as u64
    }
}
