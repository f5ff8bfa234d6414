//! Submission model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::constants::{submission_result, submission_status};

/// Submission database model.
///
/// `status`/`result` are stored as the numeric codes from
/// `constants::submission_status`/`constants::submission_result` rather
/// than string verdicts, matching the persisted schema these codes come
/// from.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub uuid: Uuid,
    pub problem_uuid: Uuid,
    pub author_uuid: Uuid,
    #[serde(skip_serializing)]
    pub content: String,
    pub language: String,
    pub status: i16,
    pub result: Option<i16>,
    pub grading_result: Option<String>,
    pub created_time: i64,
}

impl Submission {
    pub fn is_finished(&self) -> bool {
        self.status == submission_status::FINISHED
    }

    pub fn is_executing(&self) -> bool {
        self.status == submission_status::EXECUTING
    }
}

/// Partial update applied by C6 when transitioning a submission's state.
#[derive(Debug, Clone)]
pub struct SubmissionPatch {
    pub status: i16,
    pub result: Option<i16>,
    pub grading_result: Option<String>,
}

impl SubmissionPatch {
    pub fn executing() -> Self {
        Self {
            status: submission_status::EXECUTING,
            result: None,
            grading_result: None,
        }
    }

    pub fn finished(result: i16, grading_result: impl Into<String>) -> Self {
        Self {
            status: submission_status::FINISHED,
            result: Some(result),
            grading_result: Some(grading_result.into()),
        }
    }
}

/// Numeric submission verdict, matching `constants::submission_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum Verdict {
    Ok = submission_result::OK,
    CompileError = submission_result::COMPILE_ERROR,
    RuntimeError = submission_result::RUNTIME_ERROR,
    TimeLimitExceeded = submission_result::TIME_LIMIT_EXCEEDED,
    MemoryLimitExceeded = submission_result::MEMORY_LIMIT_EXCEEDED,
    WrongAnswer = submission_result::WRONG_ANSWER,
    UnsupportedLanguage = submission_result::UNSUPPORTED_LANGUAGE,
}

impl Verdict {
    pub fn code(self) -> i16 {
        self as i16
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::CompileError => "CompileError",
            Self::RuntimeError => "RuntimeError",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::MemoryLimitExceeded => "MemoryLimitExceeded",
            Self::WrongAnswer => "WrongAnswer",
            Self::UnsupportedLanguage => "UnsupportedLanguage",
        };
        f.write_str(s)
    }
}
