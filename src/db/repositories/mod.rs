//! Database repositories.
//!
//! Each repository is exposed as a trait (so [`crate::lifecycle`] and
//! [`crate::dispatcher`] can be unit-tested with `mockall` against an
//! in-memory double) plus a Postgres implementation backing it.

pub mod problem_repo;
pub mod submission_repo;
pub mod test_case_repo;

pub use problem_repo::{PgProblemRepository, ProblemRepository};
pub use submission_repo::{PgSubmissionRepository, SubmissionRepository};
pub use test_case_repo::{PgTestCaseRepository, TestCaseRepository};
