//! C6: submission lifecycle (spec §4.6). A thin guard in front of
//! [`SubmissionRepository`] that enforces the monotonic
//! `Submitted -> Executing -> Finished` transition (spec §3 invariant)
//! before delegating the write.

use std::sync::Arc;
use uuid::Uuid;

use crate::constants::submission_status;
use crate::db::repositories::SubmissionRepository;
use crate::error::{CoreError, CoreResult};
use crate::models::submission::{Submission, SubmissionPatch};

/// Wraps a [`SubmissionRepository`] and rejects any update that would
/// regress `status`, independent of whatever the caller (dispatcher,
/// scheduler panic recovery) asks for.
pub struct Lifecycle {
    submissions: Arc<dyn SubmissionRepository>,
}

impl Lifecycle {
    pub fn new(submissions: Arc<dyn SubmissionRepository>) -> Self {
        Self { submissions }
    }

    /// Thin pass-through to `load_submission` (spec §4.6): reads carry no
    /// invariant to guard.
    pub async fn load(&self, uuid: Uuid) -> CoreResult<Option<Submission>> {
        self.submissions.load(uuid).await
    }

    /// Transition `uuid` to `patch.status`, rejecting regressions.
    pub async fn transition(&self, uuid: Uuid, patch: SubmissionPatch) -> CoreResult<()> {
        let current = self
            .submissions
            .load(uuid)
            .await?
            .ok_or(CoreError::NotFound(crate::error::NotFoundKind::Submission))?;

        if patch.status < current.status {
            return Err(CoreError::Configuration(format!(
                "refusing to regress submission {uuid} status {} -> {}",
                current.status, patch.status
            )));
        }

        if patch.status == submission_status::FINISHED && current.status == submission_status::FINISHED {
            return Err(CoreError::Configuration(format!(
                "submission {uuid} already finished, refusing a second Finished write"
            )));
        }

        self.submissions.update(uuid, patch).await
    }
}
