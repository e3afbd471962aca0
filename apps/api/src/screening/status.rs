//! Screening status state machine.
//!
//! `pending` is initial; `approved` and `rejected` are terminal for automatic
//! processing. Reviewers move between them with `transition`; only `reopen`
//! (an explicit reassignment) leads back to `pending`.

use serde::Serialize;

use crate::screening::error::ScreeningError;
use crate::screening::models::{CandidateRecord, ScreeningStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    Changed,
    /// The candidate already had the requested status. Reported as success.
    Unchanged,
}

/// Reviewer decision. Requesting the current status is an idempotent no-op;
/// `pending` is never a valid target here.
pub fn transition(
    candidate: &CandidateRecord,
    target: ScreeningStatus,
) -> Result<(CandidateRecord, TransitionOutcome), ScreeningError> {
    if candidate.status == target {
        return Ok((candidate.clone(), TransitionOutcome::Unchanged));
    }
    if target == ScreeningStatus::Pending {
        return Err(ScreeningError::InvalidTransition {
            from: candidate.status,
            to: target,
        });
    }

    let mut updated = candidate.clone();
    updated.status = target;
    Ok((updated, TransitionOutcome::Changed))
}

/// Explicit reviewer re-open of a decided candidate.
pub fn reopen(candidate: &CandidateRecord) -> (CandidateRecord, TransitionOutcome) {
    if candidate.status == ScreeningStatus::Pending {
        return (candidate.clone(), TransitionOutcome::Unchanged);
    }
    let mut updated = candidate.clone();
    updated.status = ScreeningStatus::Pending;
    (updated, TransitionOutcome::Changed)
}

/// Decision targets a caller should offer as enabled controls.
pub fn enabled_actions(status: ScreeningStatus) -> Vec<ScreeningStatus> {
    [ScreeningStatus::Approved, ScreeningStatus::Rejected]
        .into_iter()
        .filter(|target| *target != status)
        .collect()
}
