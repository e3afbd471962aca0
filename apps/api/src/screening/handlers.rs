//! Axum route handlers for the Screening API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::providers::ExtractionRequest;
use crate::screening::category::{screening_explanation, ResolvedCategory};
use crate::screening::error::ScreeningError;
use crate::screening::models::{CandidateRecord, JobSpec, ScreeningStatus};
use crate::screening::orchestrator::{BatchOrchestrator, RunProgress};
use crate::screening::status::{enabled_actions, reopen, transition, TransitionOutcome};
use crate::screening::store::CandidateStore;
use crate::screening::view::{count_by_job, status_counts, view, StatusCounts, ViewParams};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// A candidate as rendered by callers. Missing score or summary means
/// "not yet screened", never an error.
#[derive(Debug, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: CandidateRecord,
    pub resolved_category: Option<ResolvedCategory>,
    pub screening_explanation: Option<String>,
    pub enabled_actions: Vec<ScreeningStatus>,
}

impl From<CandidateRecord> for CandidateView {
    fn from(candidate: CandidateRecord) -> Self {
        let resolved_category = candidate.resolved_category();
        let screening_explanation = candidate
            .ai_screening
            .as_ref()
            .map(|ai| screening_explanation(&ai.screening_notes).to_string());
        let enabled_actions = enabled_actions(candidate.status);
        Self {
            candidate,
            resolved_category,
            screening_explanation,
            enabled_actions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountsResponse {
    pub by_status: StatusCounts,
    pub by_job: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub candidate: CandidateView,
    pub extracted: bool,
    pub provider: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub candidate: CandidateView,
    pub score: u8,
    pub recovered_with_default: bool,
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct JobScoreEntry {
    pub candidate_id: Uuid,
    pub score: Option<u8>,
    pub recovered_with_default: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRunRequest {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    pub queued: usize,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: ScreeningStatus,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub candidate: CandidateView,
    pub outcome: TransitionOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load_candidate(store: &dyn CandidateStore, id: Uuid) -> Result<CandidateRecord, AppError> {
    store
        .get_candidate(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

async fn load_job(store: &dyn CandidateStore, id: Uuid) -> Result<JobSpec, AppError> {
    store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// Re-reads a candidate and applies `patch` to the stored copy. Provider calls
/// take seconds, so writes after them must not overwrite a stale snapshot.
async fn patch_candidate<F>(
    store: &dyn CandidateStore,
    id: Uuid,
    patch: F,
) -> Result<CandidateRecord, AppError>
where
    F: FnOnce(&mut CandidateRecord),
{
    let mut current = load_candidate(store, id).await?;
    patch(&mut current);
    store.save_candidate(&current).await?;
    Ok(current)
}

/// Writes only the AI screening of each merged record onto the freshest stored
/// copy, so reviewer edits made while the run was in flight survive.
async fn persist_screenings(store: &dyn CandidateStore, merged: &[CandidateRecord]) -> usize {
    let mut saved = 0;
    for record in merged {
        let Some(ai) = &record.ai_screening else {
            continue;
        };
        let result = async {
            if let Some(mut current) = store.get_candidate(record.id).await? {
                current.ai_screening = Some(ai.clone());
                store.save_candidate(&current).await?;
            }
            anyhow::Ok(())
        }
        .await;
        match result {
            Ok(()) => saved += 1,
            Err(e) => warn!(candidate = %record.id, "failed to save screening result: {e:#}"),
        }
    }
    saved
}

async fn run_and_persist(
    orchestrator: &BatchOrchestrator,
    store: &dyn CandidateStore,
    candidates: Vec<CandidateRecord>,
) {
    let merged = match orchestrator.run(&candidates).await {
        Ok(merged) => merged,
        Err(e) => {
            warn!("{e}");
            e.partial
        }
    };
    let saved = persist_screenings(store, &merged).await;
    info!(saved, "screening results persisted");
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Json<Vec<CandidateView>>, AppError> {
    let candidates = state.store.list_candidates().await?;
    Ok(Json(
        view(&candidates, &params)
            .into_iter()
            .map(CandidateView::from)
            .collect(),
    ))
}

/// GET /api/v1/candidates/counts
pub async fn handle_counts(
    State(state): State<AppState>,
) -> Result<Json<CountsResponse>, AppError> {
    let candidates = state.store.list_candidates().await?;
    Ok(Json(CountsResponse {
        by_status: status_counts(&candidates),
        by_job: count_by_job(&candidates),
    }))
}

/// POST /api/v1/candidates/:id/extract
///
/// Extraction failure is not an error response: the candidate stays textless
/// and remains available for manual review.
pub async fn handle_extract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExtractResponse>, AppError> {
    let candidate = load_candidate(state.store.as_ref(), id).await?;
    let file_reference = candidate
        .resume_url
        .clone()
        .ok_or_else(|| AppError::Validation(format!("Candidate {id} has no resume file")))?;

    let request = ExtractionRequest {
        file_reference,
        owner_id: candidate.id.to_string(),
        job_id: candidate.job_id.map(|j| j.to_string()),
    };

    match state.extractor.extract(&request).await {
        Ok(document) => {
            let provider = document.provider;
            let (text, parsed_file_path) = (document.text, document.parsed_file_path);
            let updated = patch_candidate(state.store.as_ref(), id, move |c| {
                if text.is_some() {
                    c.resume_text = text;
                }
                if parsed_file_path.is_some() {
                    c.parsed_resume_path = parsed_file_path;
                }
            })
            .await?;
            Ok(Json(ExtractResponse {
                candidate: updated.into(),
                extracted: true,
                provider: Some(provider),
                error: None,
            }))
        }
        Err(e @ ScreeningError::ExtractionFailed { .. }) => {
            warn!(candidate = %id, "{e}");
            Ok(Json(ExtractResponse {
                candidate: candidate.into(),
                extracted: false,
                provider: None,
                error: Some(e.to_string()),
            }))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/candidates/:id/score
pub async fn handle_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreResponse>, AppError> {
    let candidate = load_candidate(state.store.as_ref(), id).await?;
    let job_id = candidate
        .job_id
        .ok_or_else(|| AppError::Validation(format!("Candidate {id} is not linked to a job")))?;
    let job = load_job(state.store.as_ref(), job_id).await?;

    let estimate = state
        .estimator
        .estimate(&job, candidate.resume_text.as_deref())
        .await?;
    let score = estimate.outcome.score();
    let updated =
        patch_candidate(state.store.as_ref(), id, |c| c.match_score = Some(score)).await?;

    Ok(Json(ScoreResponse {
        candidate: updated.into(),
        score: estimate.outcome.score(),
        recovered_with_default: estimate.outcome.is_recovered(),
        provider: estimate.provider,
    }))
}

/// POST /api/v1/jobs/:job_id/score
///
/// Scores every candidate of a job. A provider failure for one candidate is
/// reported in its entry and does not stop the others.
pub async fn handle_score_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<JobScoreEntry>>, AppError> {
    let job = load_job(state.store.as_ref(), job_id).await?;
    let candidates: Vec<CandidateRecord> = state
        .store
        .list_candidates()
        .await?
        .into_iter()
        .filter(|c| c.job_id == Some(job_id))
        .collect();

    let estimates = state.estimator.estimate_all(&job, &candidates).await;

    let mut entries = Vec::with_capacity(estimates.len());
    for estimate in estimates {
        let candidate_id = estimate.candidate_id;
        let entry = match estimate.result {
            Ok(fit) => {
                let score = fit.outcome.score();
                match patch_candidate(state.store.as_ref(), candidate_id, |c| {
                    c.match_score = Some(score)
                })
                .await
                {
                    Ok(_) => JobScoreEntry {
                        candidate_id,
                        score: Some(score),
                        recovered_with_default: fit.outcome.is_recovered(),
                        error: None,
                    },
                    Err(e) => {
                        warn!(candidate = %candidate_id, "failed to save match score: {e}");
                        JobScoreEntry {
                            candidate_id,
                            score: Some(score),
                            recovered_with_default: fit.outcome.is_recovered(),
                            error: Some(format!("score not saved: {e}")),
                        }
                    }
                }
            }
            Err(e) => JobScoreEntry {
                candidate_id,
                score: None,
                recovered_with_default: false,
                error: Some(e.to_string()),
            },
        };
        entries.push(entry);
    }

    Ok(Json(entries))
}

/// POST /api/v1/screening/runs
///
/// Starts a background run over candidates awaiting AI review. Returns 409 while
/// another run holds the guard.
pub async fn handle_start_run(
    State(state): State<AppState>,
    body: Option<Json<StartRunRequest>>,
) -> Result<(StatusCode, Json<StartRunResponse>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let permit = state
        .run_guard
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Conflict("A screening run is already in progress".to_string()))?;

    let pending: Vec<CandidateRecord> = state
        .store
        .list_candidates()
        .await?
        .into_iter()
        .filter(|c| c.awaiting_ai_review())
        .filter(|c| request.job_id.map_or(true, |job| c.job_id == Some(job)))
        .collect();
    let queued = pending.len();
    info!(queued, job = ?request.job_id, "screening run requested");

    let orchestrator = state.orchestrator.clone();
    let store = state.store.clone();
    tokio::spawn(async move {
        let _permit = permit;
        run_and_persist(&orchestrator, store.as_ref(), pending).await;
    });

    Ok((StatusCode::ACCEPTED, Json(StartRunResponse { queued })))
}

/// GET /api/v1/screening/runs/progress
pub async fn handle_run_progress(State(state): State<AppState>) -> Json<RunProgress> {
    Json(state.orchestrator.progress())
}

/// POST /api/v1/candidates/:id/status
pub async fn handle_transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let candidate = load_candidate(state.store.as_ref(), id).await?;
    let (updated, outcome) = transition(&candidate, request.status)?;
    if outcome == TransitionOutcome::Changed {
        state.store.save_candidate(&updated).await?;
        info!(candidate = %id, status = %updated.status, "screening status changed");
    }
    Ok(Json(TransitionResponse {
        candidate: updated.into(),
        outcome,
    }))
}

/// POST /api/v1/candidates/:id/reopen
pub async fn handle_reopen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let candidate = load_candidate(state.store.as_ref(), id).await?;
    let (updated, outcome) = reopen(&candidate);
    if outcome == TransitionOutcome::Changed {
        state.store.save_candidate(&updated).await?;
        info!(candidate = %id, "candidate reopened for review");
    }
    Ok(Json(TransitionResponse {
        candidate: updated.into(),
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::providers::{ProviderError, ScoringProvider};
    use crate::screening::category::{CategorySource, MatchCategory};
    use crate::screening::models::AiScreening;
    use crate::screening::estimator::FitScoreEstimator;
    use crate::screening::extractor::DocumentExtractor;
    use crate::screening::orchestrator::{OrchestratorConfig, RunState};
    use crate::screening::test_support::{
        candidates, job, InMemoryStore, ScriptedClassifier, ScriptedScorer,
    };

    /// Stands in for a reviewer who approves every candidate while the
    /// fit-score call is still in flight.
    struct ApprovingScorer {
        store: Arc<InMemoryStore>,
    }

    #[async_trait]
    impl ScoringProvider for ApprovingScorer {
        fn name(&self) -> &str {
            "approving"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            for mut c in self.store.snapshot() {
                c.status = ScreeningStatus::Approved;
                self.store.save_candidate(&c).await.unwrap();
            }
            Ok("70".to_string())
        }
    }

    fn state_with(store: Arc<InMemoryStore>, scorer: Arc<dyn ScoringProvider>) -> AppState {
        AppState {
            store,
            extractor: Arc::new(DocumentExtractor::new(Vec::new(), Duration::from_secs(5))),
            estimator: Arc::new(FitScoreEstimator::new(scorer, None, Duration::from_secs(5))),
            orchestrator: Arc::new(BatchOrchestrator::new(
                Arc::new(ScriptedClassifier::echo()),
                OrchestratorConfig::default(),
            )),
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    fn linked(count: usize, job: &JobSpec) -> Vec<CandidateRecord> {
        candidates(count)
            .into_iter()
            .map(|mut c| {
                c.job_id = Some(job.id);
                c
            })
            .collect()
    }

    #[tokio::test]
    async fn test_job_scoring_keeps_status_changed_during_provider_call() {
        let spec = job();
        let store = Arc::new(InMemoryStore::with(linked(2, &spec), vec![spec.clone()]));
        let state = state_with(store.clone(), Arc::new(ApprovingScorer { store: store.clone() }));

        let Json(entries) = handle_score_job(State(state), Path(spec.id)).await.unwrap();

        assert!(entries.iter().all(|e| e.score == Some(70)));
        for stored in store.snapshot() {
            assert_eq!(stored.status, ScreeningStatus::Approved);
            assert_eq!(stored.match_score, Some(70));
        }
    }

    #[tokio::test]
    async fn test_single_score_keeps_status_changed_during_provider_call() {
        let spec = job();
        let input = linked(1, &spec);
        let id = input[0].id;
        let store = Arc::new(InMemoryStore::with(input, vec![spec]));
        let state = state_with(store.clone(), Arc::new(ApprovingScorer { store: store.clone() }));

        let Json(response) = handle_score(State(state), Path(id)).await.unwrap();

        assert_eq!(response.candidate.candidate.status, ScreeningStatus::Approved);
        let stored = store.snapshot().remove(0);
        assert_eq!(stored.status, ScreeningStatus::Approved);
        assert_eq!(stored.match_score, Some(70));
    }

    #[tokio::test]
    async fn test_job_scoring_reports_save_failure_per_candidate() {
        let spec = job();
        let input = linked(2, &spec);
        let store = Arc::new(InMemoryStore::with(input.clone(), vec![spec.clone()]));
        store.fail_saves_for(input[0].id);
        let scorer = ScriptedScorer::new("primary", vec![Ok("71".to_string()), Ok("64".to_string())]);
        let state = state_with(store.clone(), Arc::new(scorer));

        let Json(entries) = handle_score_job(State(state), Path(spec.id)).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].error.as_deref().unwrap().contains("not saved"));
        assert_eq!(entries[1].score, Some(64));
        assert!(entries[1].error.is_none());

        let stored = store.snapshot();
        assert_eq!(stored[0].match_score, None);
        assert_eq!(stored[1].match_score, Some(64));
    }

    #[tokio::test]
    async fn test_persist_keeps_reviewer_edits_made_during_run() {
        let input = candidates(2);
        let store = InMemoryStore::with(input.clone(), vec![]);

        // reviewer approves while the run is in flight
        let mut edited = input[0].clone();
        edited.status = ScreeningStatus::Approved;
        store.save_candidate(&edited).await.unwrap();

        let mut merged = input.clone();
        merged[0].ai_screening = Some(AiScreening {
            screening_score: 90,
            screening_notes: "Match Category: High Match. Great.".to_string(),
            ai_summary: "Great".to_string(),
            match_category: MatchCategory::HighMatch,
            category_source: CategorySource::Provider,
        });

        let saved = persist_screenings(&store, &merged).await;
        assert_eq!(saved, 1);

        let stored = store.snapshot();
        assert_eq!(stored[0].status, ScreeningStatus::Approved);
        assert!(stored[0].ai_screening.is_some());
        assert!(stored[1].ai_screening.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_persists_partial_results() {
        let input = candidates(7);
        let store = InMemoryStore::with(input.clone(), vec![]);
        let orchestrator = BatchOrchestrator::new(
            Arc::new(ScriptedClassifier::echo().failing_on_call(2)),
            OrchestratorConfig::default(),
        );

        run_and_persist(&orchestrator, &store, input).await;

        let stored = store.snapshot();
        assert_eq!(stored.iter().filter(|c| c.ai_screening.is_some()).count(), 5);
        assert_eq!(orchestrator.progress().state, RunState::Failed);
    }

    #[test]
    fn test_candidate_view_explains_notes() {
        let mut c = candidates(1).remove(0);
        c.ai_screening = Some(AiScreening {
            screening_score: 88,
            screening_notes: "Match Category: High Match. Strong fit.".to_string(),
            ai_summary: "Strong".to_string(),
            match_category: MatchCategory::HighMatch,
            category_source: CategorySource::Provider,
        });
        let v = CandidateView::from(c);
        assert_eq!(v.screening_explanation.as_deref(), Some("Strong fit."));
        assert_eq!(v.resolved_category.unwrap().category, MatchCategory::HighMatch);
        assert_eq!(v.enabled_actions.len(), 2);
    }
}
