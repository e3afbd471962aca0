use std::sync::Arc;

use tokio::sync::Mutex;

use crate::screening::estimator::FitScoreEstimator;
use crate::screening::extractor::DocumentExtractor;
use crate::screening::orchestrator::BatchOrchestrator;
use crate::screening::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    pub extractor: Arc<DocumentExtractor>,
    pub estimator: Arc<FitScoreEstimator>,
    pub orchestrator: Arc<BatchOrchestrator>,
    /// Held for the lifetime of a screening run. The orchestrator does not
    /// deduplicate overlapping runs, so the HTTP layer refuses a second one.
    pub run_guard: Arc<Mutex<()>>,
}
