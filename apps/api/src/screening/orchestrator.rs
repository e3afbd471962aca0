//! Batch Screening Orchestrator.
//!
//! Partitions candidates into fixed-size batches, classifies each batch with a
//! single provider call, and merges the narrow judgments back onto copies of the
//! original records by id. Batches run strictly one after another with a fixed
//! delay in between; no two provider calls are ever in flight at once.
//!
//! Run state and progress are published on a `watch` channel:
//! `idle → running → {completed | failed}`. Percentages never decrease within a
//! run and only reach 100 once every batch has merged.
//!
//! Single-flight is the caller's responsibility. There is no mid-run
//! cancellation; callers that need it must ignore late results.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::providers::{with_timeout, ClassificationJudgment, ClassificationProvider, ProviderError};
use crate::screening::category::resolve_judgment_category;
use crate::screening::models::{AiScreening, CandidateRecord};

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    pub state: RunState,
    pub percent: u8,
}

impl RunProgress {
    pub const IDLE: RunProgress = RunProgress {
        state: RunState::Idle,
        percent: 0,
    };

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub call_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_secs(1),
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// A failed run. `partial` holds every input record: batches before
/// `batch_index` are merged, the rest are the untouched originals.
#[derive(Debug, Error)]
#[error("screening batch {} of {batch_count} failed: {source}", .batch_index + 1)]
pub struct BatchRunError {
    pub batch_index: usize,
    pub batch_count: usize,
    pub partial: Vec<CandidateRecord>,
    pub source: ProviderError,
}

pub struct BatchOrchestrator {
    provider: Arc<dyn ClassificationProvider>,
    config: OrchestratorConfig,
    progress: watch::Sender<RunProgress>,
}

impl BatchOrchestrator {
    pub fn new(provider: Arc<dyn ClassificationProvider>, config: OrchestratorConfig) -> Self {
        let (progress, _) = watch::channel(RunProgress::IDLE);
        Self {
            provider,
            config,
            progress,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> RunProgress {
        *self.progress.borrow()
    }

    fn publish(&self, state: RunState, percent: u8) {
        self.progress.send_replace(RunProgress { state, percent });
    }

    /// Runs one screening pass. The input is never mutated; the returned vector
    /// has the same length and order as `candidates`.
    pub async fn run(
        &self,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<CandidateRecord>, BatchRunError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let total = candidates.len();
        let batch_size = self.config.batch_size.max(1);
        let batch_count = total.div_ceil(batch_size);
        let mut merged = candidates.to_vec();
        let mut processed = 0;

        self.publish(RunState::Running, 0);
        info!(
            provider = self.provider.name(),
            total, batch_count, "screening run started"
        );

        for (batch_index, batch) in candidates.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let projections: Vec<_> = batch.iter().map(CandidateRecord::projection).collect();
            let judgments = match with_timeout(
                self.config.call_timeout,
                self.provider.classify(&projections),
            )
            .await
            {
                Ok(judgments) => judgments,
                Err(source) => {
                    let percent = self.progress().percent;
                    self.publish(RunState::Failed, percent);
                    warn!(
                        batch = batch_index + 1,
                        batch_count, processed, "screening run failed: {source}"
                    );
                    return Err(BatchRunError {
                        batch_index,
                        batch_count,
                        partial: merged,
                        source,
                    });
                }
            };

            let start = batch_index * batch_size;
            let applied = merge_judgments(&mut merged[start..start + batch.len()], judgments);
            processed += batch.len();

            let state = if processed == total {
                RunState::Completed
            } else {
                RunState::Running
            };
            self.publish(state, progress_percent(processed, total));
            debug!(
                batch = batch_index + 1,
                batch_count, applied, "screening batch merged"
            );
        }

        info!(total, "screening run completed");
        Ok(merged)
    }
}

/// `round(processed / total * 100)`, held below 100 until every candidate is done.
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 || processed >= total {
        return 100;
    }
    let rounded = (processed * 100 + total / 2) / total;
    rounded.min(99) as u8
}

/// Applies judgments to the records of one batch by id. Judgments that match no
/// record are dropped; nothing outside the four AI fields is touched.
fn merge_judgments(batch: &mut [CandidateRecord], judgments: Vec<ClassificationJudgment>) -> usize {
    let mut applied = 0;
    for judgment in judgments {
        let Some(record) = batch
            .iter_mut()
            .find(|r| r.id.to_string() == judgment.id.trim())
        else {
            debug!(id = %judgment.id, "dropping judgment for unknown candidate");
            continue;
        };
        record.ai_screening = Some(judgment_to_screening(judgment));
        applied += 1;
    }
    applied
}

fn judgment_to_screening(judgment: ClassificationJudgment) -> AiScreening {
    let screening_score = if judgment.screening_score.is_finite() {
        judgment.screening_score.round().clamp(0.0, 100.0) as u8
    } else {
        0
    };
    let resolved = resolve_judgment_category(
        judgment.match_category.as_deref(),
        &judgment.screening_notes,
        screening_score,
    );

    AiScreening {
        screening_score,
        screening_notes: judgment.screening_notes,
        ai_summary: judgment.ai_summary,
        match_category: resolved.category,
        category_source: resolved.source,
    }
}
