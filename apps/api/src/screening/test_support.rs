//! Fakes and fixtures shared by the screening tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::providers::{
    CandidateProjection, ClassificationJudgment, ClassificationProvider, ExtractionProvider,
    ExtractionRequest, ExtractionResponse, ProviderError, ScoringProvider,
};
use crate::screening::models::{CandidateRecord, JobSpec};
use crate::screening::store::CandidateStore;

pub fn candidate(n: usize) -> CandidateRecord {
    let mut c = CandidateRecord::new(
        format!("Candidate {n}"),
        format!("candidate{n}@example.com"),
        "Frontend Engineer",
    );
    c.skills = vec!["JavaScript".to_string(), "React".to_string()];
    c.experience = format!("{n} years");
    c.education = "BSc Computer Science".to_string();
    c
}

pub fn candidates(count: usize) -> Vec<CandidateRecord> {
    (1..=count).map(candidate).collect()
}

pub fn job() -> JobSpec {
    JobSpec {
        id: Uuid::new_v4(),
        title: "Frontend Engineer".to_string(),
        description: "Own the candidate dashboard end to end.".to_string(),
        requirements: vec!["3+ years JavaScript".to_string(), "React".to_string()],
        responsibilities: vec!["Build UI features".to_string()],
        skills: vec!["JavaScript".to_string(), "React".to_string()],
    }
}

fn exhausted() -> ProviderError {
    ProviderError::Decode("script exhausted".to_string())
}

pub struct ScriptedExtractor {
    name: String,
    script: Mutex<VecDeque<Result<ExtractionResponse, ProviderError>>>,
    requests: Mutex<Vec<ExtractionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedExtractor {
    pub fn new(name: &str, script: Vec<Result<ExtractionResponse, ProviderError>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionProvider for ScriptedExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Err(exhausted()))
    }
}

pub struct ScriptedScorer {
    name: String,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedScorer {
    pub fn new(name: &str, script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringProvider for ScriptedScorer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Err(exhausted()))
    }
}

/// Echoes a "Medium Match" judgment for every candidate it is sent.
pub struct ScriptedClassifier {
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
}

impl ScriptedClassifier {
    pub fn echo() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            fail_on_call: None,
            delay: None,
        }
    }

    /// Fails the n-th call (1-based).
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassificationProvider for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted-classifier"
    }

    async fn classify(
        &self,
        candidates: &[CandidateProjection],
    ) -> Result<Vec<ClassificationJudgment>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.batch_sizes.lock().unwrap().push(candidates.len());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_call == Some(call) {
            return Err(ProviderError::Status {
                status: 503,
                message: "classifier unavailable".to_string(),
            });
        }

        Ok(candidates
            .iter()
            .map(|c| ClassificationJudgment {
                id: c.id.clone(),
                ai_summary: format!("{} looks reasonable", c.name),
                screening_score: 75.0,
                screening_notes: "Match Category: Medium Match. Echoed.".to_string(),
                match_category: Some("Medium Match".to_string()),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    candidates: Mutex<Vec<CandidateRecord>>,
    jobs: Mutex<HashMap<Uuid, JobSpec>>,
    failing_saves: Mutex<HashSet<Uuid>>,
}

impl InMemoryStore {
    pub fn with(candidates: Vec<CandidateRecord>, jobs: Vec<JobSpec>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            jobs: Mutex::new(jobs.into_iter().map(|j| (j.id, j)).collect()),
            failing_saves: Mutex::new(HashSet::new()),
        }
    }

    /// Makes every later save of this candidate fail.
    pub fn fail_saves_for(&self, id: Uuid) {
        self.failing_saves.lock().unwrap().insert(id);
    }

    pub fn snapshot(&self) -> Vec<CandidateRecord> {
        self.candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>> {
        Ok(self.snapshot())
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>> {
        Ok(self.snapshot().into_iter().find(|c| c.id == id))
    }

    async fn save_candidate(&self, record: &CandidateRecord) -> Result<()> {
        if self.failing_saves.lock().unwrap().contains(&record.id) {
            anyhow::bail!("store rejected write for {}", record.id);
        }
        let mut candidates = self.candidates.lock().unwrap();
        match candidates.iter_mut().find(|c| c.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => candidates.push(record.clone()),
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobSpec>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }
}
