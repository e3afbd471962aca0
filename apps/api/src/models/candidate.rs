use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use crate::screening::category::{
    resolve_judgment_category, CategorySource, MatchCategory, ResolvedCategory,
};
use crate::screening::models::{AiScreening, CandidateRecord, JobSpec};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub applied_position: String,
    pub job_id: Option<Uuid>,
    pub folder_id: Option<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    pub resume_url: Option<String>,
    pub resume_text: Option<String>,
    pub parsed_resume_path: Option<String>,
    pub match_score: Option<i16>,
    pub screening_score: Option<i16>,
    pub screening_notes: Option<String>,
    pub ai_summary: Option<String>,
    pub match_category: Option<String>,
    pub category_source: Option<String>,
    pub status: String,
    pub review_time: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub skills: Vec<String>,
}

impl From<JobRow> for JobSpec {
    fn from(row: JobRow) -> Self {
        JobSpec {
            id: row.id,
            title: row.title,
            description: row.description,
            requirements: row.requirements,
            responsibilities: row.responsibilities,
            skills: row.skills,
        }
    }
}

fn clamp_score(raw: i16) -> u8 {
    raw.clamp(0, 100) as u8
}

impl CandidateRow {
    /// Rows with only some of the AI columns populated load as unscreened.
    fn ai_screening(&self) -> Option<AiScreening> {
        match (
            self.screening_score,
            &self.screening_notes,
            &self.ai_summary,
            &self.match_category,
        ) {
            (Some(score), Some(notes), Some(summary), Some(category)) => {
                let score = clamp_score(score);
                let resolved = match category.parse::<MatchCategory>() {
                    Ok(category) => ResolvedCategory {
                        category,
                        source: self
                            .category_source
                            .as_deref()
                            .and_then(|s| s.parse().ok())
                            .unwrap_or(CategorySource::Provider),
                    },
                    Err(_) => resolve_judgment_category(None, notes, score),
                };
                Some(AiScreening {
                    screening_score: score,
                    screening_notes: notes.clone(),
                    ai_summary: summary.clone(),
                    match_category: resolved.category,
                    category_source: resolved.source,
                })
            }
            (None, None, None, None) => None,
            _ => {
                warn!(candidate = %self.id, "partial AI screening columns ignored");
                None
            }
        }
    }

    pub fn into_record(self) -> Result<CandidateRecord> {
        let status = self
            .status
            .parse()
            .map_err(|e: String| anyhow!("candidate {}: {e}", self.id))?;
        let ai_screening = self.ai_screening();

        Ok(CandidateRecord {
            id: self.id,
            name: self.name,
            email: self.email,
            applied_position: self.applied_position,
            job_id: self.job_id,
            folder_id: self.folder_id,
            skills: self.skills,
            experience: self.experience,
            education: self.education,
            resume_url: self.resume_url,
            resume_text: self.resume_text,
            parsed_resume_path: self.parsed_resume_path,
            match_score: self.match_score.map(clamp_score),
            ai_screening,
            status,
            review_time: self.review_time,
            created_at: self.created_at,
        })
    }
}
