//! Persistence collaborator. The screening core never writes storage itself;
//! callers save the records each component returns through this trait.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, JobRow};
use crate::screening::models::{CandidateRecord, JobSpec};

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>>;

    async fn get_candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>>;

    async fn save_candidate(&self, record: &CandidateRecord) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobSpec>>;
}

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>> {
        let rows: Vec<CandidateRow> =
            sqlx::query_as("SELECT * FROM candidate_screenings ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(CandidateRow::into_record).collect()
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<CandidateRecord>> {
        let row: Option<CandidateRow> =
            sqlx::query_as("SELECT * FROM candidate_screenings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(CandidateRow::into_record).transpose()
    }

    /// Upserts the whole record. The four AI columns are bound from one
    /// `Option<AiScreening>`, so they are written together or cleared together.
    async fn save_candidate(&self, record: &CandidateRecord) -> Result<()> {
        let ai = record.ai_screening.as_ref();

        sqlx::query(
            r#"
            INSERT INTO candidate_screenings
                (id, name, email, applied_position, job_id, folder_id, skills,
                 experience, education, resume_url, resume_text, parsed_resume_path,
                 match_score, screening_score, screening_notes, ai_summary, match_category,
                 category_source, status, review_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, now())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                applied_position = EXCLUDED.applied_position,
                job_id = EXCLUDED.job_id,
                folder_id = EXCLUDED.folder_id,
                skills = EXCLUDED.skills,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education,
                resume_url = EXCLUDED.resume_url,
                resume_text = EXCLUDED.resume_text,
                parsed_resume_path = EXCLUDED.parsed_resume_path,
                match_score = EXCLUDED.match_score,
                screening_score = EXCLUDED.screening_score,
                screening_notes = EXCLUDED.screening_notes,
                ai_summary = EXCLUDED.ai_summary,
                match_category = EXCLUDED.match_category,
                category_source = EXCLUDED.category_source,
                status = EXCLUDED.status,
                review_time = EXCLUDED.review_time,
                updated_at = now()
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.applied_position)
        .bind(record.job_id)
        .bind(&record.folder_id)
        .bind(&record.skills)
        .bind(&record.experience)
        .bind(&record.education)
        .bind(&record.resume_url)
        .bind(&record.resume_text)
        .bind(&record.parsed_resume_path)
        .bind(record.match_score.map(i16::from))
        .bind(ai.map(|a| i16::from(a.screening_score)))
        .bind(ai.map(|a| a.screening_notes.as_str()))
        .bind(ai.map(|a| a.ai_summary.as_str()))
        .bind(ai.map(|a| a.match_category.label()))
        .bind(ai.map(|a| a.category_source.as_str()))
        .bind(record.status.as_str())
        .bind(record.review_time)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        info!(candidate = %record.id, "candidate record saved");
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobSpec>> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id, title, description, requirements, responsibilities, skills FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobSpec::from))
    }
}
