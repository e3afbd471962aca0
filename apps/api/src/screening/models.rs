use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::providers::CandidateProjection;
use crate::screening::category::{CategorySource, MatchCategory, ResolvedCategory};

/// Reviewer-controlled screening status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ScreeningStatus {
    pub const ALL: [ScreeningStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ScreeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreeningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown screening status '{other}'")),
        }
    }
}

/// The four AI-screening fields. They only ever exist together: a record holds
/// `Some(AiScreening)` or nothing, so a partial write is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiScreening {
    pub screening_score: u8,
    pub screening_notes: String,
    pub ai_summary: String,
    pub match_category: MatchCategory,
    /// Whether the provider supplied the category or it fell back to the score bands.
    pub category_source: CategorySource,
}

/// The per-candidate unit of work processed by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Free-text position or a job id reference.
    pub applied_position: String,
    pub job_id: Option<Uuid>,
    pub folder_id: Option<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    /// Reference to the uploaded resume file handed to the extractor.
    pub resume_url: Option<String>,
    pub resume_text: Option<String>,
    pub parsed_resume_path: Option<String>,
    pub match_score: Option<u8>,
    pub ai_screening: Option<AiScreening>,
    pub status: ScreeningStatus,
    /// Minutes a reviewer spent on the application, when tracked.
    pub review_time: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl CandidateRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            applied_position: position.into(),
            job_id: None,
            folder_id: None,
            skills: Vec::new(),
            experience: String::new(),
            education: String::new(),
            resume_url: None,
            resume_text: None,
            parsed_resume_path: None,
            match_score: None,
            ai_screening: None,
            status: ScreeningStatus::Pending,
            review_time: None,
            created_at: Utc::now(),
        }
    }

    /// A candidate is awaiting AI review until the classifier has written its judgment.
    pub fn awaiting_ai_review(&self) -> bool {
        self.ai_screening.is_none()
    }

    /// The minimal projection sent to the classification provider.
    pub fn projection(&self) -> CandidateProjection {
        CandidateProjection {
            id: self.id.to_string(),
            name: self.name.clone(),
            skills: self.skills.clone(),
            experience: self.experience.clone(),
            education: self.education.clone(),
            position: self.applied_position.clone(),
            resume: self.resume_text.clone(),
        }
    }

    /// Category for display. A provider judgment wins over the score-derived value.
    pub fn resolved_category(&self) -> Option<ResolvedCategory> {
        match (&self.ai_screening, self.match_score) {
            (Some(ai), _) => Some(ResolvedCategory {
                category: ai.match_category,
                source: ai.category_source,
            }),
            (None, Some(score)) => Some(ResolvedCategory::from_score(score)),
            (None, None) => None,
        }
    }
}

/// Read-only job input to the fit-score estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub skills: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ScreeningStatus::ALL {
            assert_eq!(status.as_str().parse::<ScreeningStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ScreeningStatus>().is_err());
        assert_eq!(" Approved ".parse::<ScreeningStatus>().unwrap(), ScreeningStatus::Approved);
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&ScreeningStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
    }

    #[test]
    fn test_new_candidate_is_pending_and_unscreened() {
        let c = CandidateRecord::new("Ada", "ada@example.com", "Backend Engineer");
        assert_eq!(c.status, ScreeningStatus::Pending);
        assert!(c.awaiting_ai_review());
        assert!(c.resolved_category().is_none());
    }

    #[test]
    fn test_projection_carries_only_classifier_fields() {
        let mut c = CandidateRecord::new("Ada", "ada@example.com", "Backend Engineer");
        c.skills = vec!["Rust".to_string(), "SQL".to_string()];
        c.resume_text = Some("resume".to_string());
        let p = c.projection();
        assert_eq!(p.id, c.id.to_string());
        assert_eq!(p.position, "Backend Engineer");
        assert_eq!(p.skills, c.skills);
        assert_eq!(p.resume.as_deref(), Some("resume"));
    }

    #[test]
    fn test_provider_category_takes_precedence_over_score() {
        let mut c = CandidateRecord::new("Ada", "ada@example.com", "Backend Engineer");
        c.match_score = Some(92);
        assert_eq!(
            c.resolved_category().unwrap().category,
            MatchCategory::HighMatch
        );

        c.ai_screening = Some(AiScreening {
            screening_score: 60,
            screening_notes: "Thin on distributed systems.".to_string(),
            ai_summary: "Mid-level".to_string(),
            match_category: MatchCategory::LowMatch,
            category_source: CategorySource::Provider,
        });
        let resolved = c.resolved_category().unwrap();
        assert_eq!(resolved.category, MatchCategory::LowMatch);
        assert_eq!(resolved.source, CategorySource::Provider);

        // a judgment whose category came from the score bands keeps that label
        if let Some(ai) = c.ai_screening.as_mut() {
            ai.match_category = MatchCategory::HighMatch;
            ai.category_source = CategorySource::Score;
        }
        let resolved = c.resolved_category().unwrap();
        assert_eq!(resolved.source, CategorySource::Score);
    }
}
