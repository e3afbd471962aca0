//! Candidate filter / sort / group engine. Pure functions over in-memory records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::screening::models::{CandidateRecord, ScreeningStatus};

/// `all` is the unset sentinel; anything else must name a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ScreeningStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => "all".to_string(),
            StatusFilter::Only(status) => status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Email,
    AppliedPosition,
    Status,
    MatchCategory,
    MatchScore,
    ScreeningScore,
    ReviewTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Filter and sort parameters. Every criterion at its unset value is skipped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub job_role: Option<String>,
    pub folder: Option<String>,
    pub sort_key: Option<SortKey>,
    pub sort_direction: SortDirection,
}

/// `None` and the literal `all` both mean "don't filter on this".
fn criterion(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn matches_search(candidate: &CandidateRecord, needle_lower: &str) -> bool {
    candidate.name.to_lowercase().contains(needle_lower)
        || candidate.email.to_lowercase().contains(needle_lower)
        || candidate.skills.join(" ").to_lowercase().contains(needle_lower)
}

pub fn matches(candidate: &CandidateRecord, params: &ViewParams) -> bool {
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !matches_search(candidate, &search.to_lowercase()) {
            return false;
        }
    }
    if let StatusFilter::Only(status) = params.status {
        if candidate.status != status {
            return false;
        }
    }
    if let Some(role) = criterion(&params.job_role) {
        if candidate.applied_position != role {
            return false;
        }
    }
    if let Some(folder) = criterion(&params.folder) {
        if candidate.folder_id.as_deref() != Some(folder) {
            return false;
        }
    }
    true
}

/// Unicode lowercase, then code-point order; raw text breaks ties. This is not
/// locale collation: accented letters sort after `z`.
fn case_folded_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn text_field(candidate: &CandidateRecord, key: SortKey) -> String {
    match key {
        SortKey::Name => candidate.name.clone(),
        SortKey::Email => candidate.email.clone(),
        SortKey::AppliedPosition => candidate.applied_position.clone(),
        SortKey::Status => candidate.status.as_str().to_string(),
        SortKey::MatchCategory => candidate
            .resolved_category()
            .map(|r| r.category.label().to_string())
            .unwrap_or_default(),
        SortKey::MatchScore | SortKey::ScreeningScore | SortKey::ReviewTime => String::new(),
    }
}

fn numeric_field(candidate: &CandidateRecord, key: SortKey) -> Option<i64> {
    match key {
        SortKey::MatchScore => candidate.match_score.map(i64::from),
        SortKey::ScreeningScore => candidate
            .ai_screening
            .as_ref()
            .map(|a| i64::from(a.screening_score)),
        SortKey::ReviewTime => candidate.review_time,
        _ => None,
    }
}

fn is_numeric(key: SortKey) -> bool {
    matches!(
        key,
        SortKey::MatchScore | SortKey::ScreeningScore | SortKey::ReviewTime
    )
}

/// Ascending comparison for one key. Missing numbers sort before present ones.
pub fn compare(a: &CandidateRecord, b: &CandidateRecord, key: SortKey) -> Ordering {
    if is_numeric(key) {
        numeric_field(a, key).cmp(&numeric_field(b, key))
    } else {
        case_folded_compare(&text_field(a, key), &text_field(b, key))
    }
}

/// Filters conjunctively, then stable-sorts. No sort key keeps input order.
pub fn view(candidates: &[CandidateRecord], params: &ViewParams) -> Vec<CandidateRecord> {
    let mut out: Vec<CandidateRecord> = candidates
        .iter()
        .filter(|c| matches(c, params))
        .cloned()
        .collect();

    if let Some(key) = params.sort_key {
        out.sort_by(|a, b| {
            let ordering = compare(a, b, key);
            match params.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
    out
}

/// `StatusFilter::All` counts every candidate rather than none.
pub fn count_by_status(candidates: &[CandidateRecord], status: StatusFilter) -> usize {
    match status {
        StatusFilter::All => candidates.len(),
        StatusFilter::Only(s) => candidates.iter().filter(|c| c.status == s).count(),
    }
}

pub fn count_by_job(candidates: &[CandidateRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for candidate in candidates {
        *counts.entry(candidate.applied_position.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

pub fn status_counts(candidates: &[CandidateRecord]) -> StatusCounts {
    StatusCounts {
        all: count_by_status(candidates, StatusFilter::All),
        pending: count_by_status(candidates, StatusFilter::Only(ScreeningStatus::Pending)),
        approved: count_by_status(candidates, StatusFilter::Only(ScreeningStatus::Approved)),
        rejected: count_by_status(candidates, StatusFilter::Only(ScreeningStatus::Rejected)),
    }
}
