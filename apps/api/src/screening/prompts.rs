// Screening LLM prompt templates.
// All prompts for the screening module are defined here.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::providers::CandidateProjection;
use crate::screening::models::JobSpec;

pub const CLASSIFICATION_SYSTEM: &str = JSON_ONLY_SYSTEM;

pub const MISSING_RESUME_PLACEHOLDER: &str = "Resume text not available.";

pub const FIT_SCORE_PROMPT_TEMPLATE: &str = r#"Rate how well this candidate fits the job on a scale from 0 to 100.

JOB TITLE:
{title}

JOB DESCRIPTION:
{description}

REQUIREMENTS:
{requirements}

RESPONSIBILITIES:
{responsibilities}

REQUIRED SKILLS:
{skills}

CANDIDATE RESUME:
{resume}

Respond with only the integer score."#;

pub const CLASSIFICATION_PROMPT_TEMPLATE: &str = r#"Screen the following candidates for the positions they applied to.

CANDIDATES (JSON):
{candidates}

For every candidate return one result. OUTPUT SCHEMA (return exactly this structure):
{
  "results": [
    {
      "id": "the candidate id, copied verbatim",
      "aiSummary": "two-sentence summary of the candidate",
      "screeningScore": 0-100,
      "screeningNotes": "Match Category: <High Match|Medium Match|Low Match|No Match>. <one-paragraph rationale>",
      "matchCategory": "High Match" | "Medium Match" | "Low Match" | "No Match"
    }
  ]
}"#;

/// Builds the fit-score prompt. Missing resume text gets an explicit placeholder
/// so the model still returns a score.
pub fn build_fit_prompt(job: &JobSpec, resume_text: Option<&str>) -> String {
    let resume = resume_text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(MISSING_RESUME_PLACEHOLDER);

    let requirements = job.requirements.join("\n");
    let responsibilities = job.responsibilities.join("\n");
    let skills = job.skills.join(", ");

    fill_template(
        FIT_SCORE_PROMPT_TEMPLATE,
        &[
            ("title", job.title.as_str()),
            ("description", job.description.as_str()),
            ("requirements", requirements.as_str()),
            ("responsibilities", responsibilities.as_str()),
            ("skills", skills.as_str()),
            ("resume", resume),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass over the template, so braces
/// inside substituted values are never expanded again. Unknown placeholders
/// are left as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn build_classification_prompt(
    candidates: &[CandidateProjection],
) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_string_pretty(candidates)?;
    Ok(CLASSIFICATION_PROMPT_TEMPLATE.replace("{candidates}", &encoded))
}
