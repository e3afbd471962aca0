// Shared system prompts. Screening-specific prompt templates live in
// `screening::prompts`; only output-format contracts belong here.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for the fit-score call. The reply is still parsed defensively.
pub const BARE_INTEGER_SYSTEM: &str = "You are an experienced technical recruiter. \
    You MUST respond with a single integer between 0 and 100 and nothing else. \
    No words, no punctuation, no explanation.";
