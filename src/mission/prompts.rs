//! Prompt templates for the three judging stages.
//!
//! Every template ends with the JSON shape the model must return; the
//! placeholders are strings so the model does not copy example values.

use super::types::{AnalysisMode, ChecklistItem, MissionCategory};

/// Policy text used when the configuration does not provide one.
pub const DEFAULT_POLICY: &str = "- cleaning: 2 before/after photos recommended
- homework: the result photo alone is enough to grade
- habit: grade conservatively when evidence is weak
- pass threshold: 60%";

pub fn checklist_prompt(category: MissionCategory, details: &str, policy: &str) -> String {
    format!(
        r#"You are a checklist and upload-guideline generator for verifying a child's mission.

[Category]
{category}

[Parent's details]
{details}

[Policy]
{policy}

Rules:
- Only write criteria that can be verified from photos
- The checklist must contain 3 to 10 items
- Every item needs an evidence_hint saying what a photo must show
- Output JSON only

Schema:
{{
  "category": "{category}",
  "mission_summary": "...",
  "keywords": ["..."],
  "checklist": [
    {{"item": "...", "evidence_hint": "..."}}
  ],
  "upload_guidelines": {{
    "recommended_photos": number,
    "instructions": ["..."]
  }},
  "success_criteria": "..."
}}"#,
        category = category,
        details = details.trim(),
        policy = policy.trim(),
    )
}

fn mode_guidance(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::BeforeAfter => {
            "Photo 1 is BEFORE and Photo 2 is AFTER. Compare them and list every visible difference in notable_changes."
        }
        AnalysisMode::EvidenceOnly => {
            "Treat each photo as independent evidence of the finished result. notable_changes may stay empty."
        }
    }
}

pub fn analysis_prompt(mode: AnalysisMode, mission_json: &str) -> String {
    format!(
        r#"You are a mission evidence photo analyzer.
Do not speculate. Describe only facts that are directly observable in the photos.
If something is unreadable or ambiguous, write "unreadable/unclear" instead of guessing.
Do not infer identity, age, location or any other personal information about people.

[Mode] {mode}
{guidance}

[Mission summary (JSON)]
{mission_json}

Output (JSON only):
{{
  "mode": "{mode}",
  "observations": ["..."],
  "per_photo_notes": [
    {{"photo_index": 1, "note": "..."}}
  ],
  "notable_changes": ["..."],
  "caveats": ["..."]
}}"#,
        mode = mode,
        guidance = mode_guidance(mode),
        mission_json = mission_json,
    )
}

/// Render the checklist for the grading prompt.
pub fn checklist_json(checklist: &[ChecklistItem]) -> String {
    serde_json::to_string(checklist).unwrap_or_else(|_| "[]".to_string())
}

pub fn grading_prompt(checklist_json: &str, analysis_json: &str) -> String {
    format!(
        r#"You are a mission grader.

[Checklist]
{checklist_json}

[Photo analysis]
{analysis_json}

Rules:
- Score every checklist item: achieved = 1, partial = 0.5, unmet = 0
- completion_percent = average item score * 100
- pass = true when completion_percent >= 60
- When the evidence is ambiguous, grade down (partial or unmet), never up
- Output JSON only

Schema:
{{
  "completion_percent": number,
  "pass": boolean,
  "reason_summary": ["..."],
  "item_grades": [
    {{"item": "...", "status": "achieved|partial|unmet", "evidence": "..."}}
  ],
  "missing_or_unclear": ["..."],
  "next_request_to_child": ["..."]
}}"#,
        checklist_json = checklist_json,
        analysis_json = analysis_json,
    )
}
