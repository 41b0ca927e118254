use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::lenient;
use crate::error::JudgeError;

/// A verdict passes at or above this completion percent.
pub const PASS_THRESHOLD: f64 = 60.0;

/// Photos beyond this count are dropped before analysis.
pub const MAX_PHOTOS: usize = 10;

/// Reasons shown to the parent in the one-line summary.
pub const MAX_SHOWN_REASONS: usize = 6;

/// Kinds of missions a parent can assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionCategory {
    Cleaning,
    Homework,
    Errand,
    Habit,
}

impl MissionCategory {
    pub const ALL: [MissionCategory; 4] = [
        MissionCategory::Cleaning,
        MissionCategory::Homework,
        MissionCategory::Errand,
        MissionCategory::Habit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionCategory::Cleaning => "cleaning",
            MissionCategory::Homework => "homework",
            MissionCategory::Errand => "errand",
            MissionCategory::Habit => "habit",
        }
    }
}

impl fmt::Display for MissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionCategory {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cleaning" | "clean" | "청소" => Ok(MissionCategory::Cleaning),
            "homework" | "숙제" => Ok(MissionCategory::Homework),
            "errand" | "심부름" => Ok(MissionCategory::Errand),
            "habit" | "습관" => Ok(MissionCategory::Habit),
            other => Err(JudgeError::InvalidInput(format!(
                "unknown mission category '{}' (expected cleaning, homework, errand or habit)",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for MissionCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One photo-verifiable sub-criterion of a mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub item: String,
    /// What a photo must show for this item to count
    #[serde(default, deserialize_with = "lenient::string")]
    pub evidence_hint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadGuidelines {
    #[serde(default, deserialize_with = "lenient::count")]
    pub recommended_photos: u32,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub instructions: Vec<String>,
}

/// Checklist and upload guidance generated for one mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionSpec {
    #[serde(default, deserialize_with = "lenient::category")]
    pub category: Option<MissionCategory>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub mission_summary: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient::checklist")]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub upload_guidelines: UploadGuidelines,
    #[serde(default, deserialize_with = "lenient::string")]
    pub success_criteria: String,
}

/// How the analyzer reads the submitted photos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Photo 1 is the "before" shot, photo 2 the "after" shot.
    BeforeAfter,
    #[default]
    #[serde(other)]
    EvidenceOnly,
}

impl AnalysisMode {
    /// Before/after comparison only applies to cleaning missions with exactly two photos.
    pub fn select(category: MissionCategory, photo_count: usize) -> Self {
        if category == MissionCategory::Cleaning && photo_count == 2 {
            AnalysisMode::BeforeAfter
        } else {
            AnalysisMode::EvidenceOnly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::BeforeAfter => "before_after",
            AnalysisMode::EvidenceOnly => "evidence_only",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted photo and its 1-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub path: PathBuf,
    pub index: usize,
}

impl PhotoRef {
    /// Number the paths from 1, keeping at most [`MAX_PHOTOS`].
    pub fn from_paths<I, P>(paths: I) -> Vec<PhotoRef>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .take(MAX_PHOTOS)
            .enumerate()
            .map(|(i, p)| PhotoRef {
                path: p.into(),
                index: i + 1,
            })
            .collect()
    }

    pub fn label(&self) -> String {
        format!("Photo {}:", self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoNote {
    #[serde(default, deserialize_with = "lenient::count")]
    pub photo_index: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub note: String,
}

/// What the analyzer saw in the photos
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationReport {
    #[serde(default, deserialize_with = "lenient::mode")]
    pub mode: AnalysisMode,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub observations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::objects")]
    pub per_photo_notes: Vec<PhotoNote>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub notable_changes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub caveats: Vec<String>,
}

/// Grade of a single checklist item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Achieved,
    Partial,
    Unmet,
    #[default]
    Unknown,
}

impl GradeStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "achieved" | "met" | "done" | "complete" | "completed" | "달성" => GradeStatus::Achieved,
            "partial" | "partially" | "partially met" | "부분" => GradeStatus::Partial,
            "unmet" | "not met" | "missing" | "failed" | "미달" => GradeStatus::Unmet,
            _ => GradeStatus::Unknown,
        }
    }

    /// Ternary score: achieved 1, partial 0.5, unmet 0.
    pub fn score(&self) -> Option<f64> {
        match self {
            GradeStatus::Achieved => Some(1.0),
            GradeStatus::Partial => Some(0.5),
            GradeStatus::Unmet => Some(0.0),
            GradeStatus::Unknown => None,
        }
    }
}

impl<'de> Deserialize<'de> for GradeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(GradeStatus::from_label(&lenient::string(deserializer)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemGrade {
    #[serde(default, deserialize_with = "lenient::string")]
    pub item: String,
    #[serde(default)]
    pub status: GradeStatus,
    #[serde(default, deserialize_with = "lenient::string")]
    pub evidence: String,
}

/// Final graded result of a mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub completion_percent: f64,
    pub pass: bool,
    #[serde(default)]
    pub reason_summary: Vec<String>,
    #[serde(default)]
    pub item_grades: Vec<ItemGrade>,
    #[serde(default)]
    pub missing_or_unclear: Vec<String>,
    #[serde(default)]
    pub next_request_to_child: Vec<String>,
    /// The pass flag the model itself reported, kept for auditing only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_pass: Option<bool>,
}

impl Verdict {
    /// Clamp to [0, 100]; NaN and infinities count as 0.
    pub fn clamp_percent(percent: f64) -> f64 {
        if !percent.is_finite() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        }
    }

    /// Verdict whose pass flag is derived from the clamped percent.
    pub fn from_percent(percent: f64) -> Self {
        let completion_percent = Self::clamp_percent(percent);
        Self {
            completion_percent,
            pass: completion_percent >= PASS_THRESHOLD,
            ..Self::default()
        }
    }

    /// Mean of the graded checklist items as a percent, ignoring unknowns.
    pub fn item_grade_percent(&self) -> Option<f64> {
        let scores: Vec<f64> = self.item_grades.iter().filter_map(|g| g.status.score()).collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64 * 100.0)
    }

    pub fn shown_reasons(&self) -> &[String] {
        let n = self.reason_summary.len().min(MAX_SHOWN_REASONS);
        &self.reason_summary[..n]
    }

    /// The model's own pass flag, when it contradicts the recomputed one.
    pub fn disagreement(&self) -> Option<bool> {
        self.model_pass.filter(|&p| p != self.pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parsing() {
        assert_eq!("Cleaning".parse::<MissionCategory>().unwrap(), MissionCategory::Cleaning);
        assert_eq!(" homework ".parse::<MissionCategory>().unwrap(), MissionCategory::Homework);
        assert_eq!("심부름".parse::<MissionCategory>().unwrap(), MissionCategory::Errand);
        assert_eq!("습관".parse::<MissionCategory>().unwrap(), MissionCategory::Habit);
        assert!("laundry".parse::<MissionCategory>().is_err());
    }

    #[test]
    fn test_mode_selection_table() {
        for category in MissionCategory::ALL {
            for count in 0..=MAX_PHOTOS {
                let expected = if category == MissionCategory::Cleaning && count == 2 {
                    AnalysisMode::BeforeAfter
                } else {
                    AnalysisMode::EvidenceOnly
                };
                assert_eq!(AnalysisMode::select(category, count), expected);
            }
        }
    }

    #[test]
    fn test_photo_refs_are_numbered_and_capped() {
        let paths: Vec<String> = (0..12).map(|i| format!("p{}.jpg", i)).collect();
        let refs = PhotoRef::from_paths(paths);

        assert_eq!(refs.len(), MAX_PHOTOS);
        assert_eq!(refs[0].index, 1);
        assert_eq!(refs[9].path, PathBuf::from("p9.jpg"));
        assert_eq!(refs[1].label(), "Photo 2:");
    }

    #[test]
    fn test_pass_threshold_boundary() {
        assert!(Verdict::from_percent(60.0).pass);
        assert!(!Verdict::from_percent(59.99).pass);
        assert_eq!(Verdict::from_percent(145.0).completion_percent, 100.0);
        assert_eq!(Verdict::from_percent(-3.0).completion_percent, 0.0);
        assert_eq!(Verdict::from_percent(f64::NAN).completion_percent, 0.0);
        assert_eq!(Verdict::from_percent(f64::INFINITY).completion_percent, 0.0);
        assert!(!Verdict::from_percent(f64::NEG_INFINITY).pass);
    }

    #[test]
    fn test_mission_spec_tolerates_drift() {
        let spec: MissionSpec = serde_json::from_value(json!({
            "category": "청소",
            "mission_summary": "Tidy the room",
            "checklist": ["Bed made", { "item": "Floor clear", "evidence_hint": "wide shot" }],
            "upload_guidelines": { "recommended_photos": "2", "instructions": "before and after" }
        }))
        .unwrap();

        assert_eq!(spec.category, Some(MissionCategory::Cleaning));
        assert_eq!(spec.checklist.len(), 2);
        assert_eq!(spec.checklist[0].evidence_hint, "");
        assert_eq!(spec.upload_guidelines.recommended_photos, 2);
        assert_eq!(spec.upload_guidelines.instructions, vec!["before and after"]);
        assert!(spec.success_criteria.is_empty());
    }

    #[test]
    fn test_unknown_category_is_dropped_not_fatal() {
        let spec: MissionSpec = serde_json::from_value(json!({ "category": "chores" })).unwrap();
        assert_eq!(spec.category, None);
    }

    #[test]
    fn test_grade_status_labels() {
        let grade: ItemGrade =
            serde_json::from_value(json!({ "item": "bed", "status": "Partial" })).unwrap();
        assert_eq!(grade.status, GradeStatus::Partial);
        assert_eq!(grade.status.score(), Some(0.5));
        assert_eq!(GradeStatus::from_label("달성"), GradeStatus::Achieved);
        assert_eq!(GradeStatus::from_label("maybe"), GradeStatus::Unknown);
    }

    #[test]
    fn test_item_grade_percent_skips_unknown() {
        let grade = |status| ItemGrade {
            status,
            ..ItemGrade::default()
        };
        let verdict = Verdict {
            item_grades: vec![
                grade(GradeStatus::Achieved),
                grade(GradeStatus::Partial),
                grade(GradeStatus::Unknown),
            ],
            ..Verdict::default()
        };
        assert_eq!(verdict.item_grade_percent(), Some(75.0));
        assert_eq!(Verdict::default().item_grade_percent(), None);
    }

    #[test]
    fn test_shown_reasons_capped() {
        let verdict = Verdict {
            reason_summary: (1..=9).map(|i| format!("reason {}", i)).collect(),
            ..Verdict::default()
        };
        assert_eq!(verdict.shown_reasons().len(), MAX_SHOWN_REASONS);
        assert_eq!(verdict.shown_reasons()[5], "reason 6");
        assert!(Verdict::default().shown_reasons().is_empty());
    }

    #[test]
    fn test_unknown_mode_falls_back() {
        let report: ObservationReport =
            serde_json::from_value(json!({ "mode": "comparison" })).unwrap();
        assert_eq!(report.mode, AnalysisMode::EvidenceOnly);
    }
}
