use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

use mission_judge::agent::{LLMProvider, Prompt};
use mission_judge::mission::{AnalysisMode, MissionCategory, StageOutput};
use mission_judge::orchestrator::{MissionJudge, Session, SessionEvent, Step};
use mission_judge::orchestrator::{ANALYSIS_FILE, GRADE_FILE, MISSION_FILE};
use mission_judge::JudgeResult;

/// Answers by looking at which stage the prompt belongs to.
struct SmartMockProvider {
    calls: AtomicUsize,
    percent: f64,
}

impl SmartMockProvider {
    fn new(percent: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            percent,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for SmartMockProvider {
    async fn generate(&self, _model: &str, prompt: Prompt) -> JudgeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let p = prompt.text.to_lowercase();
        debug!("MOCK PROMPT: {}", p.chars().take(80).collect::<String>());

        if p.contains("reply with ok") {
            return Ok("OK".to_string());
        }
        if p.contains("checklist and upload-guideline generator") {
            return Ok(r#"```json
{
  "mission_summary": "Clean up the living room floor",
  "keywords": ["floor", "toys"],
  "checklist": [
    {"item": "Toys are put away", "evidence_hint": "Floor visible with no toys"},
    {"item": "Floor is vacuumed", "evidence_hint": "No crumbs near the sofa"}
  ],
  "upload_guidelines": {"recommended_photos": 2, "instructions": ["Same angle before and after"]},
  "success_criteria": ["Both items are visible as done"]
}
```"#
                .to_string());
        }
        if p.contains("evidence photo analyzer") {
            let body = format!(
                r#"{{"mode": "evidence_only", "observations": ["{} photos received"], "per_photo_notes": [{{"photo_index": 1, "note": "Toys on floor"}}], "notable_changes": ["Toys gone in photo 2"], "caveats": []}}"#,
                prompt.images.len()
            );
            return Ok(body);
        }
        if p.contains("mission grader") {
            return Ok(format!(
                r#"{{"completion_percent": {}, "pass": false, "reason_summary": ["Most items done"], "next_request_to_child": ["Vacuum behind the sofa"]}}"#,
                self.percent
            ));
        }
        Ok("I cannot comply".to_string())
    }
}

/// Always refuses in plain text.
struct RefusingProvider;

#[async_trait]
impl LLMProvider for RefusingProvider {
    async fn generate(&self, _model: &str, _prompt: Prompt) -> JudgeResult<String> {
        Ok("I cannot comply".to_string())
    }
}

fn photos(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"\xFF\xD8\xFF fake jpeg").unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn test_cleaning_before_after_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = photos(&dir, &["before.jpg", "after.jpg"]);
    let provider = Arc::new(SmartMockProvider::new(72.4));
    let judge = MissionJudge::new(provider.clone()).with_audit_dir(dir.path().join("audit"));

    let session = judge.verify_credential(Session::new()).await;
    assert_eq!(session.step, Step::Mission);

    let session = judge
        .judge(session, MissionCategory::Cleaning, "Clean the living room", paths)
        .await;

    assert!(session.is_done());
    assert_eq!(provider.calls(), 4);

    let mission = session.mission.as_ref().unwrap().parsed().unwrap();
    assert_eq!(mission.category, Some(MissionCategory::Cleaning));
    assert_eq!(mission.checklist.len(), 2);
    assert_eq!(mission.upload_guidelines.recommended_photos, 2);

    let report = session.report.as_ref().unwrap().parsed().unwrap();
    assert_eq!(report.mode, AnalysisMode::BeforeAfter);
    assert_eq!(report.observations, vec!["2 photos received"]);

    let verdict = session.verdict.as_ref().unwrap().parsed().unwrap();
    assert_eq!(verdict.completion_percent, 72.4);
    assert!(verdict.pass);
    assert_eq!(verdict.model_pass, Some(false));

    for name in [MISSION_FILE, ANALYSIS_FILE, GRADE_FILE] {
        assert!(dir.path().join("audit").join(name).exists(), "missing {}", name);
    }
    let grade: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("audit").join(GRADE_FILE)).unwrap()).unwrap();
    assert_eq!(grade["pass"], true);
}

#[tokio::test]
async fn test_refusal_wraps_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let paths = photos(&dir, &["sheet.jpg"]);
    let judge = MissionJudge::new(Arc::new(RefusingProvider));

    let session = judge.verify_credential(Session::new()).await;
    let session = judge
        .judge(session, MissionCategory::Homework, "Finish page 12", paths)
        .await;

    let refused = "I cannot comply";
    assert_eq!(session.mission, Some(StageOutput::malformed(refused)));
    assert_eq!(session.report, Some(StageOutput::malformed(refused)));
    assert_eq!(session.verdict, Some(StageOutput::malformed(refused)));

    let json: serde_json::Value =
        serde_json::from_str(&session.verdict.as_ref().unwrap().to_pretty_json()).unwrap();
    assert_eq!(json, serde_json::json!({"_raw": refused}));
}

#[tokio::test]
async fn test_missing_photo_skips_analysis_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = photos(&dir, &["a.jpg"]);
    let missing = dir.path().join("gone.jpg");
    paths.push(missing.clone());

    let provider = Arc::new(SmartMockProvider::new(10.0));
    let judge = MissionJudge::new(provider.clone());
    let session = judge.verify_credential(Session::new()).await;
    let session = judge
        .judge(session, MissionCategory::Errand, "Post the letter", paths)
        .await;

    // probe + checklist + grading; no analysis call
    assert_eq!(provider.calls(), 3);
    let expected = format!("file not found: {}", missing.display());
    assert_eq!(session.report.as_ref().unwrap().error(), Some(expected.as_str()));
    assert!(!session.verdict.as_ref().unwrap().parsed().unwrap().pass);
}

#[tokio::test]
async fn test_reset_then_second_mission() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SmartMockProvider::new(35.0));
    let judge = MissionJudge::new(provider.clone());

    let session = judge.verify_credential(Session::new()).await;
    let first = judge
        .judge(session, MissionCategory::Habit, "Brush teeth", photos(&dir, &["t.jpg"]))
        .await;
    assert!(first.is_done());

    let second = first.clone().apply(SessionEvent::Reset);
    assert_eq!(second.step, Step::Mission);
    assert_ne!(second.id, first.id);

    let second = judge
        .judge(second, MissionCategory::Habit, "Make the bed", photos(&dir, &["b.jpg"]))
        .await;
    assert!(second.is_done());
    assert!(!second.verdict.unwrap().parsed().unwrap().pass);
    // one probe, then three calls per mission
    assert_eq!(provider.calls(), 7);
}
