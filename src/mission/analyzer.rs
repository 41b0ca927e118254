//! Evidence Analyzer - describes what the submitted photos actually show.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::parse::{parse_stage, StageOutput};
use super::prompts::analysis_prompt;
use super::types::{AnalysisMode, MissionCategory, MissionSpec, ObservationReport, PhotoRef};
use crate::agent::{ImageAttachment, LLMProvider, Prompt};
use crate::config::DEFAULT_MODEL;
use crate::error::JudgeResult;
use crate::utils::{preview, FileStore, LocalFileStore};

pub struct EvidenceAnalyzer {
    provider: Arc<dyn LLMProvider>,
    store: Arc<dyn FileStore>,
    model: String,
}

impl EvidenceAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            store: Arc::new(LocalFileStore),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    /// Analyze up to ten photos against the mission in one model call.
    ///
    /// An empty list, a missing file or an unreadable file returns a
    /// [`StageOutput::Failed`] without calling the model.
    pub async fn analyze(
        &self,
        category: MissionCategory,
        mission: &StageOutput<MissionSpec>,
        photo_paths: &[PathBuf],
    ) -> JudgeResult<StageOutput<ObservationReport>> {
        if photo_paths.is_empty() {
            return Ok(StageOutput::failed("photo_paths is empty"));
        }

        let photos = PhotoRef::from_paths(photo_paths.iter().cloned());
        if photos.len() < photo_paths.len() {
            warn!(
                submitted = photo_paths.len(),
                kept = photos.len(),
                "Too many photos; extra ones are ignored"
            );
        }

        for photo in &photos {
            if !self.store.exists(&photo.path).await {
                return Ok(StageOutput::failed(format!(
                    "file not found: {}",
                    photo.path.display()
                )));
            }
        }

        let mut images = Vec::with_capacity(photos.len());
        for photo in &photos {
            match self.store.read(&photo.path).await {
                Ok(bytes) => images.push(ImageAttachment::from_bytes(photo.label(), &photo.path, &bytes)),
                Err(e) => {
                    return Ok(StageOutput::failed(format!(
                        "failed to read {}: {}",
                        photo.path.display(),
                        e
                    )))
                }
            }
        }

        let mode = AnalysisMode::select(category, photos.len());
        info!(%category, %mode, photos = photos.len(), "Analyzing evidence photos");

        let prompt = Prompt::text(analysis_prompt(mode, &mission.to_prompt_json())).with_images(images);
        let content = self.provider.generate(&self.model, prompt).await?;
        debug!("Analysis response: {}", preview(&content));

        Ok(parse_stage::<ObservationReport>(&content).map(|mut report| {
            if report.mode != mode {
                debug!(reported = %report.mode, %mode, "Overriding analysis mode reported by model");
            }
            report.mode = mode;
            report
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;
    use tempfile::{tempdir, TempDir};

    fn photos(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                std::fs::write(&p, b"fake image bytes").unwrap();
                p
            })
            .collect()
    }

    fn mission() -> StageOutput<MissionSpec> {
        StageOutput::Parsed(MissionSpec {
            category: Some(MissionCategory::Cleaning),
            mission_summary: "Tidy the bedroom".into(),
            ..MissionSpec::default()
        })
    }

    #[tokio::test]
    async fn test_empty_photo_list_skips_model() {
        let provider = Arc::new(ScriptedProvider::new());
        let analyzer = EvidenceAnalyzer::new(provider.clone());

        let out = analyzer.analyze(MissionCategory::Cleaning, &mission(), &[]).await.unwrap();

        assert_eq!(out.error(), Some("photo_paths is empty"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_named_in_error() {
        let dir = tempdir().unwrap();
        let mut paths = photos(&dir, &["before.jpg"]);
        let missing = dir.path().join("after.jpg");
        paths.push(missing.clone());

        let provider = Arc::new(ScriptedProvider::new());
        let out = EvidenceAnalyzer::new(provider.clone())
            .analyze(MissionCategory::Cleaning, &mission(), &paths)
            .await
            .unwrap();

        assert_eq!(out.error(), Some(format!("file not found: {}", missing.display()).as_str()));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_cleaning_with_two_photos_is_before_after() {
        let dir = tempdir().unwrap();
        let paths = photos(&dir, &["before.jpg", "after.png"]);
        let provider = Arc::new(ScriptedProvider::with_responses([
            r#"{"mode": "evidence_only", "observations": ["Floor is clear in photo 2"]}"#,
        ]));

        let out = EvidenceAnalyzer::new(provider.clone())
            .analyze(MissionCategory::Cleaning, &mission(), &paths)
            .await
            .unwrap();

        let report = out.parsed().unwrap();
        assert_eq!(report.mode, AnalysisMode::BeforeAfter);
        assert_eq!(report.observations.len(), 1);
        assert!(report.caveats.is_empty());

        let sent = &provider.prompts()[0];
        assert!(sent.text.contains("[Mode] before_after"));
        assert_eq!(sent.images.len(), 2);
        assert_eq!(sent.images[0].label, "Photo 1:");
        assert_eq!(sent.images[1].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_keys_default_to_computed_mode() {
        let dir = tempdir().unwrap();
        let paths = photos(&dir, &["a.jpg", "b.jpg", "c.jpg"]);
        let provider = Arc::new(ScriptedProvider::with_responses(["{}"]));

        let out = EvidenceAnalyzer::new(provider)
            .analyze(MissionCategory::Cleaning, &mission(), &paths)
            .await
            .unwrap();

        let report = out.parsed().unwrap();
        assert_eq!(report.mode, AnalysisMode::EvidenceOnly);
        assert!(report.observations.is_empty());
        assert!(report.per_photo_notes.is_empty());
        assert!(report.notable_changes.is_empty());
    }

    #[tokio::test]
    async fn test_only_first_ten_photos_sent() {
        let dir = tempdir().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("p{}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let paths = photos(&dir, &refs);
        let provider = Arc::new(ScriptedProvider::with_responses(["{}"]));

        EvidenceAnalyzer::new(provider.clone())
            .analyze(MissionCategory::Homework, &mission(), &paths)
            .await
            .unwrap();

        assert_eq!(provider.prompts()[0].images.len(), 10);
    }

    #[tokio::test]
    async fn test_non_json_is_wrapped() {
        let dir = tempdir().unwrap();
        let paths = photos(&dir, &["a.jpg"]);
        let provider = Arc::new(ScriptedProvider::with_responses(["I cannot comply"]));

        let out = EvidenceAnalyzer::new(provider)
            .analyze(MissionCategory::Habit, &mission(), &paths)
            .await
            .unwrap();

        assert_eq!(out, StageOutput::malformed("I cannot comply"));
    }
}
