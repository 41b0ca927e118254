//! Mission Judge
//!
//! Drives a [`Session`] through the three stages. Each model call happens
//! here; the session itself only records the outcomes.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::audit::AuditWriter;
use super::session::{Session, SessionEvent, Step};
use crate::agent::LLMProvider;
use crate::config::{JudgeConfig, DEFAULT_MODEL};
use crate::error::JudgeResult;
use crate::mission::{
    ChecklistGenerator, CompletionScorer, EvidenceAnalyzer, MissionCategory, StageOutput,
    DEFAULT_POLICY,
};
use crate::utils::{FileStore, LocalFileStore};

pub struct MissionJudge {
    provider: Arc<dyn LLMProvider>,
    store: Arc<dyn FileStore>,
    model: String,
    policy: String,
    audit: Option<AuditWriter>,
}

/// Apply an event and surface any notice in the log.
fn advance(session: Session, event: SessionEvent) -> Session {
    let next = session.apply(event);
    if let Some(notice) = &next.notice {
        warn!(step = %next.step, "{}", notice);
    }
    next
}

impl MissionJudge {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            store: Arc::new(LocalFileStore),
            model: DEFAULT_MODEL.to_string(),
            policy: DEFAULT_POLICY.to_string(),
            audit: None,
        }
    }

    pub fn from_config(config: &JudgeConfig, provider: Arc<dyn LLMProvider>) -> Self {
        let judge = Self::new(provider)
            .with_model(config.model.clone())
            .with_policy(config.policy.clone());
        match &config.output_dir {
            Some(dir) => judge.with_audit_dir(dir),
            None => judge,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Keep the audit trail in `dir`, written through the judge's file store.
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit = Some(AuditWriter::new(dir).with_store(self.store.clone()));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue the probe call; the session stays at [`Step::Credential`] on failure.
    pub async fn verify_credential(&self, session: Session) -> Session {
        match self.provider.probe(&self.model).await {
            Ok(()) => {
                info!(model = %self.model, "API credential verified");
                advance(session, SessionEvent::CredentialVerified)
            }
            Err(e) => {
                error!("Credential probe failed: {}", e);
                advance(session, SessionEvent::CredentialRejected(e.to_string()))
            }
        }
    }

    /// Record the mission request and generate its checklist.
    pub async fn submit_mission(
        &self,
        session: Session,
        category: MissionCategory,
        details: &str,
    ) -> Session {
        let session = advance(
            session,
            SessionEvent::MissionSubmitted {
                category,
                details: details.to_string(),
            },
        );
        if session.notice.is_some() || session.step != Step::Mission {
            return session;
        }

        let generator = ChecklistGenerator::new(self.provider.clone()).with_model(self.model.clone());
        let result = generator.generate(category, &session.details, &self.policy).await;
        let session = self.settle(session, result.map(SessionEvent::MissionGenerated));
        self.record(&session).await;
        session
    }

    /// Run the evidence analyzer over the photos already in the session.
    pub async fn analyze(&self, session: Session) -> Session {
        if session.step != Step::Analysis {
            return advance(session, SessionEvent::StageFailed("no photos are waiting for analysis".into()));
        }
        let Some(category) = session.category else {
            return advance(session, SessionEvent::StageFailed("mission category is missing".into()));
        };
        let mission = session
            .mission
            .clone()
            .unwrap_or_else(|| StageOutput::failed("mission was not generated"));

        let analyzer = EvidenceAnalyzer::new(self.provider.clone())
            .with_model(self.model.clone())
            .with_store(self.store.clone());
        let result = analyzer.analyze(category, &mission, &session.photo_paths()).await;
        let session = self.settle(session, result.map(SessionEvent::EvidenceAnalyzed));
        self.record(&session).await;
        session
    }

    /// Grade the session and finish it.
    pub async fn grade(&self, session: Session) -> Session {
        let (Some(mission), Some(report)) = (&session.mission, &session.report) else {
            return advance(session, SessionEvent::StageFailed("nothing to grade yet".into()));
        };

        let scorer = CompletionScorer::new(self.provider.clone()).with_model(self.model.clone());
        let result = scorer.score(mission, report).await;
        let session = self.settle(session, result.map(SessionEvent::Graded));
        self.record(&session).await;
        session
    }

    /// Run all three stages for one mission.
    ///
    /// Stops early if the credential was never verified or a model call
    /// fails; the returned session says how far it got.
    #[instrument(name = "mission", skip_all, fields(session = %session.id))]
    pub async fn judge(
        &self,
        session: Session,
        category: MissionCategory,
        details: &str,
        photo_paths: Vec<PathBuf>,
    ) -> Session {
        let session = self.submit_mission(session, category, details).await;
        if session.step != Step::Photos {
            return session;
        }

        let session = advance(session, SessionEvent::PhotosSubmitted(photo_paths));
        let session = self.analyze(session).await;
        if session.step != Step::Grading {
            return session;
        }

        let session = self.grade(session).await;
        if let Some(verdict) = session.verdict.as_ref().and_then(StageOutput::parsed) {
            info!(
                percent = verdict.completion_percent,
                pass = verdict.pass,
                "Mission judged"
            );
        }
        session
    }

    fn settle(&self, session: Session, result: JudgeResult<SessionEvent>) -> Session {
        match result {
            Ok(event) => advance(session, event),
            Err(e) => {
                error!(step = %session.step, "Model call failed: {}", e);
                advance(session, SessionEvent::StageFailed(e.to_string()))
            }
        }
    }

    async fn record(&self, session: &Session) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.record(session).await {
            warn!(dir = %audit.dir().display(), "Failed to write audit files: {}", e);
        }
    }
}
