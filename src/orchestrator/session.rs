//! Judging Session - the per-mission record and its transitions.
//!
//! A session only changes through [`Session::apply`], which consumes the old
//! record and returns the next one. Side effects (model calls, file writes)
//! live in the driver; this module is pure.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::mission::{
    MissionCategory, MissionSpec, ObservationReport, PhotoRef, StageOutput, Verdict, MAX_PHOTOS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Waiting for the API credential to be verified
    Credential,
    /// Waiting for category and details, then the generated checklist
    Mission,
    /// Waiting for the photo list
    Photos,
    /// Photos accepted, waiting for the observation report
    Analysis,
    /// Waiting for the verdict
    Grading,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Credential => "credential",
            Step::Mission => "mission",
            Step::Photos => "photos",
            Step::Analysis => "analysis",
            Step::Grading => "grading",
            Step::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CredentialVerified,
    CredentialRejected(String),
    MissionSubmitted {
        category: MissionCategory,
        details: String,
    },
    MissionGenerated(StageOutput<MissionSpec>),
    PhotosSubmitted(Vec<PathBuf>),
    EvidenceAnalyzed(StageOutput<ObservationReport>),
    Graded(StageOutput<Verdict>),
    /// A model call failed; the session stays where it is.
    StageFailed(String),
    Back,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::CredentialVerified => "credential_verified",
            SessionEvent::CredentialRejected(_) => "credential_rejected",
            SessionEvent::MissionSubmitted { .. } => "mission_submitted",
            SessionEvent::MissionGenerated(_) => "mission_generated",
            SessionEvent::PhotosSubmitted(_) => "photos_submitted",
            SessionEvent::EvidenceAnalyzed(_) => "evidence_analyzed",
            SessionEvent::Graded(_) => "graded",
            SessionEvent::StageFailed(_) => "stage_failed",
            SessionEvent::Back => "back",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Everything known about one mission being judged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub step: Step,
    pub credential_verified: bool,
    pub category: Option<MissionCategory>,
    pub details: String,
    pub mission: Option<StageOutput<MissionSpec>>,
    pub photos: Vec<PhotoRef>,
    pub report: Option<StageOutput<ObservationReport>>,
    pub verdict: Option<StageOutput<Verdict>>,
    /// Message for the user about the last transition, if any.
    pub notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: Step::Credential,
            credential_verified: false,
            category: None,
            details: String::new(),
            mission: None,
            photos: Vec::new(),
            report: None,
            verdict: None,
            notice: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.step == Step::Done
    }

    fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    fn back_to_mission(mut self) -> Self {
        self.step = Step::Mission;
        self.mission = None;
        self.photos.clear();
        self.report = None;
        self.verdict = None;
        self
    }

    fn back_to_photos(mut self) -> Self {
        self.step = Step::Photos;
        self.photos.clear();
        self.report = None;
        self.verdict = None;
        self
    }

    /// Compute the next session for `event`.
    ///
    /// Events that make no sense in the current step leave the data untouched
    /// and only set a notice.
    pub fn apply(mut self, event: SessionEvent) -> Session {
        self.notice = None;

        match (self.step, event) {
            (_, SessionEvent::Reset) => {
                let verified = self.credential_verified;
                Session {
                    step: if verified { Step::Mission } else { Step::Credential },
                    credential_verified: verified,
                    ..Session::new()
                }
            }
            (_, SessionEvent::StageFailed(reason)) => self.with_notice(reason),

            (Step::Credential, SessionEvent::CredentialVerified) => {
                self.credential_verified = true;
                self.step = Step::Mission;
                self
            }
            (Step::Credential, SessionEvent::CredentialRejected(reason)) => {
                self.credential_verified = false;
                self.with_notice(format!("API credential rejected: {}", reason))
            }

            (Step::Mission, SessionEvent::MissionSubmitted { category, details }) => {
                if details.trim().is_empty() {
                    return self.with_notice("mission details are empty");
                }
                self.category = Some(category);
                self.details = details.trim().to_string();
                self
            }
            (Step::Mission, SessionEvent::MissionGenerated(output)) => {
                if self.category.is_none() {
                    return self.with_notice("mission was generated before it was submitted");
                }
                self.mission = Some(output);
                self.step = Step::Photos;
                self
            }

            (Step::Photos, SessionEvent::PhotosSubmitted(paths)) => {
                let submitted = paths.len();
                self.photos = PhotoRef::from_paths(paths);
                self.step = Step::Analysis;
                if submitted > MAX_PHOTOS {
                    self.with_notice(format!(
                        "only the first {} of {} photos are used",
                        MAX_PHOTOS, submitted
                    ))
                } else {
                    self
                }
            }

            (Step::Analysis, SessionEvent::EvidenceAnalyzed(output)) => {
                self.report = Some(output);
                self.step = Step::Grading;
                self
            }

            (Step::Grading, SessionEvent::Graded(output)) => {
                self.verdict = Some(output);
                self.step = Step::Done;
                self
            }

            (Step::Photos, SessionEvent::Back) => self.back_to_mission(),
            (Step::Analysis | Step::Grading | Step::Done, SessionEvent::Back) => self.back_to_photos(),
            (Step::Credential | Step::Mission, SessionEvent::Back) => self,

            (step, event) => {
                let name = event.name();
                self.with_notice(format!("'{}' is not valid during the {} step", name, step))
            }
        }
    }

    pub fn photo_paths(&self) -> Vec<PathBuf> {
        self.photos.iter().map(|p| p.path.clone()).collect()
    }
}
