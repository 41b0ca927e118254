//! Mission Module
//!
//! The three judging stages (checklist generation, evidence analysis,
//! completion scoring) and the data they exchange.

mod analyzer;
mod generator;
pub mod lenient;
mod parse;
pub mod prompts;
mod scorer;
mod types;

pub use analyzer::EvidenceAnalyzer;
pub use generator::ChecklistGenerator;
pub use parse::{extract_json, parse_stage, StageOutput};
pub use prompts::DEFAULT_POLICY;
pub use scorer::CompletionScorer;
pub use types::{
    AnalysisMode, ChecklistItem, GradeStatus, ItemGrade, MissionCategory, MissionSpec,
    ObservationReport, PhotoNote, PhotoRef, UploadGuidelines, Verdict, MAX_PHOTOS,
    MAX_SHOWN_REASONS, PASS_THRESHOLD,
};
