//! Orchestrator Module
//!
//! Owns the judging session, drives it through the stages and keeps the
//! audit trail.

pub mod audit;
pub mod judge;
pub mod session;

pub use audit::{AuditWriter, ANALYSIS_FILE, GRADE_FILE, MISSION_FILE};
pub use judge::MissionJudge;
pub use session::{Session, SessionEvent, Step};
