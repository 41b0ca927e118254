//! Audit trail - dumps each stage result of a session as JSON files.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::session::Session;
use crate::error::JudgeResult;
use crate::mission::StageOutput;
use crate::utils::{FileStore, LocalFileStore};

pub const MISSION_FILE: &str = "mission_summary.json";
pub const ANALYSIS_FILE: &str = "photo_analysis.json";
pub const GRADE_FILE: &str = "final_grade.json";

pub struct AuditWriter {
    dir: PathBuf,
    store: Arc<dyn FileStore>,
}

impl AuditWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store: Arc::new(LocalFileStore),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every stage result the session has so far.
    ///
    /// Files for stages the session has not reached are removed, so the
    /// directory never mixes results from two missions. Returns the paths
    /// written, in stage order.
    pub async fn record(&self, session: &Session) -> JudgeResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        match &session.mission {
            Some(mission) => written.push(self.write_stage(MISSION_FILE, mission).await?),
            None => self.clear_stage(MISSION_FILE).await?,
        }
        match &session.report {
            Some(report) => written.push(self.write_stage(ANALYSIS_FILE, report).await?),
            None => self.clear_stage(ANALYSIS_FILE).await?,
        }
        match &session.verdict {
            Some(verdict) => written.push(self.write_stage(GRADE_FILE, verdict).await?),
            None => self.clear_stage(GRADE_FILE).await?,
        }
        Ok(written)
    }

    async fn clear_stage(&self, name: &str) -> JudgeResult<()> {
        self.store.remove(&self.dir.join(name)).await?;
        Ok(())
    }

    async fn write_stage<T: Serialize>(&self, name: &str, output: &StageOutput<T>) -> JudgeResult<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(output)?;
        self.store.write(&path, json.as_bytes()).await?;
        debug!(path = %path.display(), "Wrote audit file");
        Ok(path)
    }
}
