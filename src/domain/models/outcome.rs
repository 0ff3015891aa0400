use std::path::PathBuf;

use super::GeneratedFile;

/// Summarized child-process outcome. The session loop only ever sees this,
/// never the process handle itself.
#[derive(Clone, Debug, Default)]
pub struct ProcessResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        return !self.timed_out && self.exit_code == Some(0);
    }
}

/// Per-file materialization result. Conflict-diverted sibling paths appear
/// under `written` at the name they actually landed on.
#[derive(Clone, Debug, Default)]
pub struct MaterializationReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl MaterializationReport {
    pub fn is_clean(&self) -> bool {
        return self.failed.is_empty();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitResult {
    Committed { message: String },
    NothingToCommit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureFailure {
    pub feature: String,
    pub reason: String,
}

/// Result of one generator run. A mid-sequence model failure keeps the
/// files produced by earlier features and records which feature failed, so
/// the session loop can retry just that one.
#[derive(Clone, Debug, Default)]
pub struct GenerationOutcome {
    pub files: Vec<GeneratedFile>,
    pub applied_features: Vec<String>,
    pub failed_feature: Option<FeatureFailure>,
}
