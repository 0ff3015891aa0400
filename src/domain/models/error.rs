use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the orchestrator. Values travel inside
/// `anyhow::Error` and are recovered by downcast at the session loop
/// boundary so reports can name the failing step and cause.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no model profile fits within {available_mb}MB of GPU memory")]
    NoCompatibleModel { available_mb: u64 },

    #[error("backend unreachable at {url}: {reason}")]
    BackendUnreachable { url: String, reason: String },

    #[error("backend generation exceeded {seconds}s deadline")]
    BackendTimeout { seconds: u64 },

    #[error("backend returned status {status}")]
    BackendError { status: u16 },

    #[error("unknown project kind: {0}")]
    UnknownProjectKind(String),

    #[error("feature '{feature}' failed: {reason}")]
    GenerationFailure { feature: String, reason: String },

    #[error("{command} failed with exit code {exit_code}")]
    BuildOrInstallFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("{command} exceeded its {seconds}s timeout and was killed")]
    OperationTimedOut { command: String, seconds: u64 },

    #[error("failed to write {path}: {reason}")]
    MaterializationFailure { path: PathBuf, reason: String },

    #[error("version control failed: {0}")]
    VersionControlFailure(String),
}

impl OrchestratorError {
    /// Short category label used in user-facing failure reports.
    pub fn category(&self) -> &'static str {
        match self {
            OrchestratorError::NoCompatibleModel { .. } => return "startup",
            OrchestratorError::BackendUnreachable { .. } => return "backend",
            OrchestratorError::BackendTimeout { .. } => return "backend timeout",
            OrchestratorError::BackendError { .. } => return "backend",
            OrchestratorError::UnknownProjectKind(_) => return "project",
            OrchestratorError::GenerationFailure { .. } => return "generation",
            OrchestratorError::BuildOrInstallFailed { .. } => return "subprocess",
            OrchestratorError::OperationTimedOut { .. } => return "subprocess timeout",
            OrchestratorError::MaterializationFailure { .. } => return "materialization",
            OrchestratorError::VersionControlFailure(_) => return "version control",
        }
    }
}
