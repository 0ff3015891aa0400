use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ProjectSpec;

/// Where the session loop currently is in its lifecycle. Mutated on every
/// transition and recorded in snapshots for post-mortem inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Initializing,
    SelectingProject,
    Generating,
    Installing,
    AwaitingCommand,
    Explaining,
    Deploying,
    ReportingStatus,
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let res = match self {
            SessionState::Initializing => "initializing",
            SessionState::SelectingProject => "selecting-project",
            SessionState::Generating => "generating",
            SessionState::Installing => "installing",
            SessionState::AwaitingCommand => "awaiting-command",
            SessionState::Explaining => "explaining",
            SessionState::Deploying => "deploying",
            SessionState::ReportingStatus => "reporting-status",
            SessionState::Terminated => "terminated",
        };

        return write!(f, "{res}");
    }
}

/// One completed turn, kept in session history and in snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnRecord {
    pub command: String,
    pub outcome: String,
    pub timestamp: String,
}

/// Best-effort on-disk form of a session, self-describing enough to
/// reconstruct the project spec and history across restarts.
#[derive(Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub version: String,
    pub timestamp: String,
    pub model: String,
    pub state: SessionState,
    pub spec: Option<ProjectSpec>,
    pub history: Vec<TurnRecord>,
}
