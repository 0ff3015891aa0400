#[cfg(test)]
#[path = "git_test.rs"]
mod tests;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::supervisor::Supervisor;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::CommitResult;
use crate::domain::models::GenerateOptions;
use crate::domain::models::OrchestratorError;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);
const PUSH_TIMEOUT: Duration = Duration::from_secs(120);
const COMMIT_EMAIL: &str = "autoforge@localhost";
const FALLBACK_MESSAGE: &str = "Update project files";

const GITIGNORE: &str = "node_modules/
.next/
.env.local
.env
dist/
build/
*.log
.DS_Store
.vscode/
.idea/
coverage/
.nyc_output/
";

/// Repository automation on top of the process supervisor. Local commit
/// failures surface as `VersionControlFailure`; remote failures are always
/// soft and never roll back the local commit.
pub struct GitAutomator {}

impl GitAutomator {
    async fn git(root: &Path, args: &[&str]) -> Result<String> {
        let res = Supervisor::check("git", args, root, GIT_TIMEOUT)
            .await
            .map_err(|err| {
                return OrchestratorError::VersionControlFailure(err.to_string());
            })?;

        return Ok(res.stdout);
    }

    /// Initializes the repository if needed, stages everything, and commits.
    /// Idempotent: a second call with no changes reports `NothingToCommit`
    /// without creating an empty commit.
    pub async fn init_and_commit(
        root: &Path,
        message_hint: Option<&str>,
        backend: Option<&BackendBox>,
    ) -> Result<CommitResult> {
        if !root.join(".git").exists() {
            GitAutomator::git(root, &["init"]).await?;
        }

        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.exists() {
            let mut file = fs::File::create(&gitignore_path).await?;
            file.write_all(GITIGNORE.as_bytes()).await?;
        }

        GitAutomator::git(root, &["add", "-A"]).await?;

        let status = GitAutomator::git(root, &["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            return Ok(CommitResult::NothingToCommit);
        }

        let message = match message_hint {
            Some(hint) => hint.to_string(),
            None => GitAutomator::commit_message(root, backend).await,
        };

        let username = Config::get(ConfigKey::Username);
        GitAutomator::git(
            root,
            &[
                "-c",
                &format!("user.name={username}"),
                "-c",
                &format!("user.email={COMMIT_EMAIL}"),
                "commit",
                "-m",
                &message,
            ],
        )
        .await?;

        return Ok(CommitResult::Committed { message });
    }

    /// Model-assisted commit message from the staged diff summary, with a
    /// deterministic fallback when no backend is given or the call fails.
    async fn commit_message(root: &Path, backend: Option<&BackendBox>) -> String {
        let backend = match backend {
            Some(backend) => backend,
            None => return FALLBACK_MESSAGE.to_string(),
        };

        let stat = match GitAutomator::git(root, &["diff", "--cached", "--stat"]).await {
            Ok(stat) => stat,
            Err(_) => return FALLBACK_MESSAGE.to_string(),
        };

        let prompt = format!(
            "Write a one-line git commit message, at most 72 characters, for these staged changes. Respond with the message only.\n\n{}",
            truncate_to_boundary(&stat, 4096)
        );

        let res = backend
            .generate(
                BackendPrompt::new(prompt, "You write concise git commit messages.".to_string()),
                GenerateOptions {
                    temperature: Some(0.3),
                    max_tokens: Some(60),
                    ..Default::default()
                },
            )
            .await;

        match res {
            Ok(message) => {
                let line = message.lines().next().unwrap_or(FALLBACK_MESSAGE).trim();
                if line.is_empty() {
                    return FALLBACK_MESSAGE.to_string();
                }
                return line.trim_matches('"').to_string();
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Commit message generation failed, using fallback");
                return FALLBACK_MESSAGE.to_string();
            }
        }
    }

    /// Optional remote setup. Every step here is soft: the caller logs a
    /// warning and the local commit stands regardless.
    pub async fn configure_remote(root: &Path, url: &str) -> Result<()> {
        let added = GitAutomator::git(root, &["remote", "add", "origin", url]).await;
        if added.is_err() {
            GitAutomator::git(root, &["remote", "set-url", "origin", url]).await?;
        }

        GitAutomator::git(root, &["branch", "-M", "main"]).await?;

        Supervisor::check("git", &["push", "-u", "origin", "main"], root, PUSH_TIMEOUT)
            .await
            .map_err(|err| {
                return OrchestratorError::VersionControlFailure(err.to_string());
            })?;

        return Ok(());
    }
}

/// Byte-bounded prefix that never splits a multibyte character. Diff stats
/// can carry raw UTF-8 filenames when core.quotepath is off.
fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    let mut cut = text.len().min(max_bytes);
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    return &text[..cut];
}
