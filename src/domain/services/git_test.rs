use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::truncate_to_boundary;
use super::GitAutomator;
use super::FALLBACK_MESSAGE;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::CommitResult;
use crate::domain::models::GenerateOptions;

struct StaticBackend {
    reply: String,
}

impl StaticBackend {
    fn boxed(reply: &str) -> BackendBox {
        return Box::new(StaticBackend {
            reply: reply.to_string(),
        });
    }
}

#[async_trait]
impl Backend for StaticBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        return Ok(vec![]);
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, _prompt: BackendPrompt, _options: GenerateOptions) -> Result<String> {
        return Ok(self.reply.to_string());
    }
}

fn seed_project(root: &Path) -> Result<()> {
    Config::set(ConfigKey::Username, "tester");
    std::fs::write(root.join("package.json"), "{}\n")?;
    return Ok(());
}

#[tokio::test]
async fn it_initializes_and_commits() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;

    let res = GitAutomator::init_and_commit(dir.path(), Some("Initial commit for app"), None).await?;

    assert_eq!(
        res,
        CommitResult::Committed {
            message: "Initial commit for app".to_string()
        }
    );
    assert!(dir.path().join(".git").exists());
    assert!(dir.path().join(".gitignore").exists());

    return Ok(());
}

#[tokio::test]
async fn it_reports_nothing_to_commit_when_idempotent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;

    GitAutomator::init_and_commit(dir.path(), Some("first"), None).await?;
    let res = GitAutomator::init_and_commit(dir.path(), None, None).await?;

    assert_eq!(res, CommitResult::NothingToCommit);

    return Ok(());
}

#[tokio::test]
async fn it_respects_an_existing_gitignore() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;
    std::fs::write(dir.path().join(".gitignore"), "custom/\n")?;

    GitAutomator::init_and_commit(dir.path(), Some("first"), None).await?;

    assert_eq!(
        std::fs::read_to_string(dir.path().join(".gitignore"))?,
        "custom/\n"
    );

    return Ok(());
}

#[tokio::test]
async fn it_uses_the_model_for_commit_messages() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;
    let backend = StaticBackend::boxed("\"Add package manifest\"\nSome trailing chatter");

    let res = GitAutomator::init_and_commit(dir.path(), None, Some(&backend)).await?;

    assert_eq!(
        res,
        CommitResult::Committed {
            message: "Add package manifest".to_string()
        }
    );

    return Ok(());
}

#[tokio::test]
async fn it_falls_back_when_the_model_reply_is_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;
    let backend = StaticBackend::boxed("   \n");

    let res = GitAutomator::init_and_commit(dir.path(), None, Some(&backend)).await?;

    assert_eq!(
        res,
        CommitResult::Committed {
            message: FALLBACK_MESSAGE.to_string()
        }
    );

    return Ok(());
}

#[tokio::test]
async fn it_falls_back_without_a_backend() {
    let dir = tempfile::tempdir().unwrap();
    let res = GitAutomator::commit_message(dir.path(), None).await;
    assert_eq!(res, FALLBACK_MESSAGE);
}

#[test]
fn it_truncates_diff_stats_on_char_boundaries() {
    // 3 bytes per character, so the 4096-byte cap lands mid-character.
    let stat = "フ".repeat(2_000);
    let res = truncate_to_boundary(&stat, 4096);

    assert_eq!(res.len(), 4095);
    assert!(stat.is_char_boundary(res.len()));
    assert!(res.chars().all(|c| return c == 'フ'));

    let short = "deleted files";
    assert_eq!(truncate_to_boundary(short, 4096), short);
}

#[tokio::test]
async fn it_commits_large_stats_with_multibyte_filenames() -> Result<()> {
    let dir = tempfile::tempdir()?;
    seed_project(dir.path())?;
    GitAutomator::git(dir.path(), &["init"]).await?;
    GitAutomator::git(dir.path(), &["config", "core.quotepath", "false"]).await?;

    for idx in 0..120 {
        std::fs::write(
            dir.path().join(format!("コンポーネントのファイル{idx}.js")),
            "// ok\n",
        )?;
    }

    let backend = StaticBackend::boxed("Add localized components");
    let res = GitAutomator::init_and_commit(dir.path(), None, Some(&backend)).await?;

    assert_eq!(
        res,
        CommitResult::Committed {
            message: "Add localized components".to_string()
        }
    );

    return Ok(());
}
