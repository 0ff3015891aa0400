use anyhow::Result;

use super::SessionSnapshots;
use crate::domain::models::ProjectKind;
use crate::domain::models::ProjectSpec;
use crate::domain::models::SessionSnapshot;
use crate::domain::models::SessionState;

fn snapshot(id: &str, timestamp: &str) -> SessionSnapshot {
    return SessionSnapshot {
        id: id.to_string(),
        version: "0.1.0".to_string(),
        timestamp: timestamp.to_string(),
        model: "qwen2.5-coder:14b".to_string(),
        state: SessionState::AwaitingCommand,
        spec: Some(ProjectSpec::new("app", ProjectKind::Vite)),
        history: vec![],
    };
}

#[test]
fn it_creates_short_ids() {
    let id = SessionSnapshots::create_id();
    let segments = id.split('-').collect::<Vec<&str>>();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].len(), 8);
    assert_eq!(segments[1].len(), 4);
}

#[tokio::test]
async fn it_saves_and_loads_snapshots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let snapshots = SessionSnapshots::new(dir.path().to_path_buf());

    snapshots
        .save(&snapshot("abc-1234", "2026-08-23T10:00:00+00:00"))
        .await?;
    let res = snapshots.load("abc-1234").await?;

    assert_eq!(res.id, "abc-1234");
    assert_eq!(res.model, "qwen2.5-coder:14b");
    assert_eq!(res.state, SessionState::AwaitingCommand);
    assert_eq!(res.spec.unwrap().name, "app");

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_missing_snapshots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let snapshots = SessionSnapshots::new(dir.path().to_path_buf());

    let res = snapshots.load("nope").await;
    assert!(res.is_err());

    return Ok(());
}

#[tokio::test]
async fn it_lists_snapshots_sorted_by_timestamp() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let snapshots = SessionSnapshots::new(dir.path().to_path_buf());

    snapshots
        .save(&snapshot("later", "2026-08-23T12:00:00+00:00"))
        .await?;
    snapshots
        .save(&snapshot("earlier", "2026-08-23T09:00:00+00:00"))
        .await?;

    let res = snapshots.list().await?;
    let ids = res
        .iter()
        .map(|snapshot| return snapshot.id.to_string())
        .collect::<Vec<String>>();

    assert_eq!(ids, vec!["earlier".to_string(), "later".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_lists_nothing_when_the_directory_is_missing() -> Result<()> {
    let snapshots = SessionSnapshots::new("/tmp/autoforge-does-not-exist".into());
    let res = snapshots.list().await?;

    assert!(res.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_deletes_one_and_all() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let snapshots = SessionSnapshots::new(dir.path().to_path_buf());

    snapshots
        .save(&snapshot("one", "2026-08-23T09:00:00+00:00"))
        .await?;
    snapshots
        .save(&snapshot("two", "2026-08-23T10:00:00+00:00"))
        .await?;

    snapshots.delete("one").await?;
    assert_eq!(snapshots.list().await?.len(), 1);

    snapshots.delete_all().await?;
    assert!(snapshots.list().await?.is_empty());

    return Ok(());
}
