#[cfg(test)]
#[path = "snapshots_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::SessionSnapshot;

/// Best-effort session persistence for crash recovery. Snapshots are
/// self-describing yaml files; save failures are reported as warnings by
/// callers, never as turn failures.
pub struct SessionSnapshots {
    pub snapshot_dir: path::PathBuf,
}

impl Default for SessionSnapshots {
    fn default() -> SessionSnapshots {
        let mut dir = Config::get(ConfigKey::SnapshotDir);
        if dir.is_empty() {
            dir = Config::default(ConfigKey::SnapshotDir);
        }

        return SessionSnapshots::new(path::PathBuf::from(dir));
    }
}

impl SessionSnapshots {
    pub fn new(snapshot_dir: path::PathBuf) -> SessionSnapshots {
        return SessionSnapshots { snapshot_dir };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }

    fn get_file_path(&self, id: &str) -> path::PathBuf {
        return self.snapshot_dir.join(format!("{id}.yaml"));
    }

    pub async fn list(&self) -> Result<Vec<SessionSnapshot>> {
        let mut snapshots: Vec<SessionSnapshot> = vec![];
        if !self.snapshot_dir.exists() {
            return Ok(snapshots);
        }

        let mut dir = fs::read_dir(&self.snapshot_dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let payload = fs::read_to_string(file.path()).await?;
            let snapshot: SessionSnapshot = serde_yaml::from_str(&payload)?;
            snapshots.push(snapshot);
        }

        // RFC3339 timestamps with a fixed offset sort lexicographically.
        snapshots.sort_by_cached_key(|snapshot| return snapshot.timestamp.to_string());

        return Ok(snapshots);
    }

    pub async fn load(&self, id: &str) -> Result<SessionSnapshot> {
        let file_path = self.get_file_path(id);
        if !file_path.exists() {
            bail!(format!("No session snapshot found for id {id}"));
        }

        let payload = fs::read_to_string(file_path).await?;
        let snapshot: SessionSnapshot = serde_yaml::from_str(&payload)?;

        return Ok(snapshot);
    }

    pub async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let payload = serde_yaml::to_string(snapshot)?;

        if !self.snapshot_dir.exists() {
            fs::create_dir_all(&self.snapshot_dir).await?;
        }

        let mut file = fs::File::create(self.get_file_path(&snapshot.id)).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let file_path = self.get_file_path(id);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }

    pub async fn delete_all(&self) -> Result<()> {
        if !self.snapshot_dir.exists() {
            return Ok(());
        }

        fs::remove_dir_all(&self.snapshot_dir).await?;
        return Ok(());
    }
}
