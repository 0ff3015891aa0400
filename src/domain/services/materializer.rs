#[cfg(test)]
#[path = "materializer_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::models::GeneratedFile;
use crate::domain::models::MaterializationReport;
use crate::domain::models::OrchestratorError;

/// Writes generation batches into the workspace. Every write goes through
/// a temp file renamed into place, so a crash mid-write can never leave a
/// half-written file visible under its final name. Batches are applied
/// per-file, not transactionally: partial results are reported, not rolled
/// back.
pub struct Materializer {}

impl Materializer {
    /// Applies a batch under `root`. Existing files with differing content
    /// are never overwritten unless `force` is set; instead the new content
    /// lands on a disambiguated sibling path.
    pub async fn apply(
        root: &Path,
        batch: &[GeneratedFile],
        force: bool,
    ) -> MaterializationReport {
        let mut report = MaterializationReport::default();

        for file in batch {
            let target = root.join(&file.path);
            match Materializer::write_one(root, &target, &file.content, force).await {
                Ok(Some(written)) => report.written.push(written),
                Ok(None) => report.written.push(target),
                Err(err) => {
                    tracing::error!(path = ?target, error = ?err, "Failed to materialize file");
                    let failure = OrchestratorError::MaterializationFailure {
                        path: target.clone(),
                        reason: err.to_string(),
                    };
                    report.failed.push((target, failure.to_string()));
                }
            }
        }

        return report;
    }

    /// Returns the path actually written, or None when the target already
    /// held identical content and no write was needed.
    async fn write_one(
        root: &Path,
        target: &Path,
        content: &str,
        force: bool,
    ) -> Result<Option<PathBuf>> {
        if let Some(parent) = target.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut destination = target.to_path_buf();
        if target.exists() && !force {
            let existing = fs::read_to_string(target).await.unwrap_or_default();
            if existing == content {
                return Ok(None);
            }
            destination = sibling_path(target);
            tracing::warn!(target = ?target, sibling = ?destination, "Conflict, writing sibling");
        }

        durable_write(root, &destination, content).await?;

        return Ok(Some(destination));
    }
}

/// First free `<name>.new`, `<name>.new.1`, ... next to the target.
fn sibling_path(target: &Path) -> PathBuf {
    let base = format!("{}.new", target.display());
    let mut candidate = PathBuf::from(&base);
    let mut counter = 1;

    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}.{counter}"));
        counter += 1;
    }

    return candidate;
}

/// Temp-then-rename in the destination's own directory so the rename stays
/// on one filesystem.
async fn durable_write(root: &Path, destination: &Path, content: &str) -> Result<()> {
    let dir = destination.parent().unwrap_or(root);
    let temp_path = dir.join(format!(".autoforge-{}.tmp", Uuid::new_v4()));

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, destination).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err.into());
    }

    return Ok(());
}
