use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::VramProbe;
use crate::domain::services::Supervisor;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Queries total GPU memory through nvidia-smi. Hosts without the tool can
/// bypass probing entirely with the vram-mb config key.
#[derive(Default)]
pub struct NvidiaSmi {}

#[async_trait]
impl VramProbe for NvidiaSmi {
    #[allow(clippy::implicit_return)]
    async fn total_vram_mb(&self) -> Result<u64> {
        let res = Supervisor::check(
            "nvidia-smi",
            &["--query-gpu=memory.total", "--format=csv,noheader,nounits"],
            Path::new("."),
            PROBE_TIMEOUT,
        )
        .await
        .context("failed to query GPU memory with nvidia-smi, set --vram-mb to override")?;

        // Multi-GPU hosts report one line per device; the agent runs the
        // model on a single device, so take the largest.
        let largest = res
            .stdout
            .lines()
            .filter_map(|line| return line.trim().parse::<u64>().ok())
            .max()
            .context("nvidia-smi returned no parseable memory values")?;

        return Ok(largest);
    }
}
