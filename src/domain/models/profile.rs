#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::OrchestratorError;

/// One entry in the ranked model table. Rank order is quality order, best
/// first; selection walks the table and takes the first profile whose VRAM
/// requirement fits the probed value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model: String,
    pub min_vram_mb: u64,
}

impl ModelProfile {
    pub fn new(model: &str, min_vram_mb: u64) -> ModelProfile {
        return ModelProfile {
            model: model.to_string(),
            min_vram_mb,
        };
    }
}

/// The static ranked table. Tiers follow the coder-model ladder the agent
/// ships with, sized for 4-bit quantized weights.
pub fn ranked_profiles() -> Vec<ModelProfile> {
    return vec![
        ModelProfile::new("qwen2.5-coder:32b", 24_000),
        ModelProfile::new("deepseek-coder:33b", 24_000),
        ModelProfile::new("codellama:34b", 24_000),
        ModelProfile::new("qwen2.5-coder:14b", 12_000),
        ModelProfile::new("deepseek-coder:6.7b", 6_000),
        ModelProfile::new("codellama:13b", 10_000),
    ];
}

/// Pure selection over the ranked table. `available` narrows the walk to
/// models the backend actually hosts; pass `None` to select on VRAM alone.
/// Fails with `NoCompatibleModel` only when no profile fits by VRAM.
pub fn select_profile(
    table: &[ModelProfile],
    vram_mb: u64,
    available: Option<&[String]>,
) -> Result<ModelProfile> {
    let fitting = table
        .iter()
        .filter(|profile| return profile.min_vram_mb <= vram_mb)
        .collect::<Vec<&ModelProfile>>();

    if fitting.is_empty() {
        return Err(OrchestratorError::NoCompatibleModel {
            available_mb: vram_mb,
        }
        .into());
    }

    if let Some(models) = available {
        for profile in &fitting {
            if models.contains(&profile.model) {
                return Ok((*profile).clone());
            }
        }

        // Nothing from the ranked table is installed. Fall back to whatever
        // the backend hosts, pinned at the lowest fitting tier.
        if let Some(fallback) = models.first() {
            tracing::warn!(model = fallback, "No ranked model available, using fallback");
            let floor = fitting.last().unwrap();
            return Ok(ModelProfile::new(fallback, floor.min_vram_mb));
        }
    }

    return Ok(fitting[0].clone());
}

/// Measures available accelerator memory. Kept behind a trait so the
/// session loop can be tested without a GPU on the host.
#[async_trait]
pub trait VramProbe {
    async fn total_vram_mb(&self) -> Result<u64>;
}

pub type VramProbeBox = Box<dyn VramProbe + Send + Sync>;
