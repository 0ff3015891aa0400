#[cfg(test)]
#[path = "prober_test.rs"]
mod tests;

use anyhow::Context;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ranked_profiles;
use crate::domain::models::select_profile;
use crate::domain::models::ModelProfile;
use crate::domain::models::VramProbeBox;

/// Picks the model tier for this host. Measurement lives behind the
/// `VramProbe` trait; selection over the ranked table is a pure function.
/// Runs once per process, GPU memory is not re-probed mid-session.
pub struct CapabilityProber {
    probe: VramProbeBox,
}

impl CapabilityProber {
    pub fn new(probe: VramProbeBox) -> CapabilityProber {
        return CapabilityProber { probe };
    }

    pub async fn probe(&self, available_models: &[String]) -> Result<ModelProfile> {
        let model_override = Config::get(ConfigKey::Model);
        if !model_override.is_empty() {
            tracing::info!(model = model_override, "Using configured model override");
            return Ok(ModelProfile::new(&model_override, 0));
        }

        let vram_override = Config::get(ConfigKey::VramMb);
        let vram_mb = if vram_override.is_empty() {
            self.probe.total_vram_mb().await?
        } else {
            vram_override
                .parse::<u64>()
                .context("vram-mb must be a number of megabytes")?
        };

        let profile = select_profile(&ranked_profiles(), vram_mb, Some(available_models))?;
        tracing::info!(
            vram_mb = vram_mb,
            model = profile.model,
            "Selected model profile"
        );

        return Ok(profile);
    }
}
