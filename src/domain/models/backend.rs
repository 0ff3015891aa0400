#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

pub struct BackendPrompt {
    pub text: String,
    pub system: String,
}

impl BackendPrompt {
    pub fn new(text: String, system: String) -> BackendPrompt {
        return BackendPrompt { text, system };
    }
}

/// Generation parameters recognized by every backend. Unset fields fall
/// back to the backend's own defaults.
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stop: Vec<String>,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend service is reachable and
    /// answering.
    async fn health_check(&self) -> Result<()>;

    /// Bounded retry loop around `health_check` used before the session
    /// loop proceeds. Polls once a second until the backend answers or
    /// `max_wait` lapses.
    async fn wait_until_ready(&self, max_wait: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            let res = self.health_check().await;
            if res.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return res;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Returns all models hosted by the backend, sorted.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Requests a single completion and returns the full generated text.
    /// Bounded by the backend's configured generation timeout; performs no
    /// implicit retries so failures stay attributable to one call.
    async fn generate(&self, prompt: BackendPrompt, options: GenerateOptions) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;

/// Returns the first JSON object embedded in a model reply. Models
/// frequently wrap JSON payloads in markdown fences even when told not to.
pub fn extract_json_object(text: &str) -> Result<&str> {
    let start = text.find('{');
    let end = text.rfind('}');

    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            return Ok(&text[start..=end]);
        }
    }

    bail!("model reply did not contain a JSON object")
}
