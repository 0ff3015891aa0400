#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::GenerateOptions;
use crate::domain::models::OrchestratorError;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    top_p: f32,
    top_k: u32,
    num_ctx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: CompletionOptions,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    pub models: Vec<Model>,
}

pub struct Ollama {
    url: String,
    health_check_timeout: String,
    generation_timeout: String,
}

impl Default for Ollama {
    fn default() -> Ollama {
        return Ollama {
            url: Config::get(ConfigKey::BackendURL),
            health_check_timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
            generation_timeout: Config::get(ConfigKey::GenerationTimeout),
        };
    }
}

#[async_trait]
impl Backend for Ollama {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.health_check_timeout.parse::<u64>()?))
            .send()
            .await;

        if let Err(err) = res {
            tracing::debug!(error = ?err, "Ollama is not running");
            return Err(OrchestratorError::BackendUnreachable {
                url: self.url.to_string(),
                reason: err.to_string(),
            }
            .into());
        }

        let res = res.unwrap();
        if res.status() != 200 {
            tracing::error!(status = res.status().as_u16(), "Ollama health check failed");
            return Err(OrchestratorError::BackendError {
                status: res.status().as_u16(),
            }
            .into());
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/api/tags", url = self.url))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .models
            .iter()
            .map(|model| {
                return model.name.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: BackendPrompt, options: GenerateOptions) -> Result<String> {
        let timeout_secs = self.generation_timeout.parse::<u64>()?;

        let req = CompletionRequest {
            model: Config::get(ConfigKey::Model),
            prompt: prompt.text,
            system: prompt.system,
            stream: false,
            options: CompletionOptions {
                temperature: options.temperature,
                top_p: 0.9,
                top_k: 40,
                num_ctx: 4096,
                num_predict: options.max_tokens,
                stop: if options.stop.is_empty() {
                    None
                } else {
                    Some(options.stop)
                },
            },
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/api/generate", url = self.url))
            .timeout(Duration::from_secs(timeout_secs))
            .json(&req)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    return anyhow::Error::from(OrchestratorError::BackendTimeout {
                        seconds: timeout_secs,
                    });
                }
                if err.is_connect() {
                    return anyhow::Error::from(OrchestratorError::BackendUnreachable {
                        url: self.url.to_string(),
                        reason: err.to_string(),
                    });
                }
                return anyhow::Error::from(err);
            })?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Ollama"
            );
            return Err(OrchestratorError::BackendError {
                status: res.status().as_u16(),
            }
            .into());
        }

        let ores = res.json::<CompletionResponse>().await?;
        tracing::debug!(done = ores.done, "Completion response");

        return Ok(ores.response);
    }
}
