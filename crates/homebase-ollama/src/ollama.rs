//! Ollama API client with streaming generation.

use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::OllamaConfig;
use crate::error::OllamaError;
use crate::outcome::GenerationOutcome;
use crate::request::GenerationRequest;
use crate::stream::{LineDecoder, LineOutcome, ResponseAssembler};

/// Ollama API client.
///
/// Cheap to clone; clones share the underlying connection pool. Each
/// generation call opens its own request and never retries.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

/// Response from Ollama tags API (list models).
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client.
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(OllamaConfig::from_env())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// List the names of installed models.
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let tags_url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&tags_url)
            .timeout(self.config.list_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    OllamaError::ServerNotRunning(self.config.base_url.clone())
                } else {
                    OllamaError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{}: {}", status, text)));
        }

        let tags: OllamaTagsResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// List installed models, treating any failure as "none installed".
    pub async fn list_models_or_empty(&self) -> Vec<String> {
        match self.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Could not list models: {}", e);
                Vec::new()
            }
        }
    }

    /// Check if the server is running and the model is available.
    pub async fn check_availability(&self, model: &str) -> Result<(), OllamaError> {
        let models = self.list_models().await?;
        let model_base = model.split(':').next().unwrap_or(model);

        let model_found = models
            .iter()
            .any(|m| m == model || m.starts_with(&format!("{}:", model_base)));

        if !model_found {
            return Err(OllamaError::ModelNotFound(model.to_string()));
        }

        Ok(())
    }

    /// Run one streaming generation.
    ///
    /// `on_progress` receives the filtered text assembled so far each time a
    /// fragment with visible content arrives. The call resolves once the
    /// server signals completion or closes the stream, or when the
    /// configured timeout elapses. Dropping the future closes the
    /// connection.
    pub async fn generate<F>(&self, request: &GenerationRequest, mut on_progress: F) -> GenerationOutcome
    where
        F: FnMut(&str),
    {
        let url = format!("{}/api/generate", self.config.base_url);
        info!("Generating with model {}", request.model());

        let response = match self
            .client
            .post(&url)
            .timeout(self.config.generate_timeout)
            .json(&request.to_body())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Generation request failed: {}", e);
                return GenerationOutcome::TransportError(self.describe_transport_error(&e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Generation rejected with status {}", status);
            return GenerationOutcome::ProtocolError {
                status: status.as_u16(),
                body,
            };
        }

        let mut assembler = ResponseAssembler::default();
        let mut decoder = LineDecoder::default();
        let mut stream = response.bytes_stream();

        while let Some(bytes) = stream.next().await {
            let bytes = match bytes {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Stream interrupted: {}", e);
                    return GenerationOutcome::TransportError(self.describe_transport_error(&e));
                }
            };

            for line in decoder.push(&bytes) {
                match assembler.feed_bytes(&line, &mut on_progress) {
                    LineOutcome::Continue => {}
                    LineOutcome::Done => return finish(assembler),
                    LineOutcome::Failed(error) => {
                        return GenerationOutcome::ProtocolError {
                            status: status.as_u16(),
                            body: error,
                        }
                    }
                }
            }
        }

        if let Some(line) = decoder.finish() {
            if let LineOutcome::Failed(error) = assembler.feed_bytes(&line, &mut on_progress) {
                return GenerationOutcome::ProtocolError {
                    status: status.as_u16(),
                    body: error,
                };
            }
        }

        debug!("Stream closed by server");
        finish(assembler)
    }

    fn describe_transport_error(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!(
                "request timed out after {}s",
                self.config.generate_timeout.as_secs()
            )
        } else if error.is_connect() {
            format!("server not reachable at {} ({})", self.config.base_url, error)
        } else {
            error.to_string()
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(OllamaConfig::default())
    }
}

fn finish(assembler: ResponseAssembler) -> GenerationOutcome {
    if assembler.skipped_lines() > 0 {
        warn!("{} stream lines could not be decoded", assembler.skipped_lines());
    }
    GenerationOutcome::Completed(assembler.finish())
}
