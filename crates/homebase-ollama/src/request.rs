//! Generation request model.

use serde::Serialize;
use std::fmt;

use crate::error::OllamaError;

/// Seed sent with every request so runs are reproducible.
pub const DEFAULT_SEED: u64 = 32;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Context window sizes a request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ContextSize {
    Tokens2K,
    #[default]
    Tokens4K,
    Tokens8K,
    Tokens16K,
    Tokens32K,
}

impl ContextSize {
    pub const ALL: [ContextSize; 5] = [
        Self::Tokens2K,
        Self::Tokens4K,
        Self::Tokens8K,
        Self::Tokens16K,
        Self::Tokens32K,
    ];

    /// Window size in tokens.
    pub fn tokens(self) -> u32 {
        match self {
            Self::Tokens2K => 2048,
            Self::Tokens4K => 4096,
            Self::Tokens8K => 8192,
            Self::Tokens16K => 16384,
            Self::Tokens32K => 32768,
        }
    }
}

impl TryFrom<u32> for ContextSize {
    type Error = OllamaError;

    fn try_from(tokens: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.tokens() == tokens)
            .ok_or_else(|| {
                OllamaError::InvalidRequest(format!(
                    "context size {} is not one of 2048, 4096, 8192, 16384, 32768",
                    tokens
                ))
            })
    }
}

impl fmt::Display for ContextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens())
    }
}

/// User-controlled sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub context_size: ContextSize,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            context_size: ContextSize::default(),
        }
    }
}

impl SamplingParams {
    fn validate(&self) -> Result<(), OllamaError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(OllamaError::InvalidRequest(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(OllamaError::InvalidRequest(format!(
                "top_p {} is outside [0, 1]",
                self.top_p
            )));
        }
        Ok(())
    }
}

/// Hardware-derived server hints forwarded with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeHints {
    pub num_thread: Option<u32>,
    pub num_batch: Option<u32>,
    pub num_gpu: Option<u32>,
}

/// One generation turn. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    model: String,
    prompt: String,
    system_prompt: Option<String>,
    sampling: SamplingParams,
    hints: RuntimeHints,
    seed: u64,
}

impl GenerationRequest {
    /// Start building a request for a model and prompt.
    pub fn builder(model: impl Into<String>, prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            sampling: SamplingParams::default(),
            hints: RuntimeHints::default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    pub fn hints(&self) -> &RuntimeHints {
        &self.hints
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Body for `POST /api/generate`.
    pub(crate) fn to_body(&self) -> GenerateBody<'_> {
        GenerateBody {
            model: &self.model,
            prompt: &self.prompt,
            system: self.system_prompt.as_deref(),
            stream: true,
            options: GenerateOptions {
                temperature: self.sampling.temperature,
                top_p: self.sampling.top_p,
                seed: self.seed,
                num_ctx: self.sampling.context_size.tokens(),
                num_thread: self.hints.num_thread,
                num_batch: self.hints.num_batch,
                num_gpu: self.hints.num_gpu,
            },
        }
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    model: String,
    prompt: String,
    system_prompt: Option<String>,
    sampling: SamplingParams,
    hints: RuntimeHints,
}

impl GenerationRequestBuilder {
    /// Set the system instruction. Blank instructions are dropped.
    pub fn system_prompt(mut self, system: Option<impl Into<String>>) -> Self {
        self.system_prompt = system
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty());
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = temperature;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.sampling.top_p = top_p;
        self
    }

    pub fn context_size(mut self, context_size: ContextSize) -> Self {
        self.sampling.context_size = context_size;
        self
    }

    pub fn hints(mut self, hints: RuntimeHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, OllamaError> {
        if self.model.trim().is_empty() {
            return Err(OllamaError::InvalidRequest(
                "model name must not be empty".to_string(),
            ));
        }
        self.sampling.validate()?;

        Ok(GenerationRequest {
            model: self.model,
            prompt: self.prompt,
            system_prompt: self.system_prompt,
            sampling: self.sampling,
            hints: self.hints,
            seed: DEFAULT_SEED,
        })
    }
}

/// Request to Ollama generate API.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

/// Ollama generation options.
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    seed: u64,
    num_ctx: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_thread: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_batch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<u32>,
}
