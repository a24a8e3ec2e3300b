//! # Homebase Ollama client
//!
//! Streams completions from a local Ollama server and strips the model's
//! `<think>` reasoning blocks from what the user sees.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ POST         │ -> │ LineDecoder  │ -> │  Response    │ -> │  Generation  │
//! │ /api/generate│    │ (NDJSON)     │    │  Assembler   │    │  Outcome     │
//! └──────────────┘    └──────────────┘    └──────┬───────┘    └──────────────┘
//!                                                │
//!                                          on_progress(text)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use homebase_ollama::{GenerationRequest, OllamaClient};
//!
//! let client = OllamaClient::from_env();
//! let request = GenerationRequest::builder("llama2", "Hello!").build()?;
//! let outcome = client.generate(&request, |partial| print!("\r{}", partial)).await;
//! ```

mod config;
mod error;
mod filter;
mod ollama;
mod outcome;
mod request;
mod stream;

#[cfg(test)]
mod test_server;

pub use config::{
    normalize_base_url, OllamaConfig, OllamaConfigBuilder, DEFAULT_GENERATE_TIMEOUT,
    DEFAULT_LIST_TIMEOUT,
};
pub use error::OllamaError;
pub use filter::{filter_thinking, THINK_CLOSE, THINK_OPEN};
pub use ollama::OllamaClient;
pub use outcome::GenerationOutcome;
pub use request::{
    ContextSize, GenerationRequest, GenerationRequestBuilder, RuntimeHints, SamplingParams,
    DEFAULT_SEED, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
pub use stream::{GenerationChunk, LineDecoder, LineOutcome, ResponseAssembler};

/// Default Ollama server URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model used when the server lists none.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
