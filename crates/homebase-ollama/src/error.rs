//! Error types for Ollama operations.

use thiserror::Error;

/// Errors from the Ollama client.
///
/// Streaming generation never returns these; it reports failures through
/// [`GenerationOutcome`](crate::GenerationOutcome) instead.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("Ollama API error: {0}")]
    Api(String),

    /// Server is not running or not reachable.
    #[error("Ollama server not running at {0}. Start it with: ollama serve")]
    ServerNotRunning(String),

    /// Model is not installed on the server.
    #[error("Model '{0}' not found. Pull it with: ollama pull {0}")]
    ModelNotFound(String),

    /// Request parameters are out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
