//! Result of a streaming generation call.

use std::fmt;

/// How a generation call ended.
///
/// Generation never fails with an `Err`; transport and protocol problems
/// are reported here so the caller can decide how to show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Final filtered text.
    Completed(String),
    /// The server could not be reached or the connection broke.
    TransportError(String),
    /// The server answered with a failure.
    ProtocolError { status: u16, body: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Generated text, if the call completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            _ => None,
        }
    }

    /// Generated text on success, otherwise a user-facing diagnostic.
    pub fn into_display_text(self) -> String {
        match self {
            Self::Completed(text) => text,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for GenerationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(text) => f.write_str(text),
            Self::TransportError(detail) => write!(f, "Error connecting to Ollama: {}", detail),
            Self::ProtocolError { status, body } => write!(f, "Error: {} - {}", status, body),
        }
    }
}
