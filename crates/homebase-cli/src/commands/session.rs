//! Chat session state and live rendering of streamed text.

use homebase_ollama::{
    ContextSize, GenerationOutcome, GenerationRequest, OllamaClient, OllamaError, RuntimeHints,
    SamplingParams, DEFAULT_OLLAMA_MODEL,
};
use homebase_system::HostSettings;
use std::io::Write;
use tracing::{debug, warn};

use crate::GenerationArgs;

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    User,
    Assistant,
}

impl Role {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One conversation with a model. History lives only in memory.
pub(crate) struct ChatSession {
    client: OllamaClient,
    model: String,
    sampling: SamplingParams,
    hints: RuntimeHints,
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    /// Build a session, picking a model from the server when none is given.
    ///
    /// An explicitly named model must be installed. If the server cannot be
    /// reached the session is still built; the first generation reports it.
    pub(crate) async fn connect(
        client: OllamaClient,
        settings: &HostSettings,
        args: &GenerationArgs,
    ) -> miette::Result<Self> {
        let model = match &args.model {
            Some(model) => {
                match client.check_availability(model).await {
                    Ok(()) => {}
                    Err(e @ OllamaError::ModelNotFound(_)) => return Err(miette::miette!("{}", e)),
                    Err(e) => warn!("Could not check model {}: {}", model, e),
                }
                model.clone()
            }
            None => pick_default_model(&client.list_models_or_empty().await),
        };
        Self::new(client, settings, args, model)
    }

    pub(crate) fn new(
        client: OllamaClient,
        settings: &HostSettings,
        args: &GenerationArgs,
        model: String,
    ) -> miette::Result<Self> {
        let config = settings.config();

        // User choices win; hardware fills in the rest.
        let context_size = match args.context_size {
            Some(size) => size,
            None => ContextSize::try_from(config.context_size)
                .map_err(|e| miette::miette!("Hardware context size is not usable: {}", e))?,
        };
        let sampling = SamplingParams {
            temperature: args.temperature,
            top_p: args.top_p,
            context_size,
        };
        let hints = RuntimeHints {
            num_thread: Some(config.thread_count),
            num_batch: Some(config.batch_size),
            num_gpu: config.gpu_layer_count(),
        };

        let session = Self {
            client,
            model,
            sampling,
            hints,
            system_prompt: Some(args.system.clone()),
            history: Vec::new(),
        };
        // Fail fast on out-of-range sampling values.
        session.request("")?;
        debug!("Chat session ready with model {}", session.model);
        Ok(session)
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub(crate) fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
    }

    pub(crate) fn request(&self, prompt: &str) -> miette::Result<GenerationRequest> {
        GenerationRequest::builder(self.model.as_str(), prompt)
            .system_prompt(self.system_prompt.as_deref())
            .sampling(self.sampling)
            .hints(self.hints)
            .build()
            .map_err(|e| miette::miette!("{}", e))
    }

    /// Send one prompt, rendering partial text to `out` as it streams.
    pub(crate) async fn send(
        &mut self,
        prompt: &str,
        out: &mut impl Write,
    ) -> miette::Result<GenerationOutcome> {
        let request = self.request(prompt)?;
        self.history.push(ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        });

        let mut printer = StreamPrinter::new(out);
        let outcome = self
            .client
            .generate(&request, |partial| printer.update(partial))
            .await;
        printer.finish(&outcome);

        self.history.push(ChatMessage {
            role: Role::Assistant,
            content: outcome.clone().into_display_text(),
        });
        Ok(outcome)
    }
}

/// First installed model, or the built-in fallback.
pub(crate) fn pick_default_model(installed: &[String]) -> String {
    match installed.first() {
        Some(model) => model.clone(),
        None => {
            eprintln!("No models found. Please make sure Ollama is running.");
            DEFAULT_OLLAMA_MODEL.to_string()
        }
    }
}

/// Renders successive partial texts to a terminal-like writer.
///
/// Appends only the new suffix while the text grows; when a thinking block
/// closes and the visible text shrinks, starts a fresh line and reprints.
pub(crate) struct StreamPrinter<'w, W: Write> {
    out: &'w mut W,
    printed: String,
}

impl<'w, W: Write> StreamPrinter<'w, W> {
    pub(crate) fn new(out: &'w mut W) -> Self {
        Self {
            out,
            printed: String::new(),
        }
    }

    pub(crate) fn update(&mut self, text: &str) {
        let result = match text.strip_prefix(self.printed.as_str()) {
            Some(delta) => self.out.write_all(delta.as_bytes()),
            None => write!(self.out, "\n{}", text),
        };
        if result.is_ok() {
            let _ = self.out.flush();
            self.printed = text.to_string();
        }
    }

    /// Print whatever the final outcome adds and end the line.
    pub(crate) fn finish(mut self, outcome: &GenerationOutcome) {
        match outcome {
            GenerationOutcome::Completed(text) => {
                if *text != self.printed {
                    self.update(text);
                }
            }
            failure => {
                if !self.printed.is_empty() {
                    let _ = writeln!(self.out);
                }
                let _ = write!(self.out, "{}", failure);
            }
        }
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}
