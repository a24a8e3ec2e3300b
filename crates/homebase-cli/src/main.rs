//! Homebase CLI - chat with local Ollama models from the terminal.

use clap::{Args, Parser, Subcommand};
use homebase_ollama::{
    ContextSize, OllamaClient, OllamaConfig, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use homebase_system::{AcceleratorKind, FixedProbe, HostSettings, SystemProbe};

mod commands;

/// Default system instruction for every conversation.
pub(crate) const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide detailed and accurate responses quickly.";

/// Homebase - chat with local language models
#[derive(Parser)]
#[command(name = "homebase")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ollama server address (overrides OLLAMA_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Skip hardware probing and assume this accelerator (none, apple, nvidia, amd)
    #[arg(long, global = true)]
    accelerator: Option<AcceleratorKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat(GenerationArgs),

    /// Send a single prompt and print the answer
    Ask {
        /// Prompt text
        prompt: String,
        #[command(flatten)]
        args: GenerationArgs,
    },

    /// List models installed on the server
    Models,

    /// Show detected hardware and the selected generation parameters
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Sampling settings shared by `chat` and `ask`.
#[derive(Args, Debug, Clone)]
pub(crate) struct GenerationArgs {
    /// Model name (default: first installed model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature, 0.0 - 2.0
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Nucleus sampling probability, 0.0 - 1.0
    #[arg(long, default_value_t = DEFAULT_TOP_P)]
    pub top_p: f32,

    /// Context window: 2048, 4096, 8192, 16384 or 32768 (default: from hardware)
    #[arg(short, long, value_parser = parse_context_size)]
    pub context_size: Option<ContextSize>,

    /// System prompt (pass an empty string for none)
    #[arg(short, long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system: String,
}

fn parse_context_size(value: &str) -> Result<ContextSize, String> {
    let tokens: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    ContextSize::try_from(tokens).map_err(|e| e.to_string())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let settings = match cli.accelerator {
        Some(kind) => HostSettings::detect(&FixedProbe(kind)),
        None => HostSettings::detect(&SystemProbe::current()),
    };

    let mut config = OllamaConfig::from_env();
    if let Some(host) = &cli.host {
        config.base_url = homebase_ollama::normalize_base_url(host);
    }
    let client = OllamaClient::new(config);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Chat(args) => runtime.block_on(commands::chat::run(client, &settings, &args)),
        Commands::Ask { prompt, args } => {
            runtime.block_on(commands::ask::run(client, &settings, &args, &prompt))
        }
        Commands::Models => runtime.block_on(commands::models::run(&client)),
        Commands::Info { json } => commands::info::run(&settings, client.base_url(), json),
    }
}
