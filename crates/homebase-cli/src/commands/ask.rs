//! Ask command - one prompt, one streamed answer.

use homebase_ollama::OllamaClient;
use homebase_system::HostSettings;

use super::session::ChatSession;
use crate::GenerationArgs;

pub(crate) async fn run(
    client: OllamaClient,
    settings: &HostSettings,
    args: &GenerationArgs,
    prompt: &str,
) -> miette::Result<()> {
    let mut session = ChatSession::connect(client, settings, args).await?;

    let mut stdout = std::io::stdout();
    let outcome = session.send(prompt, &mut stdout).await?;

    if outcome.is_success() {
        Ok(())
    } else {
        Err(miette::miette!("Generation failed"))
    }
}
