//! Models command - list what the server has installed.

use homebase_ollama::OllamaClient;

pub(crate) async fn run(client: &OllamaClient) -> miette::Result<()> {
    let models = client
        .list_models()
        .await
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;

    if models.is_empty() {
        println!("No models installed.");
        println!();
        println!("To install one, run:");
        println!("  ollama pull llama2");
        return Ok(());
    }

    println!("Installed models:");
    for model in models {
        println!("  - {}", model);
    }

    println!();
    println!("Server: {}", client.base_url());

    Ok(())
}
