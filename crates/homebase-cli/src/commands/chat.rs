//! Chat command - interactive conversation on stdin.

use homebase_ollama::OllamaClient;
use homebase_system::HostSettings;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::session::ChatSession;
use crate::GenerationArgs;

/// REPL command entered at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Prompt(&'a str),
    Clear,
    History,
    Models,
    Help,
    Exit,
    Empty,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        "/clear" => Input::Clear,
        "/history" => Input::History,
        "/models" => Input::Models,
        "/help" => Input::Help,
        "/exit" | "/quit" => Input::Exit,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        _ => Input::Prompt(trimmed),
    }
}

pub(crate) async fn run(
    client: OllamaClient,
    settings: &HostSettings,
    args: &GenerationArgs,
) -> miette::Result<()> {
    let mut session = ChatSession::connect(client, settings, args).await?;

    println!("Chatting with {} (/help for commands)", session.model());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout()
            .flush()
            .map_err(|e| miette::miette!("Failed to write prompt: {}", e))?;

        let line = match lines
            .next_line()
            .await
            .map_err(|e| miette::miette!("Failed to read input: {}", e))?
        {
            Some(line) => line,
            None => break,
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Help => print_help(),
            Input::Clear => {
                session.clear();
                println!("Chat cleared.");
            }
            Input::History => {
                for message in session.history() {
                    println!("[{}] {}", message.role.label(), message.content);
                }
            }
            Input::Models => {
                for model in session.client().list_models_or_empty().await {
                    println!("  - {}", model);
                }
            }
            Input::Unknown(cmd) => println!("Unknown command: {} (try /help)", cmd),
            Input::Prompt(prompt) => {
                let mut stdout = std::io::stdout();
                session.send(prompt, &mut stdout).await?;
                println!();
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  /clear    Forget the conversation so far");
    println!("  /history  Show the conversation so far");
    println!("  /models   List installed models");
    println!("  /exit     Leave the chat");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  hello there \n"), Input::Prompt("hello there"));
        assert_eq!(parse_input("/clear"), Input::Clear);
        assert_eq!(parse_input("/quit"), Input::Exit);
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("/bogus"), Input::Unknown("/bogus"));
    }
}
