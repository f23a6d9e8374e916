use anyhow::{Context, Result};
use chrono::SecondsFormat;
use reqwest::Client;
use std::io::{self, Write};

use crate::config::Settings;
use crate::error::Error;
use crate::gateway::{ModelGateway, OllamaGateway};
use crate::session::Session;

const NO_HISTORY_PLACEHOLDER: &str = "No conversation history yet.";

/// One trimmed input line, classified. Keywords are matched
/// case-insensitively; anything else non-empty is a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    Memory,
    Help,
    Quit,
    Empty,
    Chat(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if trimmed.eq_ignore_ascii_case("clear") {
            return Self::Clear;
        }
        if trimmed.eq_ignore_ascii_case("memory") {
            return Self::Memory;
        }
        if trimmed.eq_ignore_ascii_case("help") {
            return Self::Help;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            return Self::Quit;
        }
        Self::Chat(trimmed.to_string())
    }
}

pub async fn run_repl(client: &Client, settings: &Settings) -> Result<()> {
    let gateway = OllamaGateway::new(client, settings);
    let mut session = Session::new(&gateway, "default", settings.max_history_messages);

    print_welcome(settings);

    loop {
        print!("you> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        match Command::parse(&input) {
            Command::Quit => {
                println!("goodbye");
                break;
            }
            Command::Empty => continue,
            Command::Help => print_help(),
            Command::Clear => {
                session.reset();
                println!("conversation cleared, starting fresh\n");
            }
            Command::Memory => print_memory(&session, settings.memory_window),
            Command::Chat(text) => match session.run_turn(&text).await {
                Ok(answer) => println!("{}\n", answer.trim()),
                Err(err) => {
                    println!("error: {err}");
                    println!("{}\n", guidance(&err));
                }
            },
        }
    }

    Ok(())
}

fn print_welcome(settings: &Settings) {
    println!("parley chat client");
    println!("model: {} via {}", settings.model, settings.base_url);
    print_help();
}

fn print_help() {
    println!("commands:");
    println!("  clear   start a new conversation");
    println!("  memory  show recent conversation history");
    println!("  help    show this message");
    println!("  quit    end the session (also: exit)");
    println!();
}

fn print_memory<G>(session: &Session<'_, G>, window: usize)
where
    G: ModelGateway,
{
    if session.history().is_empty() {
        println!("{NO_HISTORY_PLACEHOLDER}\n");
        return;
    }

    println!(
        "session '{}' started {}",
        session.id(),
        session
            .started_at()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    println!("{}\n", session.history().summary(window));
}

/// Recovery hint printed under a failed turn; the loop always continues.
fn guidance(err: &Error) -> &'static str {
    match err {
        Error::ModelUnavailable { .. } => {
            "Make sure the model server is running (`ollama serve`) and that \
             OLLAMA_BASE_URL points at it, then try again."
        }
        Error::ModelNotFound { .. } => {
            "Install the model with `ollama pull <model>` or set OLLAMA_MODEL \
             to a model the server already has."
        }
        Error::UnexpectedResponse(_) => {
            "The server answered in an unexpected format; check that \
             OLLAMA_BASE_URL points at an Ollama server."
        }
        Error::Configuration(_) => "Fix the configuration and restart.",
    }
}
