//! toolchat - interactive CLI entry point.
//!
//! Reads user messages from stdin, runs each one through the session
//! dispatch loop, and prints the model's reply.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use toolchat::config::Config;
use toolchat::llm::OpenRouterClient;
use toolchat::session::Session;
use toolchat::tools::ToolRegistry;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolchat=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.default_model);

    let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    let tools = Arc::new(ToolRegistry::builtin()?);
    info!("Registered {} tools", tools.len());

    let mut session = Session::new(config, llm, tools);

    println!("toolchat - type 'exit' or 'quit' to leave");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.run(input).await {
            Ok(reply) => match reply.content.as_deref() {
                Some(text) if !text.trim().is_empty() => println!("Agent: {}", text),
                _ => println!("Agent: (no text reply)"),
            },
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    println!("Bye!");
    Ok(())
}
