//! Terminal chat REPL.
//!
//! Runs the same RAG pipeline as the HTTP chat endpoint, reading turns from
//! stdin. Type `exit` or `quit` (or hit ctrl-d) to leave.

use anyhow::Result;
use std::io::Write;

use crate::config::CollectiveConfig;
use crate::pipeline;
use crate::server;

pub async fn chat(config: CollectiveConfig) -> Result<()> {
    println!("Loading collective memory and models...");
    let state = server::build_state(config)?;

    println!("Collective AI is online. Type 'exit' to quit.");
    println!("{}", "-".repeat(50));

    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let message = line.trim().to_string();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let turn_state = state.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            pipeline::chat_reply(
                &turn_state.db,
                turn_state.embedder.as_ref(),
                turn_state.generator.as_ref(),
                &turn_state.config,
                &message,
            )
        })
        .await??;

        if outcome.context_used > 0 {
            println!("(using {} memory fragment(s))", outcome.context_used);
        }
        println!("AI: {}", outcome.reply);
        println!("{}", "-".repeat(50));
    }

    Ok(())
}
