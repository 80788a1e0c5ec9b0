//! Streaming chat example.
//!
//! Run with:
//! ```bash
//! export ASSISTANT_API_URL="http://localhost:8000/api"
//! export ASSISTANT_SESSION_COOKIE="session=..."   # optional
//! RUST_LOG=assistant_stream=debug cargo run --example chat -- "What is in the latest report?"
//! ```

use std::io::Write;

use assistant_stream::{AssistantClient, ChatRequest, ClientOptions, EventKind, Reply};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.is_empty() {
        eprintln!("usage: chat <message>");
        std::process::exit(2);
    }

    let client = AssistantClient::new(ClientOptions::from_env()?)?;
    let mut events = client.chat_stream(&ChatRequest::new(prompt)).await?;

    let mut reply = Reply::new();
    while let Some(event) = events.next().await {
        let event = event?;
        if let Some(token) = event.token() {
            print!("{token}");
            std::io::stdout().flush()?;
        }
        if event.kind == EventKind::Error {
            eprintln!("\nserver error: {}", event.error_message().unwrap_or_default());
        }
        reply.apply(&event)?;
    }
    println!();

    if !reply.sources.is_empty() {
        println!("\nSources:");
        for source in &reply.sources {
            let title = source.title.as_deref().unwrap_or(&source.source);
            match source.score {
                Some(score) => println!("  - {title} ({score:.2})"),
                None => println!("  - {title}"),
            }
        }
    }
    if let Some(id) = reply.conversation_id {
        println!("\nconversation: {id}");
    }

    Ok(())
}
