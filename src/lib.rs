//! # assistant-stream - Assistant API client
//!
//! A small async client for a retrieval-augmented assistant backend, built
//! around a streaming chat decoder.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental decoding of `text/event-stream` chat replies that tolerates
//!   any chunking of the response body
//! - Typed wrappers for conversations, attachments, uploads and admin calls
//! - Pluggable [`Transport`] for testing without a network
//!
//! ## Architecture
//!
//! The chat path has two layers:
//!
//! 1. **[`sse::FrameSplitter`]** buffers raw chunks, decodes UTF-8
//!    incrementally and cuts the text into blank-line separated frames.
//! 2. **[`ChatEventStream`]** pulls frames, parses the `data: ` payload of
//!    each one into a [`ChatEvent`] and yields events lazily.
//!
//! Everything else is plain request/response on [`AssistantClient`].
//!
//! ## Example
//! ```no_run
//! use assistant_stream::{AssistantClient, ChatRequest, ClientOptions, Reply};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AssistantClient::new(ClientOptions::from_env()?)?;
//!
//!     let events = client
//!         .chat_stream(&ChatRequest::new("Summarise the latest report").with_top_k(3))
//!         .await?;
//!     let reply = Reply::collect(events).await?;
//!
//!     println!("{}", reply.content);
//!     for source in &reply.sources {
//!         println!("  - {}", source.source);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod model;
pub mod options;
mod resources;
pub mod sse;
pub mod stream;
pub mod transcript;

// Re-exports for convenience
pub use auth::PageAccess;
pub use client::{AssistantClient, ClientError};
pub use http::{FileUpload, ReqwestTransport, Transport};
pub use model::{ChatEvent, ChatRequest, EventKind};
pub use options::ClientOptions;
pub use stream::ChatEventStream;
pub use transcript::Reply;
