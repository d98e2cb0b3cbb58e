//! # flowwrite
//!
//! Core of a prompt-chaining tool: workflows are graphs of LLM call nodes
//! whose prompts may embed the output of other nodes. This crate models those
//! graphs, orders them for execution and talks to OpenAI-compatible providers.
//!
//! ## Overview
//!
//! - **Workflow model**: immutable text blocks, node configurations and
//!   workflows, edited through value-returning operations ([`core`]).
//! - **Dependency resolution**: deterministic topological order with missing
//!   reference and cycle detection ([`core::resolve`]).
//! - **Completion client**: one async contract ([`LlmClient`]) over several
//!   providers, with incremental stream parsing and advisory request checks.
//! - **Document store**: file-backed persistence for workflows and settings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowwrite::{ChatMessage, ClientBuilder, ProviderType};
//! use flowwrite::types::build_chat_request;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> flowwrite::Result<()> {
//!     let client = ClientBuilder::new(ProviderType::DeepSeek)
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let request = build_chat_request(vec![ChatMessage::user("Hello!")], "deepseek-chat");
//!     let mut stream = client.chat_completion_stream(&request).await?;
//!     while let Some(chunk) = stream.next().await {
//!         if let Some(text) = chunk?.content_delta() {
//!             print!("{}", text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`core`] | Text blocks, nodes, workflows, resolver, validation |
//! | [`types`] | Chat/FIM request and response wire types |
//! | [`client`] | Client traits, builder, cancellable streams, request checks |
//! | [`drivers`] | Provider adapters and the client factory |
//! | [`registry`] | Provider capability matrix and connection settings |
//! | [`pipeline`] | Byte stream to typed chunk decoding |
//! | [`transport`] | HTTP transport |
//! | [`store`] | File-backed workflow and settings store |

pub mod client;
pub mod core;
pub mod drivers;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use crate::core::{
    resolve, validate_workflow, DependencyError, DependencyErrorKind, DependencyGraph,
    ExecutionOrder, NodeDefinition, NodeMap, WorkflowDefinition,
};
pub use client::{CancelHandle, ChunkStream, ClientBuilder, FimClient, LlmClient};
pub use drivers::create_client;
pub use registry::{ConnectionSettings, ProviderConfig, ProviderType};
pub use store::FileStore;
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FimCompletionRequest, MessageRole,
    StreamChunk,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
