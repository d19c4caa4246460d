//! # regdesk
//!
//! regdesk is a conversational assistant over a regulatory-document database.
//! It answers natural-language questions about government documents by driving
//! a locally hosted, Ollama-compatible language model that can invoke a small
//! set of query tools.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Function-calling dispatch**: [`ToolRegistry`] maps tool names onto
//!   capability-typed [`tool_protocol::ToolHandler`]s, repairs the model's
//!   malformed JSON arguments, and turns every call — including unknown names
//!   and handler failures — into a tool-response message
//! * **JSON argument repair**: [`json_repair`] normalizes almost-JSON (code
//!   fences, bare keys, single quotes, trailing commas) before decoding
//! * **Completion transport**: the [`client_wrapper::CompletionClient`] trait
//!   with an [`clients::OllamaClient`] implementation covering blocking and
//!   streaming completions
//! * **Turn orchestration**: [`Assistant`] runs the two-hop tool-calling state
//!   machine, rewrites relative date phrases, attaches timing and tool-usage
//!   metadata, and records every turn to a [`chat_log::ChatHistoryLog`]
//! * **Document access**: the [`document_store::DocumentStore`] seam with an
//!   in-memory implementation, document-type standardization, and raw-record
//!   normalization
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use regdesk::{Assistant, AssistantConfig, InMemoryDocumentStore, MemoryChatLog, ToolRegistry};
//! use regdesk::clients::ollama::OllamaClient;
//! use regdesk::tools::{RegisterSearchTool, RegisterStatsTool, RelatedQueriesTool};
//!
//! #[tokio::main]
//! async fn main() {
//!     regdesk::init_logger();
//!
//!     let store = Arc::new(InMemoryDocumentStore::new());
//!     let mut registry = ToolRegistry::new();
//!     registry.register(Arc::new(RegisterSearchTool::new(store.clone())));
//!     registry.register(Arc::new(RegisterStatsTool::new(store.clone())));
//!     registry.register(Arc::new(RelatedQueriesTool));
//!
//!     let assistant = Assistant::new(
//!         Arc::new(OllamaClient::new(AssistantConfig::from_env())),
//!         Arc::new(registry),
//!         Arc::new(MemoryChatLog::new()),
//!     );
//!
//!     let reply = assistant
//!         .generate_response("What are the latest executive orders?", &[], "demo")
//!         .await;
//!     println!("{} (tools: {:?})", reply.content, reply.metadata.tools_used);
//! }
//! ```
//!
//! Sessions are isolated by session identifier; a turn owns its message list
//! and shares no mutable state with concurrent turns. Only one round of tool
//! calling runs per turn — the orchestrator's state machine is intentionally
//! two-hop and does not recurse into tool chains.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// regdesk can opt in to simple `RUST_LOG` driven diagnostics without having
/// to choose a specific logging backend upfront.
///
/// ```rust
/// regdesk::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `regdesk` module.
pub mod regdesk;

// Re-exporting key items for easier external access.
pub use crate::regdesk::assistant::{
    Assistant, AssistantReply, ReplyMetadata, ReplyStream, StreamedReply, DEFAULT_SYSTEM_PROMPT,
};
pub use crate::regdesk::chat_log;
pub use crate::regdesk::chat_log::{ChatHistoryLog, ChatRecord, MemoryChatLog};
pub use crate::regdesk::client_wrapper;
pub use crate::regdesk::client_wrapper::{
    ChatMessage, CompletionClient, CompletionError, CompletionStream, Role, StreamEvent, ToolCall,
    ToolDefinition,
};
pub use crate::regdesk::clients;
pub use crate::regdesk::config::AssistantConfig;
pub use crate::regdesk::dates;
pub use crate::regdesk::document_store;
pub use crate::regdesk::document_store::{
    DatabaseStats, Document, DocumentQuery, DocumentStore, InMemoryDocumentStore,
};
pub use crate::regdesk::json_repair;
pub use crate::regdesk::tool_protocol;
pub use crate::regdesk::tool_protocol::{
    ToolError, ToolHandler, ToolMetadata, ToolParameter, ToolParameterType, ToolRegistry,
};
pub use crate::regdesk::tools;
