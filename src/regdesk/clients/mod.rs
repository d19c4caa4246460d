//! Completion-client implementations.
//!
//! Currently a single backend: [`ollama::OllamaClient`] for any
//! Ollama-compatible `/api/chat` endpoint. Additional providers only need to
//! implement [`CompletionClient`](crate::client_wrapper::CompletionClient).

pub mod ollama;

pub use ollama::OllamaClient;
