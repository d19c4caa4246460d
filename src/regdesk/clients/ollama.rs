//! Chat-completion client for an Ollama-compatible endpoint.
//!
//! Speaks `POST {base_url}/api/chat` with the full message list, the static
//! tool-definition set, and a fixed low sampling temperature. Errors never
//! escape as panics: unreachable endpoints and non-success statuses come back
//! as [`CompletionError`] values for the orchestrator to translate.
//!
//! # Example
//!
//! ```rust,no_run
//! use regdesk::clients::ollama::OllamaClient;
//! use regdesk::client_wrapper::{ChatMessage, CompletionClient};
//! use regdesk::AssistantConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OllamaClient::new(AssistantConfig::from_env());
//!     let reply = client
//!         .complete(&[ChatMessage::user("Any new rules about emissions?")], &[])
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures::channel::mpsc;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::regdesk::client_wrapper::{
    ChatMessage, CompletionClient, CompletionError, CompletionStream, StreamEvent, ToolDefinition,
};
use crate::regdesk::config::AssistantConfig;

/// Client wrapper for an Ollama-compatible chat endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolDefinition],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ChatMessage>,
}

impl OllamaClient {
    /// Create a client from connection settings.
    pub fn new(config: AssistantConfig) -> Self {
        OllamaClient {
            http: reqwest::Client::new(),
            base_url: config.base_url,
            model: config.model,
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    async fn send_request(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> Result<reqwest::Response, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            tools,
            temperature: self.temperature,
            stream,
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                log::error!("Error calling LLM API: {}", err);
                CompletionError::Transport(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("LLM API returned HTTP {}: {}", status, body);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, CompletionError> {
        let response = self.send_request(messages, tools, false).await?;
        let decoded: ChatResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::InvalidResponse(err.to_string()))?;
        Ok(decoded.message)
    }

    /// Open a streaming completion and hand back the unconsumed stream.
    ///
    /// The endpoint emits newline-delimited `data: <json>` chunks terminated
    /// by a `[DONE]` sentinel. Chunks that fail to decode are skipped and the
    /// stream continues. The background reader stops — releasing the network
    /// resource — as soon as the endpoint signals completion, the model
    /// requests tool calls, or the consumer drops the stream handle.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<CompletionStream, CompletionError> {
        let response = self.send_request(messages, tools, true).await?;

        let (tx, rx) = mpsc::unbounded();
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            'read: while let Some(next) = bytes.next().await {
                let chunk = match next {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        log::error!("Error in streaming response: {}", err);
                        let _ = tx.unbounded_send(Err(CompletionError::Transport(
                            err.to_string(),
                        )));
                        break;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    let event = match parse_stream_line(line.trim()) {
                        Some(event) => event,
                        None => continue,
                    };
                    let terminal = !matches!(event, StreamEvent::Content(_));
                    if tx.unbounded_send(Ok(event)).is_err() {
                        // Consumer dropped the handle; stop reading.
                        break 'read;
                    }
                    if terminal {
                        break 'read;
                    }
                }
            }
        });

        Ok(Box::pin(rx))
    }
}

/// Decode one line of the streaming body into an event.
///
/// Lines without the `data: ` prefix and chunks that fail to decode yield
/// `None` and are skipped by the reader.
fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let data = line.strip_prefix("data: ")?;
    if data.trim() == "[DONE]" {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let message = chunk.message?;
            if !message.tool_calls.is_empty() {
                return Some(StreamEvent::ToolCalls(message.tool_calls));
            }
            if message.content.is_empty() {
                None
            } else {
                Some(StreamEvent::Content(message.content))
            }
        }
        Err(err) => {
            log::debug!("Skipping undecodable stream chunk: {}", err);
            None
        }
    }
}
