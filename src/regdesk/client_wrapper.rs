use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt;
use std::pin::Pin;

/// A CompletionClient is a wrapper around a chat-completion endpoint.
/// It provides a common interface for one round-trip against the model.
/// It does not keep track of the conversation; the [`Assistant`](crate::Assistant)
/// owns the message list for the duration of a turn and uses a CompletionClient
/// to talk to the model.

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Set by the application to steer the model's responses.
    System,
    /// A message sent by a human user (or app user).
    User,
    /// Content generated by the model in response to a user message.
    Assistant,
    /// The serialized result of a tool invocation, fed back to the model.
    Tool,
}

/// A single role-tagged message in a conversation turn.
///
/// Immutable once appended to a turn's message list. Tool-response messages
/// carry the id of the call they answer in `tool_call_id` and the tool's name
/// in `name`; assistant messages requesting tools carry them in `tool_calls`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Message body. Deserialization coerces any non-string JSON content to its
    /// string representation, so a misbehaving endpoint never aborts a turn.
    #[serde(default, deserialize_with = "content_as_string")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Build an assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Build a tool-response message answering the call identified by `tool_call_id`.
    pub fn tool_response(
        tool_call_id: Option<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        ChatMessage {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id,
            name: Some(tool_name.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }
}

/// A structured request, emitted by the model, to invoke a named tool.
///
/// Created by the completion client from model output, consumed once by the
/// dispatcher, and discarded after a tool-response message is produced. The
/// argument payload is model-produced and untrusted; it stays a raw string
/// until the dispatcher has run it through [`json_repair`](crate::json_repair).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: ToolCallFunction,
}

/// The function half of a [`ToolCall`]: the tool name plus its raw arguments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Raw argument text. Some endpoints emit a JSON object here instead of an
    /// encoded string; deserialization coerces either form to a string.
    #[serde(default = "empty_object", deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

/// Wire-level tool advertisement sent with every completion request:
/// `{"type": "function", "function": {"name", "description", "parameters"}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

/// Name, description, and JSON-schema parameter object of an advertised tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// An event surfaced while consuming a streaming completion.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// An incremental piece of assistant content.
    Content(String),
    /// The model requested tool calls mid-stream. Partial tool-call argument
    /// fragments cannot be dispatched safely, so the caller must abandon the
    /// stream and restart the turn through the non-streaming path.
    ToolCalls(Vec<ToolCall>),
    /// The endpoint signalled end of stream.
    Done,
}

/// Type alias for the stream handle returned by [`CompletionClient::complete_stream`].
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, CompletionError>> + Send>>;

/// Error categories a completion request can produce.
///
/// Nothing panics past the client boundary: endpoint and transport failures
/// both come back as values so the orchestrator can turn them into a polite
/// user-facing message.
#[derive(Debug, Clone)]
pub enum CompletionError {
    /// The endpoint could not be reached at all.
    Transport(String),
    /// The endpoint answered with a non-success status.
    Api { status: u16, body: String },
    /// The endpoint answered 2xx but the body did not decode.
    InvalidResponse(String),
    /// The client implementation has no streaming support.
    StreamingUnsupported,
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Transport(msg) => {
                write!(f, "Failed to communicate with LLM: {}", msg)
            }
            CompletionError::Api { status, body } => {
                write!(f, "Error from LLM API (HTTP {}): {}", status, body)
            }
            CompletionError::InvalidResponse(msg) => {
                write!(f, "Invalid response from LLM API: {}", msg)
            }
            CompletionError::StreamingUnsupported => {
                write!(f, "Streaming not supported by this client")
            }
        }
    }
}

impl Error for CompletionError {}

/// Trait defining the interface to a chat-completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier injected into each request.
    fn model_name(&self) -> &str;

    /// Send the full message list plus the advertised tool set and return the
    /// model's message: either direct assistant content or a set of requested
    /// tool calls.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage, CompletionError>;

    /// Open a streaming completion and return the unconsumed stream handle so
    /// the caller can pull partial tokens. Default implementation reports that
    /// streaming is unsupported, so non-streaming clients don't break.
    async fn complete_stream(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<CompletionStream, CompletionError> {
        Err(CompletionError::StreamingUnsupported)
    }
}

fn empty_object() -> String {
    "{}".to_string()
}

fn content_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn arguments_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => empty_object(),
        other => other.to_string(),
    })
}
