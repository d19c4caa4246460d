//! Conversation orchestrator.
//!
//! Drives one user turn from query to final answer. The state machine is
//! intentionally two-hop:
//!
//! ```text
//! SENT_INITIAL → { DIRECT_ANSWER | TOOL_REQUESTED } → TOOLS_EXECUTED → FINAL_ANSWER
//! ```
//!
//! One round of tool calling per turn: tool calls in the follow-up completion
//! are not dispatched again. No error escapes this layer — the worst-case
//! outcome of a turn is a polite apology with empty metadata.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use regdesk::{Assistant, AssistantConfig, InMemoryDocumentStore, MemoryChatLog, ToolRegistry};
//! use regdesk::clients::ollama::OllamaClient;
//! use regdesk::tools::{RegisterSearchTool, RegisterStatsTool, RelatedQueriesTool};
//!
//! #[tokio::main]
//! async fn main() {
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
//!     println!("{}", reply.content);
//! }
//! ```

use futures::channel::mpsc;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use crate::regdesk::chat_log::ChatHistoryLog;
use crate::regdesk::client_wrapper::{
    ChatMessage, CompletionClient, Role, StreamEvent,
};
use crate::regdesk::dates;
use crate::regdesk::tool_protocol::ToolRegistry;

/// System prompt steering every turn.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful Federal Register assistant with access to a database of federal \
regulations, executive orders, and other government documents.

When a user asks about federal regulations, executive orders, or other government \
documents, search the database. You can filter by keywords, document type, and date range.

Available document types:
- executive_order (Executive Orders)
- notice (Notices)
- rule (Rules)
- proposed_rule (Proposed Rules)
- presidential_document (Presidential Documents)

Guidelines for responses:
1. Be warm and conversational; avoid robotic or formulaic phrasing.
2. Present findings as natural prose. Never list results in a mechanical format \
like [{ \"doc_number\": \"X\" }].
3. Cite the document number and publication date of every document you mention.
4. If a search returns no results, explain that politely and suggest alternative queries.
5. Convert relative dates like \"this year\" or \"last month\" into explicit date ranges.
6. When a request is too vague to search, ask a clarifying question instead.

Only use tools when necessary; if you can answer directly, do so.
Do not make up information. Only report what the database returns.
Do not reveal the names of the tools you are using.";

/// Timing and tool-usage data attached to every reply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplyMetadata {
    /// Wall-clock seconds spent on the turn.
    pub query_time: f64,
    /// Names of the tools invoked during the turn, in request order.
    pub tools_used: Vec<String>,
}

/// Final product of a turn.
#[derive(Clone, Debug)]
pub struct AssistantReply {
    pub role: Role,
    pub content: String,
    pub metadata: ReplyMetadata,
}

/// Item yielded by the streaming entry point.
#[derive(Clone, Debug)]
pub enum StreamedReply {
    /// Cumulative partial content; superseded by every later item.
    Partial { content: String },
    /// The turn's final message. Always the last item of the stream.
    Final(AssistantReply),
}

/// Finite, non-restartable stream of partial and final replies.
pub type ReplyStream = Pin<Box<dyn Stream<Item = StreamedReply> + Send>>;

/// Orchestrates one user turn: completion, optional tool dispatch, follow-up
/// completion, logging.
#[derive(Clone)]
pub struct Assistant {
    client: Arc<dyn CompletionClient>,
    registry: Arc<ToolRegistry>,
    chat_log: Arc<dyn ChatHistoryLog>,
    system_prompt: String,
}

impl Assistant {
    /// Create an assistant over the given collaborators with the default
    /// system prompt.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<ToolRegistry>,
        chat_log: Arc<dyn ChatHistoryLog>,
    ) -> Self {
        Assistant {
            client,
            registry,
            chat_log,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the system prompt (builder pattern).
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Borrow the tool registry, e.g. to run a tool outside a model turn.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one full turn and return the final reply.
    ///
    /// Relative date phrases in `user_query` are rewritten to explicit ISO
    /// ranges before the model sees the query. Transport and API failures are
    /// terminal for the turn and come back as an apologetic message with
    /// zero-duration metadata; they are never raised.
    pub async fn generate_response(
        &self,
        user_query: &str,
        history: &[ChatMessage],
        session_id: &str,
    ) -> AssistantReply {
        let processed_query = dates::resolve_relative_dates(user_query);
        let mut messages = self.build_messages(history, &processed_query);
        let definitions = self.registry.definitions();
        let start = Instant::now();

        let first = match self.client.complete(&messages, &definitions).await {
            Ok(message) => message,
            Err(err) => {
                let reply = self.apology(&err.to_string(), ReplyMetadata::default());
                self.log_turn(session_id, user_query, &reply.content, &[]).await;
                return reply;
            }
        };

        if first.tool_calls.is_empty() {
            let reply = AssistantReply {
                role: Role::Assistant,
                content: first.content,
                metadata: ReplyMetadata {
                    query_time: start.elapsed().as_secs_f64(),
                    tools_used: Vec::new(),
                },
            };
            self.log_turn(session_id, user_query, &reply.content, &[]).await;
            return reply;
        }

        let tools_used: Vec<String> = first
            .tool_calls
            .iter()
            .map(|call| call.function.name.clone())
            .collect();

        let tool_results = self.registry.execute_calls(&first.tool_calls).await;
        messages.push(first);
        messages.extend(tool_results);

        let final_message = match self.client.complete(&messages, &definitions).await {
            Ok(message) => message,
            Err(err) => {
                let metadata = ReplyMetadata {
                    query_time: start.elapsed().as_secs_f64(),
                    tools_used: tools_used.clone(),
                };
                let reply = self.apology(&err.to_string(), metadata);
                self.log_turn(session_id, user_query, &reply.content, &tools_used)
                    .await;
                return reply;
            }
        };

        // Only one round of tool calling per turn: a tool call requested in
        // the follow-up completion is not dispatched.
        let reply = AssistantReply {
            role: Role::Assistant,
            content: final_message.content,
            metadata: ReplyMetadata {
                query_time: start.elapsed().as_secs_f64(),
                tools_used: tools_used.clone(),
            },
        };
        self.log_turn(session_id, user_query, &reply.content, &tools_used)
            .await;
        reply
    }

    /// Run one turn against the streaming completion path.
    ///
    /// Yields cumulative partial replies as content arrives and always ends
    /// with a [`StreamedReply::Final`]. If the model requests tool calls
    /// mid-stream, the stream is abandoned (partial argument fragments cannot
    /// be dispatched safely) and the turn re-runs through
    /// [`generate_response`](Assistant::generate_response); its reply becomes
    /// the final item.
    pub fn generate_streaming_response(
        &self,
        user_query: &str,
        history: &[ChatMessage],
        session_id: &str,
    ) -> ReplyStream {
        let assistant = self.clone();
        let user_query = user_query.to_string();
        let history = history.to_vec();
        let session_id = session_id.to_string();

        let (tx, rx) = mpsc::unbounded();
        tokio::spawn(async move {
            assistant
                .stream_turn(user_query, history, session_id, tx)
                .await;
        });
        Box::pin(rx)
    }

    async fn stream_turn(
        &self,
        user_query: String,
        history: Vec<ChatMessage>,
        session_id: String,
        tx: mpsc::UnboundedSender<StreamedReply>,
    ) {
        let messages = self.build_messages(&history, &user_query);
        let definitions = self.registry.definitions();

        let mut stream = match self.client.complete_stream(&messages, &definitions).await {
            Ok(stream) => stream,
            Err(err) => {
                let reply = self.apology(&err.to_string(), ReplyMetadata::default());
                let _ = tx.unbounded_send(StreamedReply::Final(reply));
                return;
            }
        };

        let mut buffer = String::new();
        let mut tool_interrupt = false;
        let mut transport_failed = false;

        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Content(delta)) => {
                    buffer.push_str(&delta);
                    let partial = StreamedReply::Partial {
                        content: buffer.clone(),
                    };
                    if tx.unbounded_send(partial).is_err() {
                        // Consumer hung up; dropping the stream releases the
                        // connection.
                        return;
                    }
                }
                Ok(StreamEvent::ToolCalls(_)) => {
                    tool_interrupt = true;
                    break;
                }
                Ok(StreamEvent::Done) => break,
                Err(err) => {
                    log::error!("Error in streaming response: {}", err);
                    transport_failed = true;
                    break;
                }
            }
        }

        // Release the open response before doing anything else with the turn.
        drop(stream);

        if tool_interrupt {
            let reply = self
                .generate_response(&user_query, &history, &session_id)
                .await;
            let _ = tx.unbounded_send(StreamedReply::Final(reply));
            return;
        }

        if transport_failed && buffer.is_empty() {
            buffer =
                "I'm sorry, the connection to the model was interrupted. Please try again."
                    .to_string();
        }

        self.log_turn(&session_id, &user_query, &buffer, &[]).await;
        let _ = tx.unbounded_send(StreamedReply::Final(AssistantReply {
            role: Role::Assistant,
            content: buffer,
            metadata: ReplyMetadata::default(),
        }));
    }

    fn build_messages(&self, history: &[ChatMessage], query: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(query));
        messages
    }

    fn apology(&self, detail: &str, metadata: ReplyMetadata) -> AssistantReply {
        AssistantReply {
            role: Role::Assistant,
            content: format!(
                "I'm sorry, I encountered an error: {}. Please try rephrasing your question.",
                detail
            ),
            metadata,
        }
    }

    async fn log_turn(
        &self,
        session_id: &str,
        query: &str,
        response: &str,
        tools_used: &[String],
    ) {
        if let Err(err) = self
            .chat_log
            .record(session_id, query, response, tools_used)
            .await
        {
            log::warn!(
                "Failed to record chat turn for session {}: {}",
                session_id,
                err
            );
        }
    }
}
