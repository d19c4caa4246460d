use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Arc, Mutex};

use regdesk::client_wrapper::{ToolCall, ToolCallFunction};
use regdesk::tools::{
    RegisterSearchTool, RegisterStatsTool, RelatedQueriesTool, SEARCH_TOOL_NAME,
};
use regdesk::{
    Assistant, ChatHistoryLog, ChatMessage, CompletionClient, CompletionError, Document,
    InMemoryDocumentStore, MemoryChatLog, ToolDefinition, ToolRegistry,
};

/// Completion client that replays a scripted sequence of results and captures
/// every request it receives.
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<ChatMessage, CompletionError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<ChatMessage, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatMessage, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatMessage::assistant("script exhausted")))
    }
}

/// Chat log that always fails, for verifying logging is non-fatal.
struct FailingChatLog;

#[async_trait]
impl ChatHistoryLog for FailingChatLog {
    async fn record(
        &self,
        _session_id: &str,
        _query: &str,
        _response: &str,
        _tools_used: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Err("history backend offline".into())
    }
}

fn document(number: &str, title: &str, date: &str) -> Document {
    Document {
        document_number: number.to_string(),
        title: title.to_string(),
        publication_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        document_type: None,
        abstract_text: None,
        html_url: None,
        pdf_url: None,
    }
}

fn search_call(id: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: Some(id.to_string()),
        function: ToolCallFunction {
            name: SEARCH_TOOL_NAME.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

fn tool_call_message(calls: Vec<ToolCall>) -> ChatMessage {
    let mut message = ChatMessage::assistant("");
    message.tool_calls = calls;
    message
}

async fn seeded_store() -> Arc<InMemoryDocumentStore> {
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .insert_documents(vec![
            document("2024-10001", "Executive Order on Grid Security", "2024-06-03"),
            document("2024-10002", "Executive Order on Border Logistics", "2024-05-20"),
        ])
        .await;
    store
}

fn build_assistant(
    client: Arc<ScriptedClient>,
    store: Arc<InMemoryDocumentStore>,
    chat_log: Arc<MemoryChatLog>,
) -> Assistant {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RegisterSearchTool::new(store.clone())));
    registry.register(Arc::new(RegisterStatsTool::new(store)));
    registry.register(Arc::new(RelatedQueriesTool));
    Assistant::new(client, Arc::new(registry), chat_log)
}

#[tokio::test]
async fn test_direct_answer_skips_tools() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(ChatMessage::assistant(
        "The Federal Register is published every business day.",
    ))]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log.clone());

    let reply = assistant
        .generate_response("What is the Federal Register?", &[], "s-direct")
        .await;

    assert!(reply.content.contains("published every business day"));
    assert!(reply.metadata.tools_used.is_empty());
    assert!(reply.metadata.query_time >= 0.0);
    assert_eq!(client.requests().len(), 1);

    let records = chat_log.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].tools_used.is_empty());
}

#[tokio::test]
async fn test_tool_round_trip_end_to_end() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(tool_call_message(vec![search_call(
            "call-1",
            r#"{"document_type": "executive_order", "limit": 5}"#,
        )])),
        Ok(ChatMessage::assistant(
            "I've found two recent executive orders: 2024-10001 from June 3rd on grid \
             security and 2024-10002 from May 20th on border logistics.",
        )),
    ]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log.clone());

    let reply = assistant
        .generate_response("What are the latest executive orders?", &[], "s-tools")
        .await;

    assert_eq!(reply.metadata.tools_used, vec![SEARCH_TOOL_NAME.to_string()]);
    assert!(reply.metadata.query_time >= 0.0);
    assert!(reply.content.contains("2024-10001"));

    // Two completions: the tool request and the follow-up with results.
    let requests = client.requests();
    assert_eq!(requests.len(), 2);

    // The follow-up carried the assistant's tool-call message plus one
    // tool-response message whose payload is normalized documents.
    let follow_up = &requests[1];
    let tool_message = follow_up
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call-1"))
        .expect("tool response should be in the follow-up conversation");
    let payload: serde_json::Value = serde_json::from_str(&tool_message.content).unwrap();
    assert_eq!(payload[0]["document_type"], "executive_order");

    let records = chat_log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tools_used, vec![SEARCH_TOOL_NAME.to_string()]);
}

#[tokio::test]
async fn test_transport_failure_yields_apology_with_zero_metadata() {
    let client = Arc::new(ScriptedClient::new(vec![Err(CompletionError::Api {
        status: 500,
        body: "internal error".to_string(),
    })]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client, seeded_store().await, chat_log.clone());

    let reply = assistant
        .generate_response("Anything new?", &[], "s-error")
        .await;

    assert!(reply.content.contains("I'm sorry, I encountered an error"));
    assert_eq!(reply.metadata.query_time, 0.0);
    assert!(reply.metadata.tools_used.is_empty());
    // Logged exactly once.
    assert_eq!(chat_log.records().len(), 1);
}

#[tokio::test]
async fn test_empty_result_set_still_reads_as_prose() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(tool_call_message(vec![search_call(
            "call-1",
            r#"{"keywords": "asteroid mining"}"#,
        )])),
        Ok(ChatMessage::assistant(
            "I couldn't find any documents about asteroid mining. You could try \
             broader terms like \"space commerce\" or \"mineral rights\".",
        )),
    ]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log);

    let reply = assistant
        .generate_response("Any rules about asteroid mining?", &[], "s-empty")
        .await;

    // The store returned zero rows but the answer must read as prose.
    assert!(!reply.content.is_empty());
    assert!(!reply.content.contains("[{"));

    let requests = client.requests();
    let tool_message = requests[1]
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call-1"))
        .unwrap();
    assert_eq!(tool_message.content, "[]");
}

#[tokio::test]
async fn test_relative_dates_are_rewritten_before_the_model_sees_them() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(ChatMessage::assistant("ok"))]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log);

    assistant
        .generate_response("Any executive orders from last month?", &[], "s-dates")
        .await;

    let requests = client.requests();
    let user_message = requests[0].last().unwrap();
    assert!(!user_message.content.contains("last month"));
    assert!(user_message.content.contains("from 2"));
}

#[tokio::test]
async fn test_second_round_tool_calls_are_not_dispatched() {
    let mut second = ChatMessage::assistant("Here is what I found.");
    second.tool_calls = vec![search_call("call-2", "{}")];

    let client = Arc::new(ScriptedClient::new(vec![
        Ok(tool_call_message(vec![search_call("call-1", "{}")])),
        Ok(second),
    ]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log);

    let reply = assistant
        .generate_response("Latest orders?", &[], "s-tworounds")
        .await;

    // Exactly two completions; the second round's request is ignored.
    assert_eq!(client.requests().len(), 2);
    assert_eq!(reply.content, "Here is what I found.");
    assert_eq!(reply.metadata.tools_used, vec![SEARCH_TOOL_NAME.to_string()]);
}

#[tokio::test]
async fn test_chat_log_failure_is_not_fatal() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(ChatMessage::assistant(
        "Still here.",
    ))]));
    let store = seeded_store().await;
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RegisterSearchTool::new(store)));
    let assistant = Assistant::new(client, Arc::new(registry), Arc::new(FailingChatLog));

    let reply = assistant.generate_response("Hello?", &[], "s-log").await;
    assert_eq!(reply.content, "Still here.");
}

#[tokio::test]
async fn test_prior_history_is_forwarded() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(ChatMessage::assistant("ok"))]));
    let chat_log = Arc::new(MemoryChatLog::new());
    let assistant = build_assistant(client.clone(), seeded_store().await, chat_log);

    let history = vec![
        ChatMessage::user("What are executive orders?"),
        ChatMessage::assistant("Directives issued by the President."),
    ];
    assistant
        .generate_response("Show me recent ones", &history, "s-history")
        .await;

    let requests = client.requests();
    // System prompt + two history messages + current query.
    assert_eq!(requests[0].len(), 4);
    assert_eq!(requests[0][1].content, "What are executive orders?");
}
