//! Interactive Federal Register Chat
//!
//! Runs a terminal chat loop against a locally hosted Ollama model with a
//! small seeded document corpus. It showcases:
//!
//! - **Tool-calling turns**: the model searches the store, gets statistics,
//!   and suggests follow-up queries through the registered tools
//! - **JSON argument repair**: malformed tool arguments from small models are
//!   normalized before dispatch
//! - **Turn metadata**: every answer prints its wall-clock time and the tools
//!   the model invoked
//!
//! Point `OLLAMA_URL` / `OLLAMA_MODEL` at your deployment, or rely on the
//! defaults (`http://localhost:11434`, a small instruct model).
//!
//! Run with: `cargo run --example register_chat`

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::NaiveDate;
use regdesk::clients::ollama::OllamaClient;
use regdesk::tools::{RegisterSearchTool, RegisterStatsTool, RelatedQueriesTool};
use regdesk::{
    Assistant, AssistantConfig, ChatMessage, Document, InMemoryDocumentStore, MemoryChatLog,
    ToolRegistry,
};

fn seed_document(number: &str, title: &str, date: &str, abstract_text: &str) -> Document {
    Document {
        document_number: number.to_string(),
        title: title.to_string(),
        publication_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid seed date"),
        document_type: None,
        abstract_text: Some(abstract_text.to_string()),
        html_url: None,
        pdf_url: None,
    }
}

#[tokio::main]
async fn main() {
    regdesk::init_logger();

    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .insert_documents(vec![
            seed_document(
                "2024-11001",
                "Executive Order on Artificial Intelligence Safety",
                "2024-06-14",
                "Directs agencies to establish testing standards for frontier AI systems.",
            ),
            seed_document(
                "2024-11002",
                "Proposed Rule on Methane Emissions Reporting",
                "2024-05-30",
                "Would require quarterly methane disclosures from large operators.",
            ),
            seed_document(
                "2024-11003",
                "Notice of Public Hearing on Grid Reliability",
                "2024-06-02",
                "Announces hearings on transmission planning and climate resilience.",
            ),
        ])
        .await;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RegisterSearchTool::new(store.clone())));
    registry.register(Arc::new(RegisterStatsTool::new(store)));
    registry.register(Arc::new(RelatedQueriesTool));

    let assistant = Assistant::new(
        Arc::new(OllamaClient::new(AssistantConfig::from_env())),
        Arc::new(registry),
        Arc::new(MemoryChatLog::new()),
    );

    println!("Federal Register assistant (empty line to quit)");
    let mut history: Vec<ChatMessage> = Vec::new();
    let stdin = io::stdin();

    loop {
        print!("you> ");
        io::stdout().flush().expect("flush stdout");

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).expect("read stdin") == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }

        let reply = assistant.generate_response(query, &history, "demo").await;
        println!("assistant> {}", reply.content);
        println!(
            "           ({:.2}s, tools: {:?})",
            reply.metadata.query_time, reply.metadata.tools_used
        );

        history.push(ChatMessage::user(query));
        history.push(ChatMessage::assistant(reply.content));
    }
}
