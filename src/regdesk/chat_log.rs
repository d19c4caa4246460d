//! Chat-history collaborator.
//!
//! Every completed turn is recorded (query, final response, tools invoked) for
//! later inspection. Logging failures are reported through `log::warn!` by the
//! orchestrator and never fail the turn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::sync::Mutex;
use uuid::Uuid;

/// One logged turn.
#[derive(Clone, Debug)]
pub struct ChatRecord {
    pub id: Uuid,
    pub session_id: String,
    pub query: String,
    pub response: String,
    pub tools_used: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Collaborator that persists completed turns.
#[async_trait]
pub trait ChatHistoryLog: Send + Sync {
    /// Record one turn for `session_id`.
    async fn record(
        &self,
        session_id: &str,
        query: &str,
        response: &str,
        tools_used: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// In-memory [`ChatHistoryLog`] used by tests and small deployments.
pub struct MemoryChatLog {
    records: Mutex<Vec<ChatRecord>>,
}

impl MemoryChatLog {
    pub fn new() -> Self {
        MemoryChatLog {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<ChatRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MemoryChatLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatHistoryLog for MemoryChatLog {
    async fn record(
        &self,
        session_id: &str,
        query: &str,
        response: &str,
        tools_used: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut records = self.records.lock().unwrap();
        records.push(ChatRecord {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
            tools_used: tools_used.to_vec(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_accumulate() {
        let chat_log = MemoryChatLog::new();
        chat_log
            .record("s1", "hello", "hi there", &[])
            .await
            .unwrap();
        chat_log
            .record(
                "s1",
                "latest orders?",
                "Here they are.",
                &["query_federal_register".to_string()],
            )
            .await
            .unwrap();

        let records = chat_log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tools_used, vec!["query_federal_register"]);
        assert_ne!(records[0].id, records[1].id);
    }
}
