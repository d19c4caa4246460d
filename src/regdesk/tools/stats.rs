//! Database statistics tool.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;

use crate::regdesk::document_store::DocumentStore;
use crate::regdesk::tool_protocol::{ToolHandler, ToolMetadata};

/// Name this tool is advertised under.
pub const STATS_TOOL_NAME: &str = "get_database_statistics";

/// Forwards to the store's aggregate statistics and serializes them verbatim.
pub struct RegisterStatsTool {
    store: Arc<dyn DocumentStore>,
}

impl RegisterStatsTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        RegisterStatsTool { store }
    }
}

#[async_trait]
impl ToolHandler for RegisterStatsTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(
            STATS_TOOL_NAME,
            "Get statistics about the Federal Register database",
        )
    }

    async fn execute(
        &self,
        _arguments: JsonValue,
    ) -> Result<JsonValue, Box<dyn Error + Send + Sync>> {
        let stats = self.store.statistics().await?;
        Ok(serde_json::to_value(stats)?)
    }
}
