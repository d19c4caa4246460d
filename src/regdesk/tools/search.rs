//! Document search tool.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;

use crate::regdesk::document_store::{
    standardize_document_type, DocumentQuery, DocumentStore, DEFAULT_QUERY_LIMIT,
};
use crate::regdesk::tool_protocol::{
    ToolHandler, ToolMetadata, ToolParameter, ToolParameterType,
};

/// Name this tool is advertised under.
pub const SEARCH_TOOL_NAME: &str = "query_federal_register";

/// Searches the document store and returns normalized results.
///
/// Every returned document carries a standardized `document_type`: null or
/// unspecified values are inferred from the title so the model never sees a
/// classification hole.
pub struct RegisterSearchTool {
    store: Arc<dyn DocumentStore>,
}

impl RegisterSearchTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        RegisterSearchTool { store }
    }
}

#[async_trait]
impl ToolHandler for RegisterSearchTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(
            SEARCH_TOOL_NAME,
            "Search the Federal Register database for documents matching specific criteria",
        )
        .with_parameter(
            ToolParameter::new("keywords", ToolParameterType::String)
                .with_description("Keywords to search for in titles and abstracts"),
        )
        .with_parameter(
            ToolParameter::new("document_type", ToolParameterType::String).with_description(
                "Type of document (e.g., 'executive_order', 'notice', 'rule', \
                 'proposed_rule', 'presidential_document')",
            ),
        )
        .with_parameter(
            ToolParameter::new("start_date", ToolParameterType::String)
                .with_description("Start date in YYYY-MM-DD format"),
        )
        .with_parameter(
            ToolParameter::new("end_date", ToolParameterType::String)
                .with_description("End date in YYYY-MM-DD format"),
        )
        .with_parameter(
            ToolParameter::new("limit", ToolParameterType::Integer)
                .with_description("Maximum number of results to return")
                .with_default(serde_json::json!(DEFAULT_QUERY_LIMIT)),
        )
    }

    async fn execute(
        &self,
        arguments: JsonValue,
    ) -> Result<JsonValue, Box<dyn Error + Send + Sync>> {
        let mut query = DocumentQuery::new();
        query.keywords = string_arg(&arguments, "keywords");
        query.document_type = string_arg(&arguments, "document_type");
        query.start_date = date_arg(&arguments, "start_date");
        query.end_date = date_arg(&arguments, "end_date");
        if let Some(limit) = arguments.get("limit").and_then(|v| v.as_u64()) {
            query.limit = limit as usize;
        }

        let mut documents = self.store.query(&query).await?;
        for doc in &mut documents {
            doc.document_type = Some(standardize_document_type(
                doc.document_type.as_deref(),
                &doc.title,
            ));
        }

        Ok(serde_json::to_value(documents)?)
    }
}

fn string_arg(arguments: &JsonValue, name: &str) -> Option<String> {
    arguments
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn date_arg(arguments: &JsonValue, name: &str) -> Option<NaiveDate> {
    let raw = arguments.get(name).and_then(|v| v.as_str())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::warn!("Ignoring malformed {} in search arguments: {}", name, raw);
            None
        }
    }
}
