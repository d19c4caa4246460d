//! Related-query suggestion tool.
//!
//! Purely heuristic, not model-driven: a static lookup keyed by substring
//! match on the current query text. Deterministic output keeps the follow-up
//! chips in a chat UI stable across identical queries.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::error::Error;

use crate::regdesk::tool_protocol::{
    ToolHandler, ToolMetadata, ToolParameter, ToolParameterType,
};

/// Name this tool is advertised under.
pub const SUGGEST_TOOL_NAME: &str = "suggest_related_queries";

/// Suggests related queries based on the current one.
pub struct RelatedQueriesTool;

/// Static lookup behind the tool: "executive" queries get order-focused
/// follow-ups, "climate" queries get climate-focused ones, everything else
/// gets a generic default triple.
pub fn suggestions_for(current_query: &str) -> Vec<&'static str> {
    let query = current_query.to_lowercase();
    if query.contains("executive") {
        vec![
            "What are the most recent executive orders?",
            "Show me executive orders related to healthcare",
            "How many executive orders were issued last month?",
        ]
    } else if query.contains("climate") {
        vec![
            "What regulations mention climate change?",
            "Are there any recent rules about carbon emissions?",
            "Show me climate policies from the EPA",
        ]
    } else {
        vec![
            "What are the latest executive orders?",
            "Show me recent healthcare regulations",
            "Find documents related to immigration policy",
        ]
    }
}

#[async_trait]
impl ToolHandler for RelatedQueriesTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new(
            SUGGEST_TOOL_NAME,
            "Generate suggestions for related queries based on the current query",
        )
        .with_parameter(
            ToolParameter::new("current_query", ToolParameterType::String)
                .with_description("The current user query")
                .required(),
        )
    }

    async fn execute(
        &self,
        arguments: JsonValue,
    ) -> Result<JsonValue, Box<dyn Error + Send + Sync>> {
        let current_query = arguments
            .get("current_query")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        Ok(serde_json::json!({ "suggestions": suggestions_for(current_query) }))
    }
}
