//! Tool registry and function-calling dispatcher.
//!
//! This module maps tool names onto capability-typed handler objects and turns
//! a batch of model-requested tool calls into tool-response messages. Adding a
//! tool means registering another [`ToolHandler`]; the dispatcher's control
//! flow never changes.
//!
//! # Architecture
//!
//! ```text
//! Assistant → ToolRegistry → ToolHandler (trait) → [search | stats | suggest | user-defined]
//! ```
//!
//! Argument payloads arrive as raw, untrusted model output. Each call's
//! arguments pass through [`json_repair`](crate::json_repair) before decoding;
//! a payload that still does not parse falls back to an empty argument object
//! and the call proceeds. Handler failures and unknown tool names become
//! structured `{error, message}` payloads fed back to the model as ordinary
//! tool results, so one bad call never aborts the batch.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::regdesk::client_wrapper::{ChatMessage, FunctionSpec, ToolCall, ToolDefinition};
use crate::regdesk::json_repair;

/// Defines the type of a tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ToolParameterType {
    fn schema_name(&self) -> &'static str {
        match self {
            ToolParameterType::String => "string",
            ToolParameterType::Number => "number",
            ToolParameterType::Integer => "integer",
            ToolParameterType::Boolean => "boolean",
            ToolParameterType::Array => "array",
            ToolParameterType::Object => "object",
        }
    }
}

/// Defines a parameter for a tool.
#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<JsonValue>,
}

impl ToolParameter {
    /// Define a new tool parameter with the provided name and type.
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
            default: None,
        }
    }

    /// Add a human readable description that will surface in generated schemas.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Provide a default value that will be used when the model omits the parameter.
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Metadata about a tool.
#[derive(Debug, Clone)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// Create metadata with the supplied identifier and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter definition to the tool metadata.
    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render the wire-level definition advertised to the model.
    pub fn definition(&self) -> ToolDefinition {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut spec = serde_json::Map::new();
            spec.insert(
                "type".to_string(),
                JsonValue::String(param.param_type.schema_name().to_string()),
            );
            if let Some(description) = &param.description {
                spec.insert(
                    "description".to_string(),
                    JsonValue::String(description.clone()),
                );
            }
            if let Some(default) = &param.default {
                spec.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), JsonValue::Object(spec));
            if param.required {
                required.push(JsonValue::String(param.name.clone()));
            }
        }

        ToolDefinition {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }
}

/// Trait implemented by every tool the assistant can invoke.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Static descriptor advertised to the model.
    fn metadata(&self) -> ToolMetadata;

    /// Execute the tool against decoded arguments and return the payload that
    /// will be serialized into the tool-response message.
    async fn execute(
        &self,
        arguments: JsonValue,
    ) -> Result<JsonValue, Box<dyn Error + Send + Sync>>;
}

/// Error types for tool operations.
#[derive(Debug, Clone)]
pub enum ToolError {
    /// Requested tool is not registered.
    NotFound(String),
    /// Tool execution completed with an application level failure.
    ExecutionFailed(String),
    /// The provided JSON parameters failed validation or deserialization.
    InvalidParameters(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "Tool not found: {}", name),
            ToolError::ExecutionFailed(msg) => write!(f, "Tool execution failed: {}", msg),
            ToolError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
        }
    }
}

impl Error for ToolError {}

/// Registry for the tools available to the assistant, plus the dispatcher
/// that executes model-requested calls against them.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    /// Registration order, so advertised definitions stay stable run to run.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert or replace a handler under the name its metadata declares.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.metadata().name;
        if !self.handlers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.handlers.insert(name, handler);
    }

    /// Borrow a handler by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Wire-level definitions for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|handler| handler.metadata().definition())
            .collect()
    }

    /// Execute a named tool with already-decoded parameters.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: JsonValue,
    ) -> Result<JsonValue, Box<dyn Error + Send + Sync>> {
        let handler = self
            .handlers
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;
        handler.execute(parameters).await
    }

    /// Execute a batch of model-requested tool calls.
    ///
    /// Returns exactly one tool-response message per input call, in input
    /// order, each echoing its call's id. Unknown tool names and handler
    /// failures produce error payloads rather than shortening the output —
    /// the model decides how to communicate the issue to the user.
    pub async fn execute_calls(&self, calls: &[ToolCall]) -> Vec<ChatMessage> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let name = &call.function.name;

            let repaired = json_repair::repair(&call.function.arguments);
            let arguments: JsonValue = match serde_json::from_str(&repaired) {
                Ok(value) => value,
                Err(err) => {
                    log::error!(
                        "JSON parse error in arguments: {}, raw: {}",
                        err,
                        call.function.arguments
                    );
                    serde_json::json!({})
                }
            };

            let content = match self.handlers.get(name) {
                Some(handler) => match handler.execute(arguments).await {
                    Ok(payload) => serde_json::to_string(&payload)
                        .unwrap_or_else(|_| "{}".to_string()),
                    Err(err) => {
                        log::error!("Error executing tool {}: {}", name, err);
                        error_payload(
                            &err.to_string(),
                            "I encountered an issue when searching the database. \
                             Let me try a different approach.",
                        )
                    }
                },
                None => {
                    log::error!("Model requested unknown tool: {}", name);
                    error_payload(
                        "unknown_tool",
                        &format!("No tool named '{}' is available.", name),
                    )
                }
            };

            results.push(ChatMessage::tool_response(
                call.id.clone(),
                name.clone(),
                content,
            ));
        }

        results
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn error_payload(error: &str, message: &str) -> String {
    serde_json::json!({ "error": error, "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regdesk::client_wrapper::ToolCallFunction;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata::new("echo", "Echo the arguments back").with_parameter(
                ToolParameter::new("text", ToolParameterType::String)
                    .with_description("Text to echo")
                    .required(),
            )
        }

        async fn execute(
            &self,
            arguments: JsonValue,
        ) -> Result<JsonValue, Box<dyn Error + Send + Sync>> {
            Ok(serde_json::json!({ "echoed": arguments }))
        }
    }

    fn call(name: &str, id: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: Some(id.to_string()),
            function: ToolCallFunction {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[test]
    fn test_definition_schema_shape() {
        let definition = EchoTool.metadata().definition();
        assert_eq!(definition.kind, "function");
        assert_eq!(definition.function.name, "echo");
        assert_eq!(
            definition.function.parameters["properties"]["text"]["type"],
            "string"
        );
        assert_eq!(definition.function.parameters["required"][0], "text");
    }

    #[tokio::test]
    async fn test_dispatch_repairs_malformed_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let results = registry
            .execute_calls(&[call("echo", "call-1", "{text: 'hello',}")])
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_call_id.as_deref(), Some("call-1"));

        let payload: JsonValue = serde_json::from_str(&results[0].content).unwrap();
        assert_eq!(payload["echoed"]["text"], "hello");
    }

    #[tokio::test]
    async fn test_dispatch_falls_back_to_empty_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let results = registry
            .execute_calls(&[call("echo", "call-2", "{\"text\": \"trunc")])
            .await;
        let payload: JsonValue = serde_json::from_str(&results[0].content).unwrap();
        assert_eq!(payload["echoed"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_unknown_tool_keeps_one_result_per_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let results = registry
            .execute_calls(&[
                call("echo", "call-3", "{}"),
                call("no_such_tool", "call-4", "{}"),
            ])
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].tool_call_id.as_deref(), Some("call-4"));

        let payload: JsonValue = serde_json::from_str(&results[1].content).unwrap();
        assert_eq!(payload["error"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_execute_tool_reports_not_found() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute_tool("missing", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Tool not found"));
    }
}
