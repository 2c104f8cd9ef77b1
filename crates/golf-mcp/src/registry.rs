//! Tool registry trait for MCP servers.
//!
//! This module defines the `ToolRegistry` trait that abstracts over tool
//! registration and dispatch, and [`ComponentTools`], the registry built
//! from a manifest's tools.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use golf_core::ComponentCategory;
use rmcp::model::{CallToolResult, Content, ErrorData, Tool};
use serde_json::{Map, Value};

use crate::dispatch::{prepare_arguments, Dispatcher};
use crate::manifest::ComponentEntry;

/// Type alias for async tool handler results.
pub type ToolResult = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;

/// Trait for registering and dispatching MCP tools.
pub trait ToolRegistry: Send + Sync {
    /// Returns information about all available tools.
    fn tools(&self) -> Vec<Tool>;

    /// Dispatches a tool call by name.
    ///
    /// Returns `None` if the tool is not recognized by this registry.
    fn call(&self, name: &str, args: Value) -> Option<ToolResult>;

    /// Returns the number of registered tools.
    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    /// Check if a tool exists by name.
    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}

fn json_schema(value: &Value) -> Arc<Map<String, Value>> {
    match value {
        Value::Object(map) => Arc::new(map.clone()),
        _ => Arc::new(Map::new()),
    }
}

/// MCP tool definition advertised for a component.
pub fn tool_definition(entry: &ComponentEntry) -> Tool {
    let mut tool = Tool::new_with_raw(
        entry.id.clone(),
        (!entry.description.is_empty()).then(|| entry.description.clone().into()),
        json_schema(&entry.input_schema),
    );
    tool.output_schema = entry.output_schema.as_ref().map(json_schema);
    tool
}

fn tool_result(value: Value, structured: bool) -> Result<CallToolResult, ErrorData> {
    let text = match &value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?,
    };
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    if structured && value.is_object() {
        result.structured_content = Some(value);
    }
    Ok(result)
}

/// The tools of a composed server.
///
/// Calls are validated against each tool's parameters, literal defaults
/// are filled in, and failures raised by the entry point come back as
/// error results rather than protocol errors.
pub struct ComponentTools {
    entries: Vec<Arc<ComponentEntry>>,
    dispatcher: Arc<Dispatcher>,
}

impl ComponentTools {
    pub(crate) fn new(entries: &[ComponentEntry], dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            entries: entries.iter().cloned().map(Arc::new).collect(),
            dispatcher,
        }
    }

    fn entry(&self, name: &str) -> Option<&Arc<ComponentEntry>> {
        self.entries.iter().find(|e| e.id == name)
    }
}

impl ToolRegistry for ComponentTools {
    fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| tool_definition(e)).collect()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let entry = Arc::clone(self.entry(name)?);
        let dispatcher = Arc::clone(&self.dispatcher);
        Some(Box::pin(async move {
            let arguments = prepare_arguments(ComponentCategory::Tool, &entry, args)?;
            let structured = entry.output_schema.is_some();
            match dispatcher
                .dispatch(ComponentCategory::Tool, entry, arguments)
                .await
            {
                Ok(value) => tool_result(value, structured),
                Err(e) => Ok(CallToolResult::error(vec![Content::text(e.message)])),
            }
        }))
    }

    fn tool_count(&self) -> usize {
        self.entries.len()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InvocationError;
    use crate::invoker::{Invocation, InvokeFuture};
    use golf_compiler::{DefaultValue, EntryPoint, Parameter};
    use rmcp::model::ErrorCode;
    use serde_json::json;
    use std::path::PathBuf;

    fn hello() -> ComponentEntry {
        ComponentEntry {
            id: "hello".into(),
            description: "Hello World tool".into(),
            parameters: vec![Parameter {
                name: "name".into(),
                schema: json!({"type": "string"}),
                required: false,
                default: Some(DefaultValue::Literal(json!("World"))),
                description: None,
            }],
            input_schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string", "default": "World"}},
            }),
            output_schema: Some(json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"],
            })),
            entry_point: EntryPoint {
                module: "tools.hello".into(),
                symbol: "hello".into(),
                source: PathBuf::from("tools/hello.py"),
                is_async: false,
                line: 10,
            },
            uri: None,
            shared_module: None,
        }
    }

    fn fails() -> ComponentEntry {
        ComponentEntry {
            id: "fails".into(),
            description: String::new(),
            parameters: vec![Parameter {
                name: "x".into(),
                schema: json!({"type": "integer"}),
                required: true,
                default: None,
                description: None,
            }],
            input_schema: json!({"type": "object"}),
            output_schema: None,
            ..hello()
        }
    }

    fn registry() -> ComponentTools {
        let invoker = |call: Invocation| -> InvokeFuture {
            Box::pin(async move {
                match call.id.as_str() {
                    "hello" => Ok(json!({"message": format!("Hello, {}!", call.arguments["name"].as_str().unwrap())})),
                    _ => Err(InvocationError::new("always fails")),
                }
            })
        };
        ComponentTools::new(
            &[hello(), fails()],
            Arc::new(Dispatcher::new(Arc::new(invoker), false)),
        )
    }

    #[test]
    fn test_tool_definitions() {
        let tools = registry().tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "hello");
        assert_eq!(tools[0].description.as_deref(), Some("Hello World tool"));
        assert_eq!(tools[0].input_schema["type"], "object");
        assert!(tools[0].output_schema.is_some());
        assert!(tools[1].description.is_none());
    }

    #[test]
    fn test_has_tool() {
        let registry = registry();
        assert_eq!(registry.tool_count(), 2);
        assert!(registry.has_tool("hello"));
        assert!(!registry.has_tool("missing"));
        assert!(registry.call("missing", json!({})).is_none());
    }

    #[tokio::test]
    async fn test_call_fills_default() {
        let result = registry().call("hello", json!({})).unwrap().await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(
            result.structured_content,
            Some(json!({"message": "Hello, World!"}))
        );
    }

    #[tokio::test]
    async fn test_entry_point_failure_is_error_result() {
        let result = registry()
            .call("fails", json!({"x": 1}))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_missing_required_is_invalid_params() {
        let err = registry().call("fails", json!({})).unwrap().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn ToolRegistry) {}
    }
}
