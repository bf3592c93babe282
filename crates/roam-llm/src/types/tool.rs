use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Function name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: Value,
}

/// Model request to run a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider call id; synthesised for providers that do not assign one
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments keyed by parameter name
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Build an invocation with a fresh call id
    ///
    /// Non-object argument values are wrapped as `{"value": ...}`.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, arguments)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("value".to_owned(), other)]),
        };

        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was invoked
    pub tool_name: String,
    /// Id of the invocation this answers
    pub call_id: String,
    /// Return value, or `{"error": "..."}`
    pub result: Value,
}

impl ToolResult {
    pub fn ok(invocation: &ToolInvocation, result: Value) -> Self {
        Self {
            tool_name: invocation.name.clone(),
            call_id: invocation.id.clone(),
            result,
        }
    }

    pub fn error(invocation: &ToolInvocation, message: impl Into<String>) -> Self {
        Self::ok(invocation, serde_json::json!({ "error": message.into() }))
    }

    pub fn is_error(&self) -> bool {
        self.result.get("error").is_some()
    }

    /// Result as a JSON object, wrapping scalars as `{"result": ...}`
    pub fn as_object(&self) -> Value {
        match &self.result {
            Value::Object(_) => self.result.clone(),
            other => serde_json::json!({ "result": other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalar_arguments_are_wrapped() {
        let invocation = ToolInvocation::new("echo", json!("hello"));
        assert_eq!(invocation.arguments["value"], "hello");
        assert!(!invocation.id.is_empty());
    }

    #[test]
    fn null_arguments_become_empty_map() {
        assert!(ToolInvocation::new("noop", Value::Null).arguments.is_empty());
    }

    #[test]
    fn error_results_are_flagged() {
        let invocation = ToolInvocation::with_id("call-1", "missing", json!({}));
        let result = ToolResult::error(&invocation, "unknown tool");
        assert!(result.is_error());
        assert_eq!(result.call_id, "call-1");
        assert_eq!(result.result, json!({"error": "unknown tool"}));
    }

    #[test]
    fn scalar_results_are_wrapped_as_objects() {
        let invocation = ToolInvocation::with_id("call-2", "count", json!({}));
        assert_eq!(ToolResult::ok(&invocation, json!(3)).as_object(), json!({"result": 3}));
    }
}
