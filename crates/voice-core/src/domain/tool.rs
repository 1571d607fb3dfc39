//! Tool (function-calling) domain types.
//!
//! Field-for-field grounded in `app/domain/models/tool_models.py`
//! (`ToolDefinition`/`ToolRequest`/`ToolResponse`), renamed to the
//! `json_schema`/`ok`/`elapsed_ms` spelling this crate uses throughout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub json_schema: Value,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolDefinition {
    /// Renders this definition in the OpenAI/Groq function-calling tool format.
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": self.json_schema,
                    "required": self.required,
                }
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    pub args: Value,
    #[serde(default)]
    pub trace_id: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool: String,
    pub result: Option<Value>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub elapsed_ms: f64,
    #[serde(default)]
    pub trace_id: String,
}

impl ToolResponse {
    pub fn success(tool: impl Into<String>, result: Value, elapsed_ms: f64, trace_id: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            result: Some(result),
            ok: true,
            error: None,
            elapsed_ms,
            trace_id: trace_id.into(),
        }
    }

    pub fn failure(tool: impl Into<String>, error: impl Into<String>, elapsed_ms: f64, trace_id: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            result: None,
            ok: false,
            error: Some(error.into()),
            elapsed_ms,
            trace_id: trace_id.into(),
        }
    }

    /// Serialized form the LLM processor appends as a `tool` role message.
    pub fn to_tool_message_content(&self) -> String {
        if self.ok {
            self.result.clone().unwrap_or(Value::Null).to_string()
        } else {
            serde_json::json!({ "error": self.error }).to_string()
        }
    }
}
