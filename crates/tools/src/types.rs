//! Wire types shared by the transports and the dispatcher.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use aosd_common::{ErrorBody, ToolError};

/// Caller-provided request context. Used only for audit logging; it
/// carries no authorization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    /// User identifier (email, username) for audit logging.
    pub subject: Option<String>,
    /// Environment tag (e.g. TEST, PROD) for audit logging.
    pub environment: Option<String>,
    /// Request tracing id.
    pub correlation_id: Option<String>,
    /// Client application identifier.
    pub client: Option<String>,
}

/// One tool invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub context: RequestContext,
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

/// A display block for LLM/human rendering. Always redundant with `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub r#type: String,
    pub text: String,
}

impl ContentBlock {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            r#type: "text".into(),
            text: text.into(),
        }
    }
}

/// Result envelope returned for every tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub status: &'static str,
    pub data: Option<Value>,
    pub content: Option<Vec<ContentBlock>>,
    pub warnings: Vec<String>,
    pub error: Option<ErrorBody>,
    pub meta: Value,
}

impl ToolResult {
    #[must_use]
    pub fn ok(tool: &str, data: Value, content: Vec<ContentBlock>) -> Self {
        Self {
            status: "ok",
            data: Some(data),
            content: (!content.is_empty()).then_some(content),
            warnings: Vec::new(),
            error: None,
            meta: serde_json::json!({ "tool": tool }),
        }
    }

    #[must_use]
    pub fn error(tool: &str, err: &ToolError) -> Self {
        Self {
            status: "error",
            data: None,
            content: None,
            warnings: Vec::new(),
            error: Some(err.body()),
            meta: serde_json::json!({ "tool": tool }),
        }
    }
}

/// Catalog entry for one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub output_schema: Value,
    pub required_scopes: Vec<String>,
}
