//! Failure taxonomy surfaced to tool callers.
//!
//! Every failure leaving the dispatcher is one of these variants; the
//! string codes are part of the wire contract and must stay stable.

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// A tool-level failure, mapped to a stable `code` on the wire.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidCommand(String),

    #[error("{0}")]
    NotAuthorized(String),

    #[error("{0}")]
    Ssh(String),

    /// The public message is fixed; the real cause goes to the log only.
    #[error("Internal server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ToolError {
    #[must_use]
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(Box::new(source))
    }

    /// Stable wire code for this failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidCommand(_) => "invalid_command",
            Self::NotAuthorized(_) => "not_authorized",
            Self::Ssh(_) => "ssh_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Serializable form for the `error` field of a tool result.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            details: None,
        }
    }
}

/// Wire representation of a tool failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ToolError::UnknownTool("x".into()).code(), "unknown_tool");
        assert_eq!(ToolError::InvalidRequest("x".into()).code(), "invalid_request");
        assert_eq!(ToolError::InvalidCommand("x".into()).code(), "invalid_command");
        assert_eq!(ToolError::Ssh("x".into()).code(), "ssh_error");
    }

    #[test]
    fn internal_message_is_generic() {
        let err = ToolError::internal(std::io::Error::other("secret detail"));
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn body_round_trips() {
        let body = ToolError::Ssh("connect failed".into()).body();
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["code"], "ssh_error");
        assert_eq!(json["message"], "connect failed");
        assert!(json.get("details").is_none());
    }
}
