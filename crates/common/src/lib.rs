//! Shared failure taxonomy used across all aosd crates.

pub mod tool_error;

pub use tool_error::{ErrorBody, ToolError};
