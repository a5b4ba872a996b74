//! The tool catalog and dispatcher.
//!
//! Every tool is a pure orchestrator: validate arguments, build a
//! transient device, sanitize each command through the policy, execute via
//! the command runner, parse, aggregate, and return a typed result.
//! Handler modules mirror the catalog families.

pub mod catalog;
pub mod service;
pub mod template;
pub mod types;

mod audit;
mod cli;
mod device;
mod diag;
mod network;
mod system;

pub use {
    catalog::{tool_infos, ListMode},
    service::{ToolOutput, ToolService},
    types::{ContentBlock, RequestContext, ToolCall, ToolInfo, ToolResult},
};
