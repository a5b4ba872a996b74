//! HTTP transport for the tool dispatcher: a unary JSON endpoint, a
//! catalog listing, and an MCP-compatible SSE JSON-RPC endpoint.
//!
//! Authentication, IP allow-listing, and rate limiting all live here at
//! the transport layer; the dispatcher only ever sees a request context.

pub mod auth;
pub mod rpc;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
