//! MCP-compatible JSON-RPC over SSE: one request in, one `data:` frame
//! out, then the stream closes.

use std::{convert::Infallible, sync::Arc};

use {
    axum::{
        extract::State,
        response::{
            sse::{Event, Sse},
            IntoResponse, Response,
        },
    },
    futures::stream,
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::{info, warn},
};

use aosd_tools::{catalog, ContentBlock, RequestContext, ToolCall};

use crate::server::GatewayState;

/// MCP protocol revision advertised by `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

const METHOD_NOT_FOUND: i64 = -32601;
const INTERNAL_ERROR: i64 = -32603;
const PARSE_ERROR: i64 = -32700;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Handle one JSON-RPC frame and reply as a single SSE event.
pub async fn mcp_sse_handler(
    State(state): State<Arc<GatewayState>>,
    body: String,
) -> Response {
    let response = match serde_json::from_str::<RpcRequest>(&body) {
        Ok(request) => {
            let id = request.id.clone();
            match dispatch(&state, request).await {
                Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                Err((code, message)) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": code, "message": message },
                }),
            }
        },
        Err(err) => {
            warn!(error = %err, "unparseable JSON-RPC body");
            json!({
                "jsonrpc": "2.0",
                "id": Value::Null,
                "error": { "code": PARSE_ERROR, "message": format!("Parse error: {err}") },
            })
        },
    };

    sse_single_frame(response)
}

async fn dispatch(
    state: &GatewayState,
    request: RpcRequest,
) -> Result<Value, (i64, String)> {
    match request.method.as_str() {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "aosd",
                "version": env!("CARGO_PKG_VERSION"),
                "vendor": "Alcatel-Lucent Enterprise",
            },
            "capabilities": { "tools": {} },
        })),

        "tools/list" => {
            // MCP clients expect camelCase schema keys.
            let tools = catalog::tool_infos()
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "inputSchema": t.input_schema,
                    })
                })
                .collect::<Vec<_>>();
            Ok(json!({ "tools": tools }))
        },

        "tools/call" => {
            let name = request
                .params
                .get("name")
                .and_then(Value::as_str)
                .ok_or((INTERNAL_ERROR, "missing tool name".to_string()))?
                .to_string();
            let args = request.params.get("arguments").cloned().unwrap_or(json!({}));
            let meta = request.params.get("_meta").cloned().unwrap_or(Value::Null);

            let context = RequestContext {
                subject: meta
                    .get("subject")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                correlation_id: meta
                    .get("requestId")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ..RequestContext::default()
            };

            info!(tool = %name, subject = context.subject.as_deref().unwrap_or("anonymous"), "MCP tool call");

            let result = state
                .service
                .call(ToolCall {
                    context,
                    tool: name.clone(),
                    args,
                })
                .await;

            if result.status == "ok" {
                let content = match result.content {
                    Some(blocks) => blocks,
                    None => fallback_content(result.data.as_ref()),
                };
                Ok(json!({ "content": content, "isError": false }))
            } else {
                let message = result
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "unknown error".into());
                Ok(json!({
                    "content": [ContentBlock::text(format!("Error executing {name}: {message}"))],
                    "isError": true,
                }))
            }
        },

        other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
    }
}

/// Content fallback for tools that produced no display blocks: stdout if
/// present, otherwise the whole data object as pretty JSON.
fn fallback_content(data: Option<&Value>) -> Vec<ContentBlock> {
    match data {
        Some(data) => {
            if let Some(stdout) = data.get("stdout").and_then(Value::as_str) {
                vec![ContentBlock::text(stdout)]
            } else {
                vec![ContentBlock::text(
                    serde_json::to_string_pretty(data).unwrap_or_default(),
                )]
            }
        },
        None => Vec::new(),
    }
}

/// Serialize one JSON-RPC response as a single SSE frame with proxy
/// buffering disabled.
fn sse_single_frame(response: Value) -> Response {
    let payload = response.to_string();
    let stream = stream::once(async move { Ok::<_, Infallible>(Event::default().data(payload)) });

    let mut response = Sse::new(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        axum::http::HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        "X-Accel-Buffering",
        axum::http::HeaderValue::from_static("no"),
    );
    response
}
