//! Transport-layer tests: routing, the auth gate, list modes, and the SSE
//! JSON-RPC endpoint. The dispatcher runs against a scripted runner, so no
//! network is involved.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
        Router,
    },
    serde_json::{json, Value},
    tower::ServiceExt,
};

use {
    aosd_config::AosdConfig,
    aosd_gateway::{build_router, GatewayState},
    aosd_ssh::{CommandResult, CommandRunner, Device, SshError},
    aosd_tools::ToolService,
};

#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        _device: &Device,
        command: &str,
        _timeout: Option<Duration>,
    ) -> Result<CommandResult, SshError> {
        self.calls.lock().expect("lock").push(command.to_string());
        Ok(CommandResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_status: Some(0),
            duration_ms: 1,
            truncated: false,
        })
    }
}

fn router_with(cfg: AosdConfig) -> (Router, Arc<RecordingRunner>) {
    let runner = Arc::new(RecordingRunner::default());
    let service = ToolService::new(&cfg, runner.clone()).expect("service");
    let state = Arc::new(GatewayState::new(&cfg, service).expect("state"));
    (build_router(state), runner)
}

fn config_with_server(server_yaml: &str) -> AosdConfig {
    serde_yaml::from_str(&format!("server:\n{server_yaml}")).expect("config")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_is_public() {
    let (router, _) = router_with(AosdConfig::default());
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_api_key_is_unauthorized() {
    let cfg = config_with_server("  api_key: sekrit");
    let (router, _) = router_with(cfg);

    let response = router
        .clone()
        .oneshot(post_json("/v1/tools/list", &json!({})))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Bearer form.
    let mut request = post_json("/v1/tools/list", &json!({}));
    request
        .headers_mut()
        .insert("authorization", "Bearer sekrit".parse().expect("header"));
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Shared-header form.
    let mut request = post_json("/v1/tools/list", &json!({}));
    request
        .headers_mut()
        .insert("x-internal-api-key", "sekrit".parse().expect("header"));
    let response = router.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cidr_allow_list_blocks_outside_clients() {
    let cfg = config_with_server("  allowed_ips: ['10.0.0.0/8']");
    let (router, _) = router_with(cfg);

    let mut request = post_json("/v1/tools/list", &json!({}));
    request.extensions_mut().insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 4444))));
    let response = router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut request = post_json("/v1/tools/list", &json!({}));
    request.extensions_mut().insert(ConnectInfo(SocketAddr::from(([10, 9, 19, 1], 4444))));
    let response = router.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_modes_shrink() {
    let (router, _) = router_with(AosdConfig::default());

    let full = body_json(
        router
            .clone()
            .oneshot(post_json("/v1/tools/list", &json!({})))
            .await
            .expect("response"),
    )
    .await;
    assert!(full["tools"][0].get("input_schema").is_some());

    let ultra = body_json(
        router
            .oneshot(post_json("/v1/tools/list?mode=ultra_compact", &json!({})))
            .await
            .expect("response"),
    )
    .await;
    assert!(ultra["tools"][0].is_string());
    assert_eq!(ultra["tools"].as_array().expect("tools").len(), 20);
}

// S6: when authz context is required, a subject-less call never reaches
// the dispatcher.
#[tokio::test]
async fn missing_subject_is_rejected_before_dispatch() {
    let cfg = config_with_server("  require_authz_context: true");
    let (router, runner) = router_with(cfg);

    let body = json!({
        "context": {},
        "tool": "aos.device.facts",
        "args": { "host": "10.0.0.1" },
    });
    let response = router
        .clone()
        .oneshot(post_json("/v1/tools/call", &body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(runner.calls.lock().expect("lock").is_empty());

    // With a subject the call goes through (and returns a tool-level result).
    let body = json!({
        "context": { "subject": "ops@example.net" },
        "tool": "aos.device.facts",
        "args": { "host": "10.0.0.1" },
    });
    let response = router
        .oneshot(post_json("/v1/tools/call", &body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tool_level_errors_keep_http_200() {
    let (router, _) = router_with(AosdConfig::default());

    let body = json!({
        "context": {},
        "tool": "aos.not.real",
        "args": {},
    });
    let response = router
        .oneshot(post_json("/v1/tools/call", &body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await;
    assert_eq!(result["status"], "error");
    assert_eq!(result["error"]["code"], "unknown_tool");
    assert_eq!(result["meta"]["tool"], "aos.not.real");
    assert!(result["data"].is_null());
}

#[tokio::test]
async fn sse_initialize_returns_single_frame() {
    let (router, _) = router_with(AosdConfig::default());

    let body = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });
    let response = router
        .oneshot(post_json("/mcp/sse", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));
    assert_eq!(
        response.headers().get("x-accel-buffering").and_then(|v| v.to_str().ok()),
        Some("no")
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.starts_with("data: "));
    let frame: Value =
        serde_json::from_str(text.trim_start_matches("data: ").trim()).expect("frame");
    assert_eq!(frame["jsonrpc"], "2.0");
    assert_eq!(frame["id"], 1);
    assert_eq!(frame["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn sse_unknown_method_maps_to_rpc_error() {
    let (router, _) = router_with(AosdConfig::default());

    let body = json!({ "jsonrpc": "2.0", "id": 7, "method": "resources/list" });
    let response = router
        .oneshot(post_json("/mcp/sse", &body))
        .await
        .expect("response");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    let frame: Value =
        serde_json::from_str(text.trim_start_matches("data: ").trim()).expect("frame");
    assert_eq!(frame["error"]["code"], -32601);
}
