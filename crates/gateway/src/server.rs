//! Router assembly and the unary JSON endpoints.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        extract::{Query, State},
        http::StatusCode,
        response::{IntoResponse, Json, Response},
        routing::{get, post},
        Router,
    },
    secrecy::SecretString,
    serde::Deserialize,
    serde_json::json,
    tracing::info,
};

use {
    aosd_config::AosdConfig,
    aosd_tools::{catalog, ListMode, ToolCall, ToolService},
};

use crate::auth::{auth_gate, parse_allowed_ips, RequestThrottle};

/// Shared transport state: the dispatcher plus the gate configuration.
pub struct GatewayState {
    pub service: ToolService,
    pub api_key: Option<SecretString>,
    pub allowed_ips: Vec<ipnet::IpNet>,
    pub rate_limit_per_minute: Option<u32>,
    pub require_authz_context: bool,
    pub throttle: RequestThrottle,
}

impl GatewayState {
    pub fn new(cfg: &AosdConfig, service: ToolService) -> anyhow::Result<Self> {
        Ok(Self {
            service,
            api_key: cfg.server.api_key.clone(),
            allowed_ips: parse_allowed_ips(&cfg.server.allowed_ips)?,
            rate_limit_per_minute: cfg.server.rate_limit_per_minute,
            require_authz_context: cfg.server.require_authz_context,
            throttle: RequestThrottle::default(),
        })
    }
}

/// Assemble the router: `/health` is public, everything else sits behind
/// the auth gate.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let protected = Router::new()
        .route("/v1/tools/list", post(tools_list_handler).get(tools_list_handler))
        .route("/v1/tools/call", post(tools_call_handler))
        .route("/mcp/sse", post(crate::rpc::mcp_sse_handler))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_gate));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn start_server(bind: &str, port: u16, state: Arc<GatewayState>) -> anyhow::Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "gateway listening");

    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    mode: Option<ListMode>,
}

async fn tools_list_handler(Query(query): Query<ListQuery>) -> Json<serde_json::Value> {
    Json(catalog::render_catalog(query.mode.unwrap_or_default()))
}

async fn tools_call_handler(
    State(state): State<Arc<GatewayState>>,
    Json(call): Json<ToolCall>,
) -> Response {
    // Fail closed when the platform is supposed to forward an identity but
    // did not (integration bug).
    if state.require_authz_context && call.context.subject.is_none() {
        return (StatusCode::BAD_REQUEST, "Missing authz context").into_response();
    }

    let result = state.service.call(call).await;
    Json(result).into_response()
}
