//! Tool dispatcher and shared handler plumbing.

use std::{sync::Arc, time::Duration};

use {
    serde::de::DeserializeOwned,
    serde_json::Value,
    tracing::{error, info, warn},
};

use {
    aosd_common::ToolError,
    aosd_config::{AosdConfig, TemplatesConfig},
    aosd_policy::CompiledPolicy,
    aosd_ssh::{CommandResult, CommandRunner, Device},
};

use crate::types::{ToolCall, ToolResult};

/// A handler's successful output: the `data` object plus display blocks.
pub struct ToolOutput {
    pub data: Value,
    pub content: Vec<crate::types::ContentBlock>,
}

impl ToolOutput {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            content: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_content(mut self, block: crate::types::ContentBlock) -> Self {
        self.content.push(block);
        self
    }
}

/// The dispatcher. Holds the compiled policy, templates, and the command
/// runner; constructed once at startup and shared across requests.
pub struct ToolService {
    policy: CompiledPolicy,
    templates: TemplatesConfig,
    runner: Arc<dyn CommandRunner>,
    default_timeout_s: u64,
}

impl ToolService {
    pub fn new(cfg: &AosdConfig, runner: Arc<dyn CommandRunner>) -> anyhow::Result<Self> {
        Ok(Self {
            policy: CompiledPolicy::compile(&cfg.command_policy)?,
            templates: cfg.templates.clone(),
            runner,
            default_timeout_s: cfg.ssh.default_command_timeout_s,
        })
    }

    pub(crate) fn templates(&self) -> &TemplatesConfig {
        &self.templates
    }

    pub(crate) fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_s)
    }

    /// Dispatch one call to its handler and wrap the outcome in the result
    /// envelope. Tool-level failures are values, never panics.
    pub async fn call(&self, call: ToolCall) -> ToolResult {
        let tool = call.tool.clone();
        info!(
            tool = %tool,
            subject = call.context.subject.as_deref().unwrap_or("anonymous"),
            correlation_id = call.context.correlation_id.as_deref().unwrap_or("-"),
            "tool call"
        );

        match self.dispatch(&tool, call.args).await {
            Ok(output) => ToolResult::ok(&tool, output.data, output.content),
            Err(err) => {
                match err {
                    ToolError::Internal(ref source) => {
                        error!(tool = %tool, error = %source, "tool call failed internally");
                    },
                    ref err => {
                        warn!(tool = %tool, code = err.code(), error = %err, "tool call failed");
                    },
                }
                ToolResult::error(&tool, &err)
            },
        }
    }

    async fn dispatch(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "aos.cli.readonly" => self.cli_readonly(args).await,
            "aos.diag.ping" => self.diag_ping(args).await,
            "aos.diag.traceroute" => self.diag_traceroute(args).await,
            "aos.diag.poe" => self.diag_poe(args).await,
            "aos.poe.restart" => self.poe_restart(args).await,
            "aos.device.facts" => self.device_facts(args).await,
            "aos.port.info" => self.port_info(args).await,
            "aos.port.discover" => self.port_discover(args).await,
            "aos.interfaces.discover" => self.interfaces_discover(args).await,
            "aos.vlan.audit" => self.vlan_audit(args).await,
            "aos.routing.audit" => self.routing_audit(args).await,
            "aos.spantree.audit" => self.spantree_audit(args).await,
            "aos.config.backup" => self.config_backup(args).await,
            "aos.health.monitor" => self.health_monitor(args).await,
            "aos.chassis.status" => self.chassis_status(args).await,
            "aos.mac.lookup" => self.mac_lookup(args).await,
            "aos.lacp.info" => self.lacp_info(args).await,
            "aos.ntp.status" => self.ntp_status(args).await,
            "aos.dhcp.relay.info" => self.dhcp_relay_info(args).await,
            "aos.lldp.neighbors" => self.lldp_neighbors(args).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Sanitize a command and execute it. Every command a handler sends
    /// goes through here, so the sanitize-then-run invariant is structural.
    pub(crate) async fn run_sanitized(
        &self,
        device: &Device,
        raw_command: &str,
        timeout: Option<Duration>,
    ) -> Result<(String, CommandResult), ToolError> {
        let command = self
            .policy
            .sanitize_command(raw_command)
            .map_err(|e| ToolError::InvalidCommand(e.to_string()))?;

        let result = self
            .runner
            .run(device, &command, timeout)
            .await
            .map_err(|e| ToolError::Ssh(e.to_string()))?;

        Ok((command, result))
    }

    /// Apply output sanitization (ANSI strip + redactions) to both streams.
    /// Returns `(stdout, stderr, redacted)`.
    pub(crate) fn sanitize_output(&self, result: &CommandResult) -> (String, String, bool) {
        let (stdout, redacted_out) = self.policy.sanitize_output(&result.stdout);
        let (stderr, redacted_err) = self.policy.sanitize_output(&result.stderr);
        (stdout, stderr, redacted_out || redacted_err)
    }
}

/// Deserialize handler arguments, rejecting unknown fields and type
/// mismatches as `invalid_request`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidRequest(e.to_string()))
}

/// Default SSH port for argument structs.
pub(crate) fn default_port() -> u16 {
    22
}

/// Validate a `chassis/slot/port` identifier and return its parts.
pub(crate) fn parse_port_id(port_id: &str) -> Result<(u32, u32, u32), ToolError> {
    let parts: Vec<&str> = port_id.split('/').collect();
    if parts.len() == 3 {
        if let (Ok(c), Ok(s), Ok(p)) = (parts[0].parse(), parts[1].parse(), parts[2].parse()) {
            return Ok((c, s, p));
        }
    }
    Err(ToolError::InvalidRequest(format!(
        "invalid port_id '{port_id}': expected chassis/slot/port, e.g. 1/1/19"
    )))
}
