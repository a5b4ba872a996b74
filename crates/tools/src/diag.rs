//! Diagnostic tools: ping, traceroute, PoE status, and the PoE restart
//! write operation.

use std::{collections::HashMap, time::{Duration, Instant}};

use {
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::info,
};

use {
    aosd_common::ToolError,
    aosd_parsers::lanpower::{parse_show_lanpower, PoeChassisSummary},
    aosd_ssh::Device,
};

use crate::{
    service::{default_port, parse_args, parse_port_id, ToolOutput, ToolService},
    template::format_template,
    types::ContentBlock,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PingArgs {
    host: String,
    destination: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    timeout_s: Option<u64>,
}

fn default_count() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TracerouteArgs {
    host: String,
    destination: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    timeout_s: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PoeArgs {
    host: String,
    /// Slot selector (`1` or `1/1`); defaults to slot 1.
    #[serde(default)]
    slot: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PoeRestartArgs {
    host: String,
    port_id: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    username: Option<String>,
    #[serde(default = "default_wait")]
    wait_seconds: u64,
}

fn default_wait() -> u64 {
    5
}

impl ToolService {
    pub(crate) async fn diag_ping(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PingArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);

        let values = HashMap::from([
            ("destination", args.destination.clone()),
            ("count", args.count.to_string()),
        ]);
        let raw = format_template(&self.templates().ping, &values)?;

        self.exec_cli(&device, &raw, args.timeout_s.map(Duration::from_secs))
            .await
    }

    pub(crate) async fn diag_traceroute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: TracerouteArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);

        let values = HashMap::from([("destination", args.destination.clone())]);
        let raw = format_template(&self.templates().traceroute, &values)?;

        self.exec_cli(&device, &raw, args.timeout_s.map(Duration::from_secs))
            .await
    }

    pub(crate) async fn diag_poe(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PoeArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);

        let raw = match args.slot.as_deref() {
            Some(slot) => {
                let chassis = slot.split('/').next().unwrap_or("1");
                format!("show lanpower slot {chassis}/1")
            },
            None => "show lanpower slot 1/1".to_string(),
        };

        let start = Instant::now();
        let (command, result) = self.run_sanitized(&device, &raw, None).await?;
        let report = parse_show_lanpower(&result.stdout);

        let mut text = format!("**PoE Status for {}**\n\n", device.host);
        let summary = &report.chassis_summary;
        if *summary != PoeChassisSummary::default() {
            text.push_str("**Chassis Summary:**\n");
            text.push_str(&format!(
                "- Power Consumed: {}W\n",
                summary.actual_power_consumed_watts.unwrap_or(0)
            ));
            text.push_str(&format!(
                "- Budget Remaining: {}W\n",
                summary.power_budget_remaining_watts.unwrap_or(0)
            ));
            text.push_str(&format!(
                "- Total Budget: {}W\n\n",
                summary.total_power_budget_watts.unwrap_or(0)
            ));
        }
        text.push_str(&format!("**Ports:** {} ports analyzed\n", report.ports.len()));

        let data = json!({
            "host": device.host,
            "command": command,
            "ports": report.ports,
            "chassis_summary": report.chassis_summary,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [command],
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    /// The only write tool: disable inline power, wait, re-enable.
    pub(crate) async fn poe_restart(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PoeRestartArgs = parse_args(args)?;
        parse_port_id(&args.port_id)?;
        let device = Device::from_host(&args.host, args.port, args.username.clone());

        let start = Instant::now();

        let stop_raw = format!("lanpower port {} admin-state disable", args.port_id);
        let (stop_command, stop_result) = self.run_sanitized(&device, &stop_raw, None).await?;

        info!(host = %device.host, port_id = %args.port_id, wait_seconds = args.wait_seconds, "PoE disabled, waiting before re-enable");
        tokio::time::sleep(Duration::from_secs(args.wait_seconds)).await;

        let start_raw = format!("lanpower port {} admin-state enable", args.port_id);
        let (start_command, start_result) = self.run_sanitized(&device, &start_raw, None).await?;

        let success = stop_result.exit_status == Some(0) && start_result.exit_status == Some(0);

        let data = json!({
            "host": device.host,
            "port_id": args.port_id,
            "wait_seconds": args.wait_seconds,
            "stop_command": stop_command,
            "start_command": start_command,
            "stop_result": non_empty_or_ok(&stop_result.stdout),
            "start_result": non_empty_or_ok(&start_result.stdout),
            "success": success,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [stop_command, start_command],
        });

        let text = format!(
            "**PoE Restart: {} port {}**\n\nResult: {}\nWait: {}s\n",
            device.host,
            args.port_id,
            if success { "success" } else { "failed" },
            args.wait_seconds,
        );

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }
}

fn non_empty_or_ok(stdout: &str) -> String {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        "OK".to_string()
    } else {
        trimmed.to_string()
    }
}
