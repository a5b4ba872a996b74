//! System tools: health monitoring, chassis environment status, NTP
//! state, and configuration backup.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use {
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::debug,
};

use {
    aosd_common::ToolError,
    aosd_parsers::{
        environment::{
            parse_show_cmm, parse_show_fan, parse_show_power_supply, parse_show_temperature,
        },
        health::parse_show_health,
        ntp::{parse_show_ntp_server_list, parse_show_ntp_status},
        system::parse_show_chassis,
    },
    aosd_ssh::Device,
};

use crate::{
    audit::issues_block,
    service::{default_port, parse_args, ToolOutput, ToolService},
    types::ContentBlock,
};

/// Backups stream the whole configuration; give them a longer leash.
const BACKUP_TIMEOUT_S: u64 = 60;

/// Fans below this speed are reported even when their status reads OK.
const FAN_MIN_RPM: u32 = 1000;

/// NTP offsets beyond this magnitude are reported.
const NTP_MAX_OFFSET_MS: f64 = 100.0;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HealthArgs {
    host: String,
    /// Run `show health all` instead of `show health`.
    #[serde(default)]
    all: bool,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChassisStatusArgs {
    host: String,
    #[serde(default = "default_true")]
    include_temperature: bool,
    #[serde(default = "default_true")]
    include_fans: bool,
    #[serde(default = "default_true")]
    include_power: bool,
    #[serde(default = "default_true")]
    include_cmm: bool,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NtpStatusArgs {
    host: String,
    #[serde(default = "default_true")]
    include_servers: bool,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigBackupArgs {
    host: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_true() -> bool {
    true
}

impl ToolService {
    pub(crate) async fn health_monitor(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: HealthArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();

        let raw = if args.all { "show health all" } else { "show health" };
        let (command, res) = self.run_sanitized(&device, raw, None).await?;
        let report = parse_show_health(&res.stdout);

        let text = format!(
            "**Health: {}**\n\nOverall status: {}\nModules: {}\n",
            device.host,
            report.overall_status,
            report.modules.len(),
        );

        let issue_content = (!report.issues.is_empty()).then(|| issues_block(&report.issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "overall_status": report.overall_status,
            "modules": report.modules,
            "issues": report.issues,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [command],
        }))
        .with_content(ContentBlock::text(text));

        if let Some(block) = issue_content {
            output = output.with_content(block);
        }
        Ok(output)
    }

    pub(crate) async fn chassis_status(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ChassisStatusArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues = Vec::new();

        let (cmd, chassis_res) = self.run_sanitized(&device, "show chassis", None).await?;
        commands.push(cmd);
        let chassis = parse_show_chassis(&chassis_res.stdout);

        let temperature = if args.include_temperature {
            match self.run_sanitized(&device, "show temperature", None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    Some(parse_show_temperature(&res.stdout))
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "temperature view unavailable");
                    None
                },
            }
        } else {
            None
        };

        let fans = if args.include_fans {
            match self.run_sanitized(&device, "show fan", None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    Some(parse_show_fan(&res.stdout))
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "fan view unavailable");
                    None
                },
            }
        } else {
            None
        };

        let power_supplies = if args.include_power {
            match self.run_sanitized(&device, "show power-supply", None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    Some(parse_show_power_supply(&res.stdout))
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "power-supply view unavailable");
                    None
                },
            }
        } else {
            None
        };

        let cmm = if args.include_cmm {
            match self.run_sanitized(&device, "show cmm", None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    Some(parse_show_cmm(&res.stdout))
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "cmm view unavailable");
                    None
                },
            }
        } else {
            None
        };

        if let Some(ref report) = temperature {
            for sensor in &report.sensors {
                if sensor.status != "OK" {
                    issues.push(format!(
                        "Temperature sensor {} at {}: {}°C (threshold: {}°C)",
                        sensor.sensor,
                        sensor.location,
                        sensor.current_celsius,
                        sensor.threshold_celsius
                    ));
                }
            }
        }
        if let Some(ref fans) = fans {
            for fan in fans {
                if fan.status != "OK" {
                    issues.push(format!("Fan {} status: {}", fan.fan_id, fan.status));
                }
                if fan.speed_rpm < FAN_MIN_RPM {
                    issues.push(format!("Fan {} speed low: {} RPM", fan.fan_id, fan.speed_rpm));
                }
            }
        }
        if let Some(ref psus) = power_supplies {
            for psu in psus {
                if psu.status != "present" {
                    issues.push(format!("Power supply {}: {}", psu.psu_id, psu.status));
                }
                if !psu.operational {
                    issues.push(format!("Power supply {} not operational", psu.psu_id));
                }
            }
        }

        let text = format!(
            "**Chassis Status: {}**\n\nModel: {}\nSerial: {}\nSensors: {} | Fans: {} | PSUs: {}\n",
            device.host,
            chassis.model.as_deref().unwrap_or("unknown"),
            chassis.serial_number.as_deref().unwrap_or("unknown"),
            temperature.as_ref().map_or(0, |t| t.sensors.len()),
            fans.as_ref().map_or(0, Vec::len),
            power_supplies.as_ref().map_or(0, Vec::len),
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "chassis": chassis,
            "temperature": temperature,
            "fans": fans,
            "power_supplies": power_supplies,
            "cmm": cmm,
            "issues": issues,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        }))
        .with_content(ContentBlock::text(text));

        if let Some(block) = issue_content {
            output = output.with_content(block);
        }
        Ok(output)
    }

    pub(crate) async fn ntp_status(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: NtpStatusArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues = Vec::new();

        let (cmd, status_res) = self.run_sanitized(&device, "show ntp status", None).await?;
        commands.push(cmd);
        let status = parse_show_ntp_status(&status_res.stdout);

        let servers = if args.include_servers {
            match self
                .run_sanitized(&device, "show ntp client server-list", None)
                .await
            {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    parse_show_ntp_server_list(&res.stdout)
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "ntp server list unavailable");
                    Vec::new()
                },
            }
        } else {
            Vec::new()
        };

        if !status.synchronized {
            issues.push("NTP not synchronized - time may be inaccurate".into());
        }
        if let Some(stratum) = status.stratum {
            if stratum >= 16 {
                issues.push(format!("NTP stratum {stratum} invalid (should be < 16)"));
            }
        }
        if let Some(offset) = status.offset_ms {
            if offset.abs() > NTP_MAX_OFFSET_MS {
                issues.push(format!("NTP offset high: {offset}ms (should be < 100ms)"));
            }
        }
        for server in &servers {
            if server.status == "unreachable" {
                issues.push(format!("NTP server {} unreachable", server.ip));
            }
            if server.reachability < 128 {
                issues.push(format!(
                    "NTP server {} has low reachability ({}/255 polls successful)",
                    server.ip, server.reachability
                ));
            }
            if server.delay_ms > 100.0 {
                issues.push(format!(
                    "NTP server {} has high delay ({}ms)",
                    server.ip, server.delay_ms
                ));
            }
        }

        let text = format!(
            "**NTP Status: {}**\n\nSynchronized: {}\nStratum: {}\nOffset: {}\nServers: {}\n",
            device.host,
            if status.synchronized { "yes" } else { "no" },
            status.stratum.map_or("unknown".to_string(), |s| s.to_string()),
            status
                .offset_ms
                .map_or("unknown".to_string(), |o| format!("{o}ms")),
            servers.len(),
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "status": status,
            "servers": servers,
            "issues": issues,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        }))
        .with_content(ContentBlock::text(text));

        if let Some(block) = issue_content {
            output = output.with_content(block);
        }
        Ok(output)
    }

    pub(crate) async fn config_backup(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ConfigBackupArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, args.username.clone());
        let start = Instant::now();

        let timeout = self.default_timeout().max(Duration::from_secs(BACKUP_TIMEOUT_S));
        let (command, res) = self
            .run_sanitized(&device, "write terminal", Some(timeout))
            .await?;

        let config = res.stdout.trim().to_string();
        let size_bytes = config.len();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        let text = format!(
            "**Configuration Backup: {}**\n\nSize: {size_bytes} bytes\nDuration: {}ms\n",
            device.host, res.duration_ms,
        );

        let data = json!({
            "host": device.host,
            "config": config,
            "size_bytes": size_bytes,
            "truncated": res.truncated,
            "timestamp": timestamp,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [command],
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }
}
