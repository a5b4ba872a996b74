//! Network lookup tools: MAC/ARP search, LLDP neighbors, link
//! aggregation, and DHCP relay state.

use std::{collections::BTreeSet, time::Instant};

use {
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::debug,
};

use {
    aosd_common::ToolError,
    aosd_parsers::{
        dhcp::{parse_relay_counters, parse_relay_interface, parse_relay_statistics},
        lacp::{parse_show_lacp, parse_show_linkagg},
        lldp::parse_remote_system,
        mac::{normalize_mac, parse_mac_learning, parse_show_arp, MacEntry},
    },
    aosd_ssh::Device,
};

use crate::{
    audit::issues_block,
    service::{default_port, parse_args, ToolOutput, ToolService},
    types::ContentBlock,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MacLookupArgs {
    host: String,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    vlan: Option<u32>,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LldpNeighborsArgs {
    host: String,
    #[serde(default)]
    local_port: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LacpInfoArgs {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DhcpRelayArgs {
    host: String,
    #[serde(default = "default_true")]
    include_counters: bool,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_true() -> bool {
    true
}

impl ToolService {
    /// Locate a MAC by address, ARP entry by IP, or dump a VLAN's table.
    /// Exactly one selector is required.
    pub(crate) async fn mac_lookup(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: MacLookupArgs = parse_args(args)?;
        let selectors =
            usize::from(args.mac_address.is_some()) + usize::from(args.ip_address.is_some()) + usize::from(args.vlan.is_some());
        if selectors != 1 {
            return Err(ToolError::InvalidRequest(
                "exactly one of mac_address, ip_address, or vlan is required".into(),
            ));
        }

        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();

        let mut entries: Vec<MacEntry> = Vec::new();
        if let Some(ref mac) = args.mac_address {
            let mac = normalize_mac(mac);
            let (cmd, res) = self
                .run_sanitized(&device, &format!("show mac-learning mac {mac}"), None)
                .await?;
            commands.push(cmd);
            entries = parse_mac_learning(&res.stdout)
                .into_iter()
                .filter(|e| e.mac_address == mac)
                .collect();
        } else if let Some(ref ip) = args.ip_address {
            let (cmd, res) = self
                .run_sanitized(&device, &format!("show arp {ip}"), None)
                .await?;
            commands.push(cmd);
            entries = parse_show_arp(&res.stdout)
                .into_iter()
                .filter(|e| &e.ip_address == ip)
                .map(|e| MacEntry {
                    mac_address: e.mac_address,
                    vlan: e.vlan.unwrap_or(0),
                    port: e.port,
                    r#type: e.r#type,
                })
                .collect();
        } else if let Some(vlan) = args.vlan {
            let (cmd, res) = self
                .run_sanitized(&device, "show mac-learning domain vlan", None)
                .await?;
            commands.push(cmd);
            entries = parse_mac_learning(&res.stdout)
                .into_iter()
                .filter(|e| e.vlan == vlan)
                .collect();
        }

        // Dedup on (mac, vlan, port).
        let mut seen = BTreeSet::new();
        entries.retain(|e| seen.insert((e.mac_address.clone(), e.vlan, e.port.clone())));

        let text = if entries.is_empty() {
            format!("**MAC Lookup on {}**\n\nNo matching entries found.\n", device.host)
        } else {
            let mut text = format!(
                "**MAC Lookup on {}** — {} entr{}\n\n",
                device.host,
                entries.len(),
                if entries.len() == 1 { "y" } else { "ies" },
            );
            for entry in entries.iter().take(10) {
                text.push_str(&format!(
                    "- {} on port {} (VLAN {}, {})\n",
                    entry.mac_address, entry.port, entry.vlan, entry.r#type
                ));
            }
            text
        };

        let data = json!({
            "host": device.host,
            "query": {
                "mac_address": args.mac_address.as_deref().map(normalize_mac),
                "ip_address": args.ip_address,
                "vlan": args.vlan,
            },
            "entries": entries,
            "total": entries.len(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    pub(crate) async fn lldp_neighbors(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: LldpNeighborsArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();

        let (command, res) = self
            .run_sanitized(&device, "show lldp remote-system", None)
            .await?;
        let mut neighbors = parse_remote_system(&res.stdout);
        if let Some(ref local_port) = args.local_port {
            neighbors.retain(|n| &n.local_port == local_port);
        }

        let mut text = format!(
            "**LLDP Neighbors on {}** — {} found\n\n",
            device.host,
            neighbors.len()
        );
        for neighbor in neighbors.iter().take(15) {
            text.push_str(&format!(
                "- {}: {} ({})\n",
                neighbor.local_port,
                neighbor.system_name.as_deref().unwrap_or("unknown"),
                neighbor.management_ip.as_deref().unwrap_or("no mgmt ip"),
            ));
        }

        let data = json!({
            "host": device.host,
            "local_port": args.local_port,
            "neighbors": neighbors,
            "total": neighbors.len(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [command],
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    pub(crate) async fn lacp_info(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: LacpInfoArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues = Vec::new();

        let (cmd, linkagg_res) = self.run_sanitized(&device, "show linkagg", None).await?;
        commands.push(cmd);
        let lags = parse_show_linkagg(&linkagg_res.stdout);

        let lacp = match self.run_sanitized(&device, "show lacp", None).await {
            Ok((cmd, res)) => {
                commands.push(cmd);
                Some(parse_show_lacp(&res.stdout))
            },
            Err(err) => {
                debug!(host = %device.host, error = %err, "lacp view unavailable");
                None
            },
        };

        for lag in &lags {
            if lag.admin_state == "enabled" && lag.oper_state == "down" {
                issues.push(format!(
                    "LAG {} ({}): administratively enabled but operationally down",
                    lag.agg_id, lag.name
                ));
            }
            if let (Some(attached), Some(selected)) = (lag.attached_ports, lag.selected_ports) {
                if selected < attached {
                    issues.push(format!(
                        "LAG {} ({}): {} port(s) attached but not selected",
                        lag.agg_id,
                        lag.name,
                        attached - selected
                    ));
                }
            }
        }
        let lacp_enabled = lacp.as_ref().is_some_and(|l| l.lacp_enabled);
        if lacp.is_some() && !lacp_enabled && lags.iter().any(|l| l.r#type == "lacp") {
            issues.push("LACP LAGs configured but LACP protocol not enabled".into());
        }

        let text = format!(
            "**Link Aggregation on {}**\n\nLAGs: {}\nLACP enabled: {}\n",
            device.host,
            lags.len(),
            if lacp_enabled { "yes" } else { "no" },
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "lags": lags,
            "total_lags": lags.len(),
            "lacp_enabled": lacp_enabled,
            "lacp": lacp,
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

    pub(crate) async fn dhcp_relay_info(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: DhcpRelayArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues = Vec::new();

        let (cmd, iface_res) = self
            .run_sanitized(&device, "show ip dhcp-relay interface", None)
            .await?;
        commands.push(cmd);
        let report = parse_relay_interface(&iface_res.stdout);

        let counters = if args.include_counters {
            match self
                .run_sanitized(&device, "show ip dhcp-relay counters", None)
                .await
            {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    Some(parse_relay_counters(&res.stdout))
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "relay counters unavailable");
                    None
                },
            }
        } else {
            None
        };

        let statistics = match self
            .run_sanitized(&device, "show ip dhcp-relay statistics", None)
            .await
        {
            Ok((cmd, res)) => {
                commands.push(cmd);
                Some(parse_relay_statistics(&res.stdout))
            },
            Err(err) => {
                debug!(host = %device.host, error = %err, "relay statistics unavailable");
                None
            },
        };

        if report.interfaces.is_empty() {
            issues.push("No DHCP relay interfaces configured".into());
        }
        for iface in &report.interfaces {
            if iface.admin_state.as_deref() == Some("enabled")
                && iface.oper_state.as_deref() == Some("down")
            {
                issues.push(format!("{}: DHCP relay enabled but interface down", iface.interface));
            }
            if iface.servers.is_empty() {
                issues.push(format!("{}: No DHCP servers configured", iface.interface));
            }
        }
        if let Some(ref stats) = statistics {
            if stats.requests_received > 0 {
                let dropped = stats.requests_dropped + stats.replies_dropped;
                let drop_rate = dropped as f64 / stats.requests_received as f64 * 100.0;
                if drop_rate > 5.0 {
                    issues.push(format!("Global DHCP drop rate high: {drop_rate:.1}%"));
                }
            }
            if stats.errors > 0 {
                issues.push(format!("DHCP relay errors detected: {}", stats.errors));
            }
        }

        let text = format!(
            "**DHCP Relay on {}**\n\nAdmin: {}\nInterfaces: {}\nForward delay: {}s | Max hops: {}\n",
            device.host,
            report.relay.admin_status.as_deref().unwrap_or("unknown"),
            report.interfaces.len(),
            report.relay.forward_delay_seconds.unwrap_or(0),
            report.relay.max_hops.unwrap_or(0),
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "relay": report.relay,
            "interfaces": report.interfaces,
            "counters": counters,
            "statistics": statistics,
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
}
