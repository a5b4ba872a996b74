//! Audit tools: VLAN, routing, and spanning tree. Every issue string is
//! derived from a concrete field rule, never free-form.

use std::time::Instant;

use {
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::debug,
};

use {
    aosd_common::ToolError,
    aosd_parsers::{
        routing::{
            parse_ip_interfaces, parse_ospf_areas, parse_ospf_interfaces, parse_ospf_neighbors,
            parse_show_ip_routes, parse_show_vrf,
        },
        stp::{parse_spantree_cist, parse_spantree_mode, parse_spantree_ports, parse_spantree_vlans},
        vlan::{parse_show_vlan, parse_show_vlan_detail, VlanRow},
    },
    aosd_ssh::Device,
};

use crate::{
    service::{default_port, parse_args, ToolOutput, ToolService},
    types::ContentBlock,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VlanAuditArgs {
    host: String,
    #[serde(default)]
    vlan_id: Option<u32>,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoutingAuditArgs {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    include_routes: bool,
    #[serde(default = "default_route_limit")]
    route_limit: usize,
    #[serde(default)]
    protocol_filter: Option<String>,
}

fn default_route_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpantreeAuditArgs {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

/// Names suggesting a leftover test/temporary VLAN.
const SUSPICIOUS_VLAN_NAMES: &[&str] = &["test", "temp", "old", "unused", "ne pas", "poubelle", "toto"];

impl ToolService {
    pub(crate) async fn vlan_audit(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: VlanAuditArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();

        let (cmd, vlan_res) = self.run_sanitized(&device, "show vlan", None).await?;
        commands.push(cmd);
        let mut vlans = parse_show_vlan(&vlan_res.stdout);

        if let Some(vlan_id) = args.vlan_id {
            let (cmd, detail_res) = self
                .run_sanitized(&device, &format!("show vlan {vlan_id}"), None)
                .await?;
            commands.push(cmd);
            let detail = parse_show_vlan_detail(&detail_res.stdout);

            vlans.retain(|v| v.vlan_id == vlan_id);
            if let Some(vlan) = vlans.first_mut() {
                vlan.mac_tunneling = detail.mac_tunneling;
            }
        }

        let (summary, issues) = analyze_vlans(&vlans);

        let text = if let Some(vlan) = args.vlan_id.and_then(|_| vlans.first()) {
            format!(
                "**VLAN {}: {}**\n\nType: {}\nAdmin State: {}\nOper State: {}\nIP Routing: {}\nMTU: {}\n",
                vlan.vlan_id, vlan.name, vlan.r#type, vlan.admin_state, vlan.oper_state,
                vlan.ip_routing, vlan.mtu,
            )
        } else {
            format!(
                "**VLAN Audit Report: {}**\n\nTotal VLANs: {}\nEnabled: {} | Disabled: {}\nOperational: {} | Down: {}\nWith IP Routing: {}\n",
                device.host,
                summary["total"],
                summary["enabled"],
                summary["disabled"],
                summary["operational"],
                summary["down"],
                summary["with_ip_routing"],
            )
        };

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "total_vlans": vlans.len(),
            "vlans": vlans,
            "summary": summary,
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

    pub(crate) async fn routing_audit(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: RoutingAuditArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues: Vec<String> = Vec::new();

        let (cmd, vrf_res) = self.run_sanitized(&device, "show vrf", None).await?;
        commands.push(cmd);
        let vrfs = parse_show_vrf(&vrf_res.stdout);

        let mut route_table = None;
        if args.include_routes {
            let (cmd, routes_res) = self.run_sanitized(&device, "show ip routes", None).await?;
            commands.push(cmd);
            route_table = Some(parse_show_ip_routes(
                &routes_res.stdout,
                Some(args.route_limit),
                args.protocol_filter.as_deref(),
            ));
        }

        let mut vrf_infos = Vec::new();
        let mut total_ospf_interfaces = 0usize;
        let mut total_ospf_neighbors = 0usize;
        let mut total_ip_interfaces = 0usize;
        let mut vrfs_with_ospf = 0usize;

        for vrf in &vrfs {
            let prefix = |command: &str| -> String {
                if vrf.name == "default" {
                    command.to_string()
                } else {
                    format!("vrf {} {command}", vrf.name)
                }
            };

            let mut ospf_areas = Vec::new();
            let mut ospf_interfaces = Vec::new();
            let mut ospf_neighbors = Vec::new();

            if vrf.protocols.iter().any(|p| p == "OSPF") {
                vrfs_with_ospf += 1;

                match self.run_sanitized(&device, &prefix("show ip ospf area"), None).await {
                    Ok((cmd, res)) => {
                        commands.push(cmd);
                        ospf_areas = parse_ospf_areas(&res.stdout);
                    },
                    Err(err) => debug!(vrf = %vrf.name, error = %err, "ospf areas unavailable"),
                }

                match self
                    .run_sanitized(&device, &prefix("show ip ospf interface"), None)
                    .await
                {
                    Ok((cmd, res)) => {
                        commands.push(cmd);
                        ospf_interfaces = parse_ospf_interfaces(&res.stdout);
                        for iface in &ospf_interfaces {
                            if iface.oper_status.as_deref() == Some("down") {
                                issues.push(format!(
                                    "VRF {}: OSPF interface {} is operationally down",
                                    vrf.name, iface.interface
                                ));
                            }
                            if iface.admin_status.as_deref() == Some("disabled") {
                                issues.push(format!(
                                    "VRF {}: OSPF interface {} is administratively disabled",
                                    vrf.name, iface.interface
                                ));
                            }
                        }
                    },
                    Err(err) => {
                        issues.push(format!(
                            "VRF {}: Failed to get OSPF interfaces - {err}",
                            vrf.name
                        ));
                    },
                }

                match self
                    .run_sanitized(&device, &prefix("show ip ospf neighbor"), None)
                    .await
                {
                    Ok((cmd, res)) => {
                        commands.push(cmd);
                        ospf_neighbors = parse_ospf_neighbors(&res.stdout);
                        for neighbor in &ospf_neighbors {
                            if neighbor.state != "Full" && neighbor.state != "TwoWay" {
                                issues.push(format!(
                                    "VRF {}: OSPF neighbor {} in state {}",
                                    vrf.name, neighbor.router_id, neighbor.state
                                ));
                            }
                        }
                    },
                    Err(err) => {
                        issues.push(format!(
                            "VRF {}: Failed to get OSPF neighbors - {err}",
                            vrf.name
                        ));
                    },
                }
            }

            let mut ip_interfaces = Vec::new();
            match self.run_sanitized(&device, &prefix("show ip interface"), None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    ip_interfaces = parse_ip_interfaces(&res.stdout);
                    for iface in &ip_interfaces {
                        if iface.oper_status.as_deref() == Some("disabled")
                            || iface.state.as_deref() == Some("down")
                        {
                            issues.push(format!(
                                "VRF {}: IP interface {} is down",
                                vrf.name, iface.interface
                            ));
                        }
                    }
                },
                Err(err) => {
                    issues.push(format!("VRF {}: Failed to get IP interfaces - {err}", vrf.name));
                },
            }

            total_ospf_interfaces += ospf_interfaces.len();
            total_ospf_neighbors += ospf_neighbors.len();
            total_ip_interfaces += ip_interfaces.len();

            vrf_infos.push(json!({
                "name": vrf.name,
                "profile": vrf.profile,
                "protocols": vrf.protocols,
                "ospf_areas": ospf_areas,
                "ospf_interfaces": ospf_interfaces,
                "ospf_neighbors": ospf_neighbors,
                "ip_interfaces": ip_interfaces,
            }));
        }

        let total_routes = route_table.as_ref().map_or(0, |t| t.total_routes);
        let summary = json!({
            "total_vrfs": vrf_infos.len(),
            "vrfs_with_ospf": vrfs_with_ospf,
            "total_ospf_interfaces": total_ospf_interfaces,
            "total_ospf_neighbors": total_ospf_neighbors,
            "total_ip_interfaces": total_ip_interfaces,
            "total_routes": total_routes,
        });

        let text = format!(
            "**Routing Audit Report: {}**\n\nVRFs: {}\nVRFs with OSPF: {}\nOSPF Interfaces: {}\nOSPF Neighbors: {}\nIP Interfaces: {}\nTotal Routes: {}\n",
            device.host,
            vrf_infos.len(),
            vrfs_with_ospf,
            total_ospf_interfaces,
            total_ospf_neighbors,
            total_ip_interfaces,
            total_routes,
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "vrfs": vrf_infos,
            "total_routes": total_routes,
            "routes": route_table.as_ref().map(|t| &t.routes),
            "summary": summary,
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

    pub(crate) async fn spantree_audit(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: SpantreeAuditArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();
        let mut issues: Vec<String> = Vec::new();

        let (cmd, mode_res) = self.run_sanitized(&device, "show spantree mode", None).await?;
        commands.push(cmd);
        let mode = parse_spantree_mode(&mode_res.stdout);

        let (cmd, cist_res) = self.run_sanitized(&device, "show spantree cist", None).await?;
        commands.push(cmd);
        let cist = parse_spantree_cist(&cist_res.stdout);

        let (cmd, ports_res) = self.run_sanitized(&device, "show spantree ports", None).await?;
        commands.push(cmd);
        let ports = parse_spantree_ports(&ports_res.stdout);

        let (cmd, vlans_res) = self.run_sanitized(&device, "show spantree vlan", None).await?;
        commands.push(cmd);
        let vlans = parse_spantree_vlans(&vlans_res.stdout);

        if cist.stp_status.as_deref() != Some("ON") {
            issues.push("Spanning Tree is disabled globally".into());
        }
        let is_root_bridge =
            cist.bridge_id.is_some() && cist.bridge_id == cist.designated_root;
        if is_root_bridge {
            issues.push("This switch is the root bridge - verify this is intentional".into());
        }
        for port in &ports {
            if port.oper_status != "FORW" && port.oper_status != "DIS" {
                issues.push(format!(
                    "Port {} in unusual state: {}",
                    port.port_id, port.oper_status
                ));
            }
            if port.role == "ROOT" && port.oper_status != "FORW" {
                issues.push(format!("Root port {} is not forwarding", port.port_id));
            }
        }
        for vlan in &vlans {
            if vlan.status == "OFF" {
                issues.push(format!("VLAN {} has STP disabled", vlan.vlan_id));
            }
        }

        let forwarding = ports.iter().filter(|p| p.oper_status == "FORW").count();
        let blocking = ports
            .iter()
            .filter(|p| p.oper_status != "FORW" && p.oper_status != "DIS")
            .count();
        let vlans_on = vlans.iter().filter(|v| v.status == "ON").count();

        let summary = json!({
            "total_ports": ports.len(),
            "forwarding_ports": forwarding,
            "blocking_ports": blocking,
            "disabled_ports": ports.len() - forwarding - blocking,
            "total_vlans": vlans.len(),
            "vlans_stp_enabled": vlans_on,
            "vlans_stp_disabled": vlans.len() - vlans_on,
            "is_root_bridge": is_root_bridge,
            "topology_changes": cist.topology_changes.unwrap_or(0),
        });

        let text = format!(
            "**Spanning Tree Audit Report: {}**\n\nMode: {}\nProtocol: {}\nRoot Bridge: {}\nTopology Changes: {}\n\nPorts - Total: {} | Forwarding: {} | Blocking: {}\nVLANs - Total: {} | STP Enabled: {} | STP Disabled: {}\n",
            device.host,
            mode.mode.as_deref().unwrap_or("Unknown"),
            mode.protocol.as_deref().unwrap_or("Unknown"),
            if is_root_bridge { "YES" } else { "NO" },
            cist.topology_changes.unwrap_or(0),
            ports.len(),
            forwarding,
            blocking,
            vlans.len(),
            vlans_on,
            vlans.len() - vlans_on,
        );

        let issue_content = (!issues.is_empty()).then(|| issues_block(&issues));

        let mut output = ToolOutput::new(json!({
            "host": device.host,
            "mode": mode,
            "cist": cist,
            "ports": ports,
            "vlans": vlans,
            "summary": summary,
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

/// Summarize VLAN rows and derive configuration issues.
fn analyze_vlans(vlans: &[VlanRow]) -> (Value, Vec<String>) {
    let mut enabled = 0;
    let mut operational = 0;
    let mut with_ip_routing = 0;
    let mut std_vlans = 0;
    let mut vcm_vlans = 0;
    let mut issues = Vec::new();

    for vlan in vlans {
        if vlan.admin_state == "Ena" {
            enabled += 1;
        }
        if vlan.oper_state == "Ena" {
            operational += 1;
        }
        if vlan.ip_routing == "Ena" {
            with_ip_routing += 1;
        }
        match vlan.r#type.as_str() {
            "std" => std_vlans += 1,
            "vcm" => vcm_vlans += 1,
            _ => {},
        }

        if vlan.admin_state == "Ena" && vlan.oper_state == "Dis" {
            issues.push(format!(
                "VLAN {} ({}): Enabled but operationally down",
                vlan.vlan_id, vlan.name
            ));
        }
        if vlan.vlan_id == 1 && vlan.admin_state == "Ena" {
            issues.push("VLAN 1: Default VLAN is enabled - consider disabling if unused".into());
        }
        let lower = vlan.name.to_lowercase();
        if SUSPICIOUS_VLAN_NAMES.iter().any(|kw| lower.contains(kw)) {
            issues.push(format!(
                "VLAN {} ({}): Suspicious name suggests temporary/test VLAN",
                vlan.vlan_id, vlan.name
            ));
        }
    }

    let summary = json!({
        "total": vlans.len(),
        "enabled": enabled,
        "disabled": vlans.len() - enabled,
        "operational": operational,
        "down": vlans.len() - operational,
        "with_ip_routing": with_ip_routing,
        "std_vlans": std_vlans,
        "vcm_vlans": vcm_vlans,
    });

    (summary, issues)
}

/// Render the standard issues block, capped at ten entries.
pub(crate) fn issues_block(issues: &[String]) -> ContentBlock {
    let mut text = format!("\n⚠️ Issues Detected ({}):\n", issues.len());
    for (i, issue) in issues.iter().take(10).enumerate() {
        text.push_str(&format!("{}. {issue}\n", i + 1));
    }
    if issues.len() > 10 {
        text.push_str(&format!("... and {} more issues\n", issues.len() - 10));
    }
    ContentBlock::text(text)
}
