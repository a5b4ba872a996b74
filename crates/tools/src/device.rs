//! Device tools: facts collection, single-port info, and the port /
//! interface discovery aggregations.

use std::{collections::BTreeMap, time::Instant};

use {
    serde::Deserialize,
    serde_json::{json, Value},
    tracing::debug,
};

use {
    aosd_common::ToolError,
    aosd_parsers::{
        interface::{
            parse_all_interface_details, parse_interface_detail, parse_interfaces_port,
            parse_interfaces_status, PortDetail, PortStatus,
        },
        lanpower::{parse_show_lanpower, PoePort},
        lldp::{parse_remote_system, LldpNeighbor},
        mac::{parse_mac_learning, MacEntry},
        system::{parse_show_chassis, parse_show_hardware_info, parse_show_system},
        vlan::{parse_vlan_members, parse_vlan_members_port, VlanMembership},
    },
    aosd_ssh::Device,
};

use crate::{
    service::{default_port, parse_args, parse_port_id, ToolOutput, ToolService},
    types::ContentBlock,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FactsArgs {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PortInfoArgs {
    host: String,
    port_id: String,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PortDiscoverArgs {
    host: String,
    port_id: String,
    #[serde(default = "default_port")]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InterfacesDiscoverArgs {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_true")]
    include_inactive: bool,
    #[serde(default)]
    include_statistics: bool,
}

fn default_true() -> bool {
    true
}

impl ToolService {
    pub(crate) async fn device_facts(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: FactsArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();

        let (cmd, system_res) = self.run_sanitized(&device, "show system", None).await?;
        commands.push(cmd);
        let system = parse_show_system(&system_res.stdout);

        let (cmd, chassis_res) = self.run_sanitized(&device, "show chassis", None).await?;
        commands.push(cmd);
        let chassis = parse_show_chassis(&chassis_res.stdout);

        // Not all platforms expose hardware-info; best effort.
        let hardware = match self.run_sanitized(&device, "show hardware-info", None).await {
            Ok((cmd, res)) => {
                commands.push(cmd);
                let hw = parse_show_hardware_info(&res.stdout);
                (!hw.is_empty()).then_some(hw)
            },
            Err(err) => {
                debug!(host = %device.host, error = %err, "hardware-info unavailable");
                None
            },
        };

        let mut text = format!("**Device Facts: {}**\n\n", device.host);
        if let Some(ref model) = system.model {
            text.push_str(&format!("Model: {model}\n"));
        }
        if let Some(ref serial) = chassis.serial_number {
            text.push_str(&format!("Serial: {serial}\n"));
        }
        if let Some(ref version) = system.software_version {
            text.push_str(&format!("Software: {version}\n"));
        }

        let data = json!({
            "host": device.host,
            "hostname": system.system_name,
            "model": system.model.clone().or(chassis.model.clone()),
            "aos_version": system.software_version,
            "serial_number": chassis.serial_number,
            "uptime": system.uptime,
            "mac_address": chassis.base_mac,
            "facts": {
                "system": system,
                "chassis": chassis,
                "hardware": hardware,
            },
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    pub(crate) async fn port_info(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PortInfoArgs = parse_args(args)?;
        parse_port_id(&args.port_id)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();

        let raw = format!("show interfaces port {}", args.port_id);
        let (command, result) = self.run_sanitized(&device, &raw, None).await?;
        let summary = parse_interfaces_port(&result.stdout, &args.port_id);

        let text = format!(
            "**Port {} on {}**\n\nAdmin: {} | Oper: {}\nSpeed: {} | Duplex: {}\n",
            args.port_id,
            device.host,
            summary.admin_state.as_deref().unwrap_or("unknown"),
            summary.oper_state.as_deref().unwrap_or("unknown"),
            summary.speed.as_deref().unwrap_or("-"),
            summary.duplex.as_deref().unwrap_or("-"),
        );

        let data = json!({
            "host": device.host,
            "port_id": summary.port_id,
            "admin_state": summary.admin_state,
            "oper_state": summary.oper_state,
            "speed": summary.speed,
            "duplex": summary.duplex,
            "vlan": summary.vlan,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": [command],
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    /// Single-port discovery: five required views plus an optional PoE
    /// lookup on the port's slot.
    pub(crate) async fn port_discover(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PortDiscoverArgs = parse_args(args)?;
        let (chassis, slot, _) = parse_port_id(&args.port_id)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();

        let port_id = args.port_id.as_str();

        let (cmd, status_res) = self
            .run_sanitized(&device, &format!("show interfaces {port_id} status"), None)
            .await?;
        commands.push(cmd);
        let status = parse_interfaces_status(&status_res.stdout)
            .remove(port_id)
            .unwrap_or_default();

        let (cmd, detail_res) = self
            .run_sanitized(&device, &format!("show interfaces {port_id}"), None)
            .await?;
        commands.push(cmd);
        let detail = parse_interface_detail(&detail_res.stdout, port_id);

        let (cmd, vlan_res) = self
            .run_sanitized(&device, &format!("show vlan members port {port_id}"), None)
            .await?;
        commands.push(cmd);
        let memberships = parse_vlan_members_port(&vlan_res.stdout);

        let (cmd, mac_res) = self
            .run_sanitized(&device, &format!("show mac-learning port {port_id}"), None)
            .await?;
        commands.push(cmd);
        let macs: Vec<MacEntry> = parse_mac_learning(&mac_res.stdout)
            .into_iter()
            .filter(|m| m.port == port_id)
            .collect();

        let (cmd, lldp_res) = self
            .run_sanitized(
                &device,
                &format!("show lldp port {port_id} remote-system"),
                None,
            )
            .await?;
        commands.push(cmd);
        let neighbor = parse_remote_system(&lldp_res.stdout)
            .into_iter()
            .find(|n| n.local_port == port_id);

        // PoE is optional: non-PoE slots simply fail the command.
        let poe_raw = format!("show lanpower slot {chassis}/{slot}");
        let poe = match self.run_sanitized(&device, &poe_raw, None).await {
            Ok((cmd, res)) if res.exit_status == Some(0) => {
                let report = parse_show_lanpower(&res.stdout);
                let entry = report.ports.into_iter().find(|p| p.port_id == port_id);
                if entry.is_some() {
                    commands.push(cmd);
                }
                entry
            },
            Ok(_) => None,
            Err(err) => {
                debug!(host = %device.host, error = %err, "lanpower not available");
                None
            },
        };

        let info = interface_info_json(
            port_id,
            &status,
            Some(&detail),
            &memberships,
            &macs,
            neighbor.as_ref(),
            poe.as_ref(),
        );

        let text = port_summary_text(&device.host, port_id, &status, neighbor.as_ref());

        let data = json!({
            "host": device.host,
            "port": info,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }

    /// All-ports discovery: outer-left join on port id starting from the
    /// status table.
    pub(crate) async fn interfaces_discover(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: InterfacesDiscoverArgs = parse_args(args)?;
        let device = Device::from_host(&args.host, args.port, None);
        let start = Instant::now();
        let mut commands = Vec::new();

        let (cmd, status_res) = self
            .run_sanitized(&device, "show interfaces status", None)
            .await?;
        commands.push(cmd);
        let status_map = parse_interfaces_status(&status_res.stdout);

        let details: BTreeMap<String, PortDetail> = if args.include_statistics {
            match self.run_sanitized(&device, "show interfaces", None).await {
                Ok((cmd, res)) => {
                    commands.push(cmd);
                    parse_all_interface_details(&res.stdout)
                },
                Err(err) => {
                    debug!(host = %device.host, error = %err, "detailed interface view unavailable");
                    BTreeMap::new()
                },
            }
        } else {
            BTreeMap::new()
        };

        let (cmd, vlan_res) = self.run_sanitized(&device, "show vlan members", None).await?;
        commands.push(cmd);
        let vlan_map = parse_vlan_members(&vlan_res.stdout);

        let (cmd, mac_res) = self.run_sanitized(&device, "show mac-learning", None).await?;
        commands.push(cmd);
        let mut mac_map: BTreeMap<String, Vec<MacEntry>> = BTreeMap::new();
        for entry in parse_mac_learning(&mac_res.stdout) {
            mac_map.entry(entry.port.clone()).or_default().push(entry);
        }

        let (cmd, lldp_res) = self
            .run_sanitized(&device, "show lldp remote-system", None)
            .await?;
        commands.push(cmd);
        let mut lldp_map: BTreeMap<String, LldpNeighbor> = BTreeMap::new();
        for neighbor in parse_remote_system(&lldp_res.stdout) {
            lldp_map.entry(neighbor.local_port.clone()).or_insert(neighbor);
        }

        // PoE probe: include the section only when the command succeeds and
        // actually looks like lanpower output.
        let mut poe_map: BTreeMap<String, PoePort> = BTreeMap::new();
        match self.run_sanitized(&device, "show lanpower slot 1/1", None).await {
            Ok((cmd, res))
                if res.exit_status == Some(0)
                    && res.stdout.to_ascii_lowercase().contains("lanpower") =>
            {
                commands.push(cmd);
                for port in parse_show_lanpower(&res.stdout).ports {
                    poe_map.insert(port.port_id.clone(), port);
                }
            },
            Ok(_) => {},
            Err(err) => {
                debug!(host = %device.host, error = %err, "PoE probe failed");
            },
        }

        let empty_memberships: Vec<VlanMembership> = Vec::new();
        let empty_macs: Vec<MacEntry> = Vec::new();

        let mut ports = Vec::new();
        let mut active_ports = 0usize;
        for (port_id, status) in &status_map {
            if !args.include_inactive && status.oper_state != "up" {
                continue;
            }
            if status.oper_state == "up" {
                active_ports += 1;
            }
            ports.push(interface_info_json(
                port_id,
                status,
                details.get(port_id),
                vlan_map.get(port_id).unwrap_or(&empty_memberships),
                mac_map.get(port_id).unwrap_or(&empty_macs),
                lldp_map.get(port_id),
                poe_map.get(port_id),
            ));
        }

        let text = format!(
            "**Interface Discovery: {}**\n\nTotal ports: {}\nActive ports: {}\nLLDP neighbors: {}\nPoE ports: {}\n",
            device.host,
            ports.len(),
            active_ports,
            lldp_map.len(),
            poe_map.len(),
        );

        let data = json!({
            "host": device.host,
            "total_ports": ports.len(),
            "active_ports": active_ports,
            "ports": ports,
            "duration_ms": start.elapsed().as_millis() as u64,
            "commands_executed": commands,
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(text)))
    }
}

/// Assemble the unified per-port record from the per-source pieces.
fn interface_info_json(
    port_id: &str,
    status: &PortStatus,
    detail: Option<&PortDetail>,
    memberships: &[VlanMembership],
    macs: &[MacEntry],
    neighbor: Option<&LldpNeighbor>,
    poe: Option<&PoePort>,
) -> Value {
    let mut untagged: Option<u32> = None;
    let mut vlan_status: Option<&str> = None;
    let mut tagged: Vec<u32> = Vec::new();
    for membership in memberships {
        match membership.r#type.as_str() {
            "untagged" => {
                untagged = Some(membership.vlan_id);
                vlan_status = Some(&membership.status);
            },
            "tagged" => tagged.push(membership.vlan_id),
            _ => {},
        }
    }

    let statistics = detail.and_then(|d| (!d.counters.is_empty()).then(|| &d.counters));

    json!({
        "port_id": port_id,
        "admin_state": status.admin_state,
        "oper_state": status.oper_state,
        "speed": status.speed,
        "duplex": status.duplex,
        "auto_neg": status.auto_neg,
        "interface_type": detail.and_then(|d| d.interface_type.clone()),
        "sfp_type": detail.and_then(|d| d.sfp_type.clone()),
        "mac_address": detail.and_then(|d| d.mac_address.clone()),
        "vlan": {
            "untagged": untagged,
            "tagged": tagged,
            "status": vlan_status,
        },
        "mac_addresses": macs.iter().map(|m| json!({
            "mac": m.mac_address,
            "vlan": m.vlan,
            "type": m.r#type,
        })).collect::<Vec<_>>(),
        "lldp_neighbor": neighbor,
        "poe": poe.map(|p| json!({
            "enabled": p.admin_state == "ON",
            "status": p.status,
            "power_used_mw": p.actual_used_mw,
            "max_power_mw": p.max_power_mw,
            "device_class": p.class,
            "priority": p.priority,
        })),
        "statistics": statistics,
        "description": Value::Null,
    })
}

fn port_summary_text(
    host: &str,
    port_id: &str,
    status: &PortStatus,
    neighbor: Option<&LldpNeighbor>,
) -> String {
    let mut text = format!(
        "**Port {port_id} on {host}**\n\nAdmin: {} | Oper: {}\n",
        status.admin_state, status.oper_state,
    );
    if let Some(ref speed) = status.speed {
        text.push_str(&format!("Speed: {speed}"));
        if let Some(ref duplex) = status.duplex {
            text.push_str(&format!(" ({duplex})"));
        }
        text.push('\n');
    }
    if let Some(neighbor) = neighbor {
        text.push_str(&format!(
            "Neighbor: {}\n",
            neighbor.system_name.as_deref().unwrap_or("unknown")
        ));
    }
    text
}
