//! The static tool catalog. Every tool is compiled in; there is no plugin
//! surface. Schemas here are the source of truth for argument validation
//! documentation returned to clients.

use {
    serde::Deserialize,
    serde_json::{json, Value},
};

use crate::types::ToolInfo;

/// Rendering mode for tool listings, so small LLM clients can avoid token
/// bloat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Names, descriptions, and both schemas.
    #[default]
    Full,
    /// Names and descriptions only.
    Compact,
    /// Names only.
    UltraCompact,
}

fn host_prop() -> Value {
    json!({ "type": "string", "description": "Target switch IP address or hostname" })
}

fn port_prop() -> Value {
    json!({ "type": "integer", "description": "SSH port (default: 22)", "default": 22 })
}

fn port_id_prop() -> Value {
    json!({ "type": "string", "description": "Port identifier (chassis/slot/port, e.g. '1/1/19')" })
}

fn commands_executed_prop() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// The full catalog.
#[must_use]
pub fn tool_infos() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: "aos.cli.readonly",
            description: "Execute a read-only CLI command on an OmniSwitch and return the raw output. Commands are checked against the allow/deny policy and outputs are redacted.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "command": { "type": "string", "description": "CLI command to execute (read-only)" },
                    "port": port_prop(),
                    "username": { "type": "string", "description": "SSH username override" },
                    "timeout_s": { "type": "integer", "description": "Command timeout in seconds" },
                },
                "required": ["host", "command"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "command": { "type": "string" },
                    "stdout": { "type": "string" },
                    "stderr": { "type": "string" },
                    "exit_status": { "type": ["integer", "null"] },
                    "duration_ms": { "type": "integer" },
                    "truncated": { "type": "boolean" },
                    "redacted": { "type": "boolean" },
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.diag.ping",
            description: "Ping a destination from the switch using the configured command template.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "destination": { "type": "string", "description": "Ping destination IP or hostname" },
                    "count": { "type": "integer", "description": "Probe count", "default": 5 },
                    "port": port_prop(),
                    "timeout_s": { "type": "integer" },
                },
                "required": ["host", "destination"],
            }),
            output_schema: cli_output_schema(),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.diag.traceroute",
            description: "Trace the route to a destination from the switch using the configured command template.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "destination": { "type": "string", "description": "Traceroute destination IP or hostname" },
                    "port": port_prop(),
                    "timeout_s": { "type": "integer" },
                },
                "required": ["host", "destination"],
            }),
            output_schema: cli_output_schema(),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.diag.poe",
            description: "Parsed Power-over-Ethernet diagnostics: per-port power, status, priority, and class, plus the chassis power budget.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "slot": { "type": "string", "description": "Slot selector ('1' or '1/1'); defaults to slot 1" },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "command": { "type": "string" },
                    "ports": { "type": "array" },
                    "chassis_summary": { "type": "object" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.poe.restart",
            description: "Restart PoE on one port: disable inline power, wait, then re-enable. The only write operation in the catalog.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port_id": port_id_prop(),
                    "port": port_prop(),
                    "username": { "type": "string" },
                    "wait_seconds": { "type": "integer", "description": "Seconds between disable and enable", "default": 5 },
                },
                "required": ["host", "port_id"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port_id": { "type": "string" },
                    "wait_seconds": { "type": "integer" },
                    "stop_command": { "type": "string" },
                    "start_command": { "type": "string" },
                    "stop_result": { "type": "string" },
                    "start_result": { "type": "string" },
                    "success": { "type": "boolean" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.device.facts",
            description: "Collect normalized device facts: model, serial, software version, uptime, base MAC, and hardware details where available.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "hostname": { "type": ["string", "null"] },
                    "model": { "type": ["string", "null"] },
                    "aos_version": { "type": ["string", "null"] },
                    "serial_number": { "type": ["string", "null"] },
                    "uptime": { "type": ["string", "null"] },
                    "mac_address": { "type": ["string", "null"] },
                    "facts": { "type": "object" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.port.info",
            description: "Quick view of a single port: admin/operational state, speed, duplex, and VLAN.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port_id": port_id_prop(),
                    "port": port_prop(),
                },
                "required": ["host", "port_id"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port_id": { "type": "string" },
                    "admin_state": { "type": ["string", "null"] },
                    "oper_state": { "type": ["string", "null"] },
                    "speed": { "type": ["string", "null"] },
                    "duplex": { "type": ["string", "null"] },
                    "vlan": { "type": ["string", "null"] },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.port.discover",
            description: "Complete discovery of one port: status, physical layer, VLANs, learned MACs, LLDP neighbor, and PoE where available.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port_id": port_id_prop(),
                    "port": port_prop(),
                },
                "required": ["host", "port_id"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "object" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.interfaces.discover",
            description: "Discover all interfaces with VLANs, learned MACs, LLDP neighbors, and PoE, aggregated per port.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port": port_prop(),
                    "include_inactive": { "type": "boolean", "description": "Include operationally down ports", "default": true },
                    "include_statistics": { "type": "boolean", "description": "Include traffic statistics (slower)", "default": false },
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "total_ports": { "type": "integer" },
                    "active_ports": { "type": "integer" },
                    "ports": { "type": "array" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.vlan.audit",
            description: "Audit VLAN configuration: per-VLAN states, summary statistics, and derived configuration issues.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "vlan_id": { "type": "integer", "description": "Audit a single VLAN instead of all" },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "total_vlans": { "type": "integer" },
                "vlans": { "type": "array" },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.routing.audit",
            description: "Audit routing state per VRF: OSPF areas, interfaces, and neighbors, IP interfaces, and optionally the route table.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port": port_prop(),
                    "include_routes": { "type": "boolean", "description": "Include the route table (can be large)", "default": false },
                    "route_limit": { "type": "integer", "description": "Max routes to include", "default": 100 },
                    "protocol_filter": { "type": "string", "description": "Filter routes by protocol (OSPF, STATIC, LOCAL, ...)" },
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "vrfs": { "type": "array" },
                "total_routes": { "type": "integer" },
                "routes": { "type": ["array", "null"] },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.spantree.audit",
            description: "Audit spanning tree: mode, CIST, per-port and per-VLAN state, with derived issues such as non-forwarding root ports.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "mode": { "type": "object" },
                "cist": { "type": "object" },
                "ports": { "type": "array" },
                "vlans": { "type": "array" },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.config.backup",
            description: "Dump the running configuration via 'write terminal' and return it with size and timestamp.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "username": { "type": "string" },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "config": { "type": "string" },
                    "size_bytes": { "type": "integer" },
                    "truncated": { "type": "boolean" },
                    "timestamp": { "type": "integer" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.health.monitor",
            description: "Module health: CPU and memory usage, RX/TX errors, rolled-up overall status, and threshold violations.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "all": { "type": "boolean", "description": "Run 'show health all'", "default": false },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "overall_status": { "type": "string" },
                    "modules": { "type": "array" },
                    "issues": { "type": "array", "items": { "type": "string" } },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.chassis.status",
            description: "Chassis environment: model and serial plus temperature, fans, power supplies, and CMM state with derived issues.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "include_temperature": { "type": "boolean", "default": true },
                    "include_fans": { "type": "boolean", "default": true },
                    "include_power": { "type": "boolean", "default": true },
                    "include_cmm": { "type": "boolean", "default": true },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "chassis": { "type": "object" },
                    "temperature": { "type": ["object", "null"] },
                    "fans": { "type": ["array", "null"] },
                    "power_supplies": { "type": ["array", "null"] },
                    "cmm": { "type": ["object", "null"] },
                    "issues": { "type": "array", "items": { "type": "string" } },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.mac.lookup",
            description: "Find where a MAC lives, resolve an IP through ARP, or dump a VLAN's MAC table. Accepts colon or dash separated MACs.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "mac_address": { "type": "string", "description": "MAC to search for ('aa:bb:…' or 'aa-bb-…')" },
                    "ip_address": { "type": "string", "description": "IP to resolve via ARP" },
                    "vlan": { "type": "integer", "description": "Dump this VLAN's table" },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "query": { "type": "object" },
                    "entries": { "type": "array" },
                    "total": { "type": "integer" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.lacp.info",
            description: "Link aggregation state: LAGs with admin/operational status, LACP system id, and derived issues.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "lags": { "type": "array" },
                "total_lags": { "type": "integer" },
                "lacp_enabled": { "type": "boolean" },
                "lacp": { "type": ["object", "null"] },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.ntp.status",
            description: "NTP synchronization state, stratum, offset, and configured servers with reachability.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "include_servers": { "type": "boolean", "default": true },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "status": { "type": "object" },
                "servers": { "type": "array" },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.dhcp.relay.info",
            description: "DHCP relay configuration and health: global settings, per-interface servers and state, plus message counters.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "include_counters": { "type": "boolean", "default": true },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: audit_output_schema(json!({
                "relay": { "type": "object" },
                "interfaces": { "type": "array" },
                "counters": { "type": ["object", "null"] },
                "statistics": { "type": ["object", "null"] },
            })),
            required_scopes: Vec::new(),
        },
        ToolInfo {
            name: "aos.lldp.neighbors",
            description: "LLDP neighbors per local port, optionally filtered to one port.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "host": host_prop(),
                    "local_port": { "type": "string", "description": "Only neighbors on this local port" },
                    "port": port_prop(),
                },
                "required": ["host"],
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "local_port": { "type": ["string", "null"] },
                    "neighbors": { "type": "array" },
                    "total": { "type": "integer" },
                    "duration_ms": { "type": "integer" },
                    "commands_executed": commands_executed_prop(),
                },
            }),
            required_scopes: Vec::new(),
        },
    ]
}

fn cli_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "host": { "type": "string" },
            "command": { "type": "string" },
            "stdout": { "type": "string" },
            "stderr": { "type": "string" },
            "exit_status": { "type": ["integer", "null"] },
            "duration_ms": { "type": "integer" },
            "truncated": { "type": "boolean" },
            "redacted": { "type": "boolean" },
        },
    })
}

/// Common envelope for audit-style outputs; `extra` adds the tool-specific
/// sections.
fn audit_output_schema(extra: Value) -> Value {
    let mut properties = json!({
        "host": { "type": "string" },
        "issues": { "type": "array", "items": { "type": "string" } },
        "duration_ms": { "type": "integer" },
        "commands_executed": commands_executed_prop(),
    });
    if let (Some(base), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    json!({ "type": "object", "properties": properties })
}

/// Render the catalog for one listing mode.
#[must_use]
pub fn render_catalog(mode: ListMode) -> Value {
    let tools = tool_infos();
    match mode {
        ListMode::Full => json!({
            "tools": tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
                "output_schema": t.output_schema,
                "required_scopes": t.required_scopes,
            })).collect::<Vec<_>>(),
        }),
        ListMode::Compact => json!({
            "tools": tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
            })).collect::<Vec<_>>(),
        }),
        ListMode::UltraCompact => json!({
            "tools": tools.iter().map(|t| t.name).collect::<Vec<_>>(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique_and_dotted() {
        let tools = tool_infos();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(tools.len(), 20);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
        assert!(tools.iter().all(|t| t.name.starts_with("aos.")));
    }

    #[test]
    fn every_tool_requires_host() {
        for tool in tool_infos() {
            let required = tool.input_schema["required"]
                .as_array()
                .unwrap_or_else(|| panic!("{} missing required list", tool.name));
            assert!(
                required.iter().any(|r| r == "host"),
                "{} does not require host",
                tool.name
            );
        }
    }

    #[test]
    fn list_modes_shrink_monotonically() {
        let full = render_catalog(ListMode::Full).to_string();
        let compact = render_catalog(ListMode::Compact).to_string();
        let ultra = render_catalog(ListMode::UltraCompact).to_string();
        assert!(full.len() > compact.len());
        assert!(compact.len() > ultra.len());
    }

    #[test]
    fn mode_parses_from_snake_case() {
        let mode: ListMode = serde_json::from_value(json!("ultra_compact")).expect("mode");
        assert_eq!(mode, ListMode::UltraCompact);
    }
}
