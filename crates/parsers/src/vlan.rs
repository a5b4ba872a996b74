//! Parsers for `show vlan` and `show vlan members`.

use std::{collections::BTreeMap, sync::LazyLock};

use {
    regex::Regex,
    serde::Serialize,
};

static RE_VLAN_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"^\s*(\d+)\s+(\w+)\s+(Ena|Dis)\s+(Ena|Dis)\s+(Ena|Dis)\s+(\d+)\s+(.*)$")
});

static RE_MEMBER_WITH_PORT: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^\s*(\d+)\s+(\d+/\d+/\d+)\s+(\S+)\s+(\S+)"));

static RE_MEMBER_NO_PORT: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^\s*(\d+)\s+(\S+)\s+(\S+)"));

/// One row of the `show vlan` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlanRow {
    pub vlan_id: u32,
    pub name: String,
    pub r#type: String,
    pub admin_state: String,
    pub oper_state: String,
    pub ip_routing: String,
    pub mtu: u32,
    /// Populated from the single-VLAN detail view when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_tunneling: Option<String>,
}

/// Parse `show vlan` output, skipping legend/header/separator lines.
#[must_use]
pub fn parse_show_vlan(output: &str) -> Vec<VlanRow> {
    let mut vlans = Vec::new();

    for line in output.lines() {
        let lower = line.to_ascii_lowercase();
        if (lower.contains("vlan") && lower.contains("type")) || line.contains("----") {
            continue;
        }
        let Some(caps) = RE_VLAN_ROW.captures(line) else {
            continue;
        };
        let (Ok(vlan_id), Ok(mtu)) = (caps[1].parse(), caps[6].parse()) else {
            continue;
        };
        vlans.push(VlanRow {
            vlan_id,
            name: caps[7].trim().to_string(),
            r#type: caps[2].to_string(),
            admin_state: caps[3].to_string(),
            oper_state: caps[4].to_string(),
            ip_routing: caps[5].to_string(),
            mtu,
            mac_tunneling: None,
        });
    }

    vlans
}

/// Detail record from `show vlan <id>` (key/value form).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VlanDetail {
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub admin_state: Option<String>,
    pub oper_state: Option<String>,
    pub ip_routing: Option<String>,
    pub mtu: Option<u32>,
    pub mac_tunneling: Option<String>,
}

/// Parse `show vlan <id>` output.
#[must_use]
pub fn parse_show_vlan_detail(output: &str) -> VlanDetail {
    let mut detail = VlanDetail::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_end_matches(',').to_string();

        match key {
            "Name" => detail.name = Some(value),
            "Type" => detail.r#type = Some(value),
            "Administrative State" => detail.admin_state = Some(value),
            "Operational State" => detail.oper_state = Some(value),
            "IP Routing" => detail.ip_routing = Some(value),
            "IP MTU" => detail.mtu = value.parse().ok(),
            "MAC Tunneling" => detail.mac_tunneling = Some(value),
            _ => {},
        }
    }

    detail
}

/// A port's membership in one VLAN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlanMembership {
    pub vlan_id: u32,
    /// `tagged` or `untagged`.
    pub r#type: String,
    /// `forwarding` or `inactive`.
    pub status: String,
}

/// Parse `show vlan members` (all-ports form: vlan, port, type, status).
#[must_use]
pub fn parse_vlan_members(output: &str) -> BTreeMap<String, Vec<VlanMembership>> {
    let mut port_vlans: BTreeMap<String, Vec<VlanMembership>> = BTreeMap::new();

    for line in output.lines() {
        if line.to_ascii_lowercase().contains("vlan") || line.contains("----") {
            continue;
        }
        let Some(caps) = RE_MEMBER_WITH_PORT.captures(line) else {
            continue;
        };
        let Ok(vlan_id) = caps[1].parse() else {
            continue;
        };
        port_vlans.entry(caps[2].to_string()).or_default().push(VlanMembership {
            vlan_id,
            r#type: caps[3].to_string(),
            status: caps[4].to_string(),
        });
    }

    port_vlans
}

/// Parse `show vlan members port <id>` (single-port form — no port column).
#[must_use]
pub fn parse_vlan_members_port(output: &str) -> Vec<VlanMembership> {
    let mut vlans = Vec::new();

    for line in output.lines() {
        if line.to_ascii_lowercase().contains("vlan") || line.contains("----") {
            continue;
        }
        let Some(caps) = RE_MEMBER_NO_PORT.captures(line) else {
            continue;
        };
        let Ok(vlan_id) = caps[1].parse() else {
            continue;
        };
        vlans.push(VlanMembership {
            vlan_id,
            r#type: caps[2].to_string(),
            status: caps[3].to_string(),
        });
    }

    vlans
}
