//! Parsers for VRF, route table, OSPF, and IP interface commands.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

static RE_VRF_ROW: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^(\S+)\s+(\S+)\s+(.+)$"));

static RE_TOTAL_ROUTES: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"Total\s+(\d+)\s+routes"));

/// One VRF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vrf {
    pub name: String,
    pub profile: String,
    pub protocols: Vec<String>,
}

/// Parse `show vrf` output.
#[must_use]
pub fn parse_show_vrf(output: &str) -> Vec<Vrf> {
    let mut vrfs = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.contains("Virtual Routers")
            || line.contains("---")
            || line.contains("Total Number")
        {
            continue;
        }
        let Some(caps) = RE_VRF_ROW.captures(line) else {
            continue;
        };
        vrfs.push(Vrf {
            name: caps[1].to_string(),
            profile: caps[2].to_string(),
            protocols: caps[3].split_whitespace().map(str::to_string).collect(),
        });
    }

    vrfs
}

/// One routing-table entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub destination: String,
    pub gateway: String,
    /// May span several tokens ("36d 3h"); absent on ageless rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    pub protocol: String,
}

/// Parsed `show ip routes` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteTable {
    pub total_routes: u64,
    pub routes: Vec<Route>,
    pub truncated: bool,
}

/// Parse `show ip routes` output.
///
/// The age column may be multi-token, so the protocol is always the last
/// token and the age is everything between the gateway and the protocol.
#[must_use]
pub fn parse_show_ip_routes(
    output: &str,
    limit: Option<usize>,
    protocol_filter: Option<&str>,
) -> RouteTable {
    let mut table = RouteTable::default();

    for line in output.lines() {
        if let Some(caps) = RE_TOTAL_ROUTES.captures(line) {
            table.total_routes = caps[1].parse().unwrap_or(0);
            break;
        }
    }

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.contains("Dest Address")
            || line.contains("---")
            || line.contains('+')
            || line.contains("Total")
        {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let destination = parts[0].to_string();
        let gateway = parts[1].to_string();
        let (age, protocol) = match parts.len() {
            3 => (None, parts[2].to_string()),
            4 => (Some(parts[2].to_string()), parts[3].to_string()),
            _ => (
                Some(parts[2..parts.len() - 1].join(" ")),
                parts[parts.len() - 1].to_string(),
            ),
        };

        if let Some(filter) = protocol_filter {
            if !protocol.eq_ignore_ascii_case(filter) {
                continue;
            }
        }

        table.routes.push(Route {
            destination,
            gateway,
            age,
            protocol,
        });

        if let Some(max) = limit {
            if table.routes.len() >= max {
                break;
            }
        }
    }

    table.truncated = limit.is_some_and(|max| table.total_routes > max as u64);
    table
}

/// One OSPF interface row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OspfInterface {
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dr_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oper_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bfd_status: Option<String>,
}

/// Parse `show ip ospf interface` output.
#[must_use]
pub fn parse_ospf_interfaces(output: &str) -> Vec<OspfInterface> {
    let mut interfaces = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("Interface") || line.contains("---") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 8 {
            continue;
        }
        interfaces.push(OspfInterface {
            interface: parts[0].to_string(),
            dr_address: parts.get(3).map(|s| s.to_string()),
            backup_dr: parts.get(4).map(|s| s.to_string()),
            admin_status: parts.get(5).map(|s| s.to_string()),
            oper_status: parts.get(6).map(|s| s.to_string()),
            state: parts.get(7).map(|s| s.to_string()),
            bfd_status: parts.get(8).map(|s| s.to_string()),
        });
    }

    interfaces
}

/// One OSPF neighbor row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OspfNeighbor {
    pub router_id: String,
    pub address: String,
    pub area_id: String,
    pub interface: String,
    pub state: String,
}

/// Parse `show ip ospf neighbor` output.
#[must_use]
pub fn parse_ospf_neighbors(output: &str) -> Vec<OspfNeighbor> {
    let mut neighbors = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("---") || line.contains("Total") {
            continue;
        }
        if line.contains("IP") && line.contains("Address") && line.contains("Area") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        neighbors.push(OspfNeighbor {
            router_id: parts[0].to_string(),
            address: parts[1].to_string(),
            area_id: parts[2].to_string(),
            interface: format!("{} {}", parts[3], parts[4]),
            state: parts[5].to_string(),
        });
    }

    neighbors
}

/// One OSPF area row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OspfArea {
    pub area_id: String,
    pub admin_status: String,
    pub r#type: String,
    pub oper_status: String,
}

/// Parse `show ip ospf area` output.
#[must_use]
pub fn parse_ospf_areas(output: &str) -> Vec<OspfArea> {
    let mut areas = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("Area Id") || line.contains("---") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        areas.push(OspfArea {
            area_id: parts[0].to_string(),
            admin_status: parts[1].to_string(),
            r#type: parts[2].to_string(),
            oper_status: parts[3].to_string(),
        });
    }

    areas
}

/// One IP interface row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IpInterface {
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oper_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Parse `show ip interface` output.
#[must_use]
pub fn parse_ip_interfaces(output: &str) -> Vec<IpInterface> {
    let mut interfaces = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("IP Address") || line.contains("---") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        interfaces.push(IpInterface {
            interface: parts[0].to_string(),
            ip_address: parts.get(1).map(|s| s.to_string()),
            admin_status: parts.get(2).map(|s| s.to_string()),
            oper_status: parts.get(3).map(|s| s.to_string()),
            state: parts.get(4).map(|s| s.to_string()),
        });
    }

    interfaces
}

/// One static route row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StaticRoute {
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Parse `show ip static-routes` output.
#[must_use]
pub fn parse_static_routes(output: &str) -> Vec<StaticRoute> {
    let mut routes = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.contains("Destination")
            || line.contains("---")
            || line.contains("No static")
        {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        routes.push(StaticRoute {
            destination: parts[0].to_string(),
            gateway: parts.get(1).map(|s| s.to_string()),
            metric: parts.get(2).map(|s| s.to_string()),
            distance: parts.get(3).map(|s| s.to_string()),
        });
    }

    routes
}
