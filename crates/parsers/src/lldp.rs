//! Parsers for `show lldp remote-system` and the local management address.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// Accept both block header forms:
// - AOS 5:  "Remote LLDP Agents on Local Slot/Port: 2/47,"
// - AOS 8+: "Remote LLDP nearest-bridge Agents on Local Port 1/1/25:"
static RE_PORT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"^Remote LLDP(?:\s+\S+)*\s+Agents on Local\s+(?:Slot/Port:\s*|Port\s+)([0-9]+(?:/[0-9]+)+)\s*[:,]?\s*$",
    )
});

static RE_CHASSIS_PORT: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^\s*Chassis\s+([^,]+),\s*Port\s+(.+):\s*$"));

static RE_KV: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^\s*([A-Za-z0-9 /_-]+?)\s*=\s*(.*?),?\s*$"));

static RE_IPV4: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"\b(?:\d{1,3}\.){3}\d{1,3}\b"));

static RE_WS: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"\s+"));

/// A neighbor learned on one local port.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LldpNeighbor {
    pub local_port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_description: Option<String>,
    /// First IPv4 found in the management-address field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<String>,
}

/// Parse `show lldp remote-system` output (all-port and per-port forms).
///
/// Blocks start with a local-port header; AOS8 blocks additionally carry a
/// `Chassis <id>, Port <id>:` line. `(null)` values collapse to empty.
#[must_use]
pub fn parse_remote_system(output: &str) -> Vec<LldpNeighbor> {
    let mut neighbors: Vec<LldpNeighbor> = Vec::new();
    let mut current: Option<LldpNeighbor> = None;

    for raw_line in output.lines() {
        let line = raw_line.trim_end_matches(['\r', '\n']);

        if let Some(caps) = RE_PORT_HEADER.captures(line.trim()) {
            if let Some(done) = current.take() {
                neighbors.push(done);
            }
            current = Some(LldpNeighbor {
                local_port: caps[1].to_string(),
                ..LldpNeighbor::default()
            });
            continue;
        }

        let Some(neighbor) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = RE_CHASSIS_PORT.captures(line) {
            neighbor.chassis_id = Some(caps[1].trim().to_string());
            neighbor.port_id = Some(caps[2].trim().to_string());
            continue;
        }

        let Some(caps) = RE_KV.captures(line) else {
            continue;
        };
        let key = RE_WS.replace_all(caps[1].trim(), " ").to_ascii_lowercase();
        let mut value = caps[2].trim().trim_matches('"').to_string();
        if value == "(null)" {
            value.clear();
        }

        if key.starts_with("chassis id") && !key.contains("subtype") {
            neighbor.chassis_id = Some(value);
        } else if key.starts_with("port id") && !key.contains("subtype") {
            neighbor.port_id = Some(value);
        } else if key.starts_with("port description") {
            neighbor.port_description = (!value.is_empty()).then_some(value);
        } else if key.starts_with("system name") {
            neighbor.system_name = (!value.is_empty()).then_some(value);
        } else if key.starts_with("system description") {
            neighbor.system_description = (!value.is_empty()).then_some(value);
        } else if key.contains("management ip address") || key.contains("management address") {
            if let Some(ip) = RE_IPV4.find(&value) {
                neighbor.management_ip = Some(ip.as_str().to_string());
            }
        } else if key.starts_with("capabilities enabled") || key == "capabilities" {
            neighbor.capabilities = (!value.is_empty()).then_some(value);
        }
    }

    if let Some(done) = current {
        neighbors.push(done);
    }

    neighbors
}

/// Parse `show lldp local-management-address`, returning the first IPv4.
#[must_use]
pub fn parse_local_management_address(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(rest) = line.split_once("Management IP Address").map(|(_, r)| r) {
            if let Some(ip) = RE_IPV4.find(rest) {
                return Some(ip.as_str().to_string());
            }
        }
    }
    None
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const AOS8_REMOTE: &str = "\
Remote LLDP nearest-bridge Agents on Local Port 1/1/19:
  Chassis 10.9.19.60, Port 00:15:65:d3:71:99:
    Remote ID                 = 3,
    Chassis Subtype           = 5 (Network Address),
    Port Subtype              = 3 (Mac Address),
    Port Description          = WAN PORT,
    System Name               = SIP-T46U,
    System Description        = 108.86.0.55.0.0,
    Capabilities Supported    = Bridge Telephone,
    Capabilities Enabled      = Bridge Telephone,
    Management IP Address     = 10.9.19.60,
Remote LLDP nearest-bridge Agents on Local Port 1/1/25:
  Chassis 2c:fa:a2:11:22:33, Port 1016:
    Port Description          = (null),
    System Name               = SW-ACCESS-02,
    System Description        = Alcatel-Lucent Enterprise OS6560-P24Z8,
";

    const AOS5_REMOTE: &str = "\
Remote LLDP Agents on Local Slot/Port: 2/47,
  Chassis ID                = 00:d0:95:e9:c9:2e,
  Port ID                   = 617,
  Port Description          = Uplink to core,
  System Name               = old-core,
  Management IP Address     = 10.255.11.100,
";

    #[test]
    fn aos8_blocks_parse_per_port() {
        let neighbors = parse_remote_system(AOS8_REMOTE);
        assert_eq!(neighbors.len(), 2);

        let phone = &neighbors[0];
        assert_eq!(phone.local_port, "1/1/19");
        assert_eq!(phone.chassis_id.as_deref(), Some("10.9.19.60"));
        assert_eq!(phone.port_id.as_deref(), Some("00:15:65:d3:71:99"));
        assert_eq!(phone.system_name.as_deref(), Some("SIP-T46U"));
        assert_eq!(phone.management_ip.as_deref(), Some("10.9.19.60"));
        assert_eq!(phone.capabilities.as_deref(), Some("Bridge Telephone"));
    }

    #[test]
    fn null_values_become_empty() {
        let neighbors = parse_remote_system(AOS8_REMOTE);
        let access = &neighbors[1];
        assert_eq!(access.local_port, "1/1/25");
        assert!(access.port_description.is_none());
        assert_eq!(access.system_name.as_deref(), Some("SW-ACCESS-02"));
    }

    #[test]
    fn aos5_header_form_parses() {
        let neighbors = parse_remote_system(AOS5_REMOTE);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].local_port, "2/47");
        assert_eq!(neighbors[0].chassis_id.as_deref(), Some("00:d0:95:e9:c9:2e"));
        assert_eq!(neighbors[0].port_id.as_deref(), Some("617"));
        assert_eq!(neighbors[0].management_ip.as_deref(), Some("10.255.11.100"));
    }

    #[test]
    fn local_management_address_returns_first_ipv4() {
        let out = "\
Local LLDP Agent Management Address:
  Management Address Type = 1 (IPv4),
  Management IP Address = 10.255.11.100
";
        assert_eq!(
            parse_local_management_address(out).as_deref(),
            Some("10.255.11.100")
        );
        assert!(parse_local_management_address("nothing here").is_none());
    }

    #[test]
    fn no_blocks_yields_empty() {
        assert!(parse_remote_system("Nothing to report\n").is_empty());
    }
}
