//! Parsers for the `show interfaces` command family.

use std::{collections::BTreeMap, sync::LazyLock};

use {
    regex::Regex,
    serde::Serialize,
};

static RE_STATUS_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"^\s*(\d+/\d+/\d+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)")
});

static RE_PORT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"Chassis/Slot/Port\s*:\s*(\d+/\d+/\d+)"));

/// One row of the `show interfaces status` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortStatus {
    pub admin_state: String,
    /// Derived: `down` iff the detected speed column is `-`.
    pub oper_state: String,
    pub auto_neg: bool,
    pub speed: Option<String>,
    pub duplex: Option<String>,
}

impl Default for PortStatus {
    fn default() -> Self {
        Self {
            admin_state: "unknown".into(),
            oper_state: "unknown".into(),
            auto_neg: true,
            speed: None,
            duplex: None,
        }
    }
}

/// Parse `show interfaces status` (or the single-port
/// `show interfaces <port> status` form, which shares the layout).
///
/// The data region begins after the dashed separator line; everything
/// before it is header noise.
#[must_use]
pub fn parse_interfaces_status(output: &str) -> BTreeMap<String, PortStatus> {
    let mut interfaces = BTreeMap::new();
    let mut in_data = false;

    for line in output.lines() {
        if line.contains("-------") {
            in_data = true;
            continue;
        }
        if !in_data {
            continue;
        }

        let Some(caps) = RE_STATUS_ROW.captures(line) else {
            continue;
        };

        let speed = &caps[4];
        let duplex = &caps[5];
        let status = PortStatus {
            admin_state: if &caps[2] == "en" { "enabled" } else { "disabled" }.into(),
            oper_state: if speed == "-" { "down" } else { "up" }.into(),
            auto_neg: &caps[3] == "en",
            speed: match speed {
                "-" => None,
                s if s.chars().all(|c| c.is_ascii_digit()) => Some(format!("{s}Mbps")),
                s => Some(s.to_string()),
            },
            duplex: if duplex == "-" { None } else { Some(duplex.to_string()) },
        };
        interfaces.insert(caps[1].to_string(), status);
    }

    interfaces
}

/// Traffic counters from the detailed `show interfaces` view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortCounters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_unicast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_broadcast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_multicast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_errors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_unicast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_broadcast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_multicast: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_errors: Option<u64>,
}

impl PortCounters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Physical-layer detail from `show interfaces <port>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortDetail {
    pub port_id: String,
    pub interface_type: Option<String>,
    pub sfp_type: Option<String>,
    pub mac_address: Option<String>,
    pub counters: PortCounters,
}

fn capture_u64(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text).and_then(|c| c[1].parse().ok())
}

static RE_IFACE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Interface Type\s*:\s*(\w+)"));
static RE_SFP: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"(?i)SFP/XFP\s*:\s*([^,]+),"));
static RE_MAC_ADDR: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)MAC address\s*:\s*([0-9a-f:]+)"));
static RE_RX_BYTES: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"Bytes Received\s*:\s*(\d+)"));
static RE_TX_BYTES: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"Bytes Xmitted\s*:\s*(\d+)"));
static RE_RX_UCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Rx.*?Unicast Frames\s*:\s*(\d+)"));
static RE_RX_BCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Rx.*?Broadcast Frames:\s*(\d+)"));
static RE_RX_MCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Rx.*?M-cast Frames\s*:\s*(\d+)"));
static RE_RX_ERR: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Rx.*?Error Frames\s*:\s*(\d+)"));
static RE_TX_UCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Tx.*?Unicast Frames\s*:\s*(\d+)"));
static RE_TX_BCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Tx.*?Broadcast Frames:\s*(\d+)"));
static RE_TX_MCAST: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Tx.*?M-cast Frames\s*:\s*(\d+)"));
static RE_TX_ERR: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?s)Tx.*?Error Frames\s*:\s*(\d+)"));

/// Parse a single detailed interface block.
#[must_use]
pub fn parse_interface_detail(output: &str, port_id: &str) -> PortDetail {
    let mut detail = PortDetail {
        port_id: port_id.to_string(),
        ..PortDetail::default()
    };

    if let Some(caps) = RE_IFACE_TYPE.captures(output) {
        detail.interface_type = Some(caps[1].to_string());
    }
    if let Some(caps) = RE_SFP.captures(output) {
        let val = caps[1].trim();
        if val != "N/A" {
            detail.sfp_type = Some(val.to_string());
        }
    }
    if let Some(caps) = RE_MAC_ADDR.captures(output) {
        detail.mac_address = Some(caps[1].to_string());
    }

    detail.counters = PortCounters {
        rx_bytes: capture_u64(&RE_RX_BYTES, output),
        rx_unicast: capture_u64(&RE_RX_UCAST, output),
        rx_broadcast: capture_u64(&RE_RX_BCAST, output),
        rx_multicast: capture_u64(&RE_RX_MCAST, output),
        rx_errors: capture_u64(&RE_RX_ERR, output),
        tx_bytes: capture_u64(&RE_TX_BYTES, output),
        tx_unicast: capture_u64(&RE_TX_UCAST, output),
        tx_broadcast: capture_u64(&RE_TX_BCAST, output),
        tx_multicast: capture_u64(&RE_TX_MCAST, output),
        tx_errors: capture_u64(&RE_TX_ERR, output),
    };

    detail
}

/// Parse the all-ports `show interfaces` form: one detailed block per port,
/// each starting with a `Chassis/Slot/Port` line.
#[must_use]
pub fn parse_all_interface_details(output: &str) -> BTreeMap<String, PortDetail> {
    let mut details = BTreeMap::new();

    // Manual split on the block header; regex look-ahead is not available.
    let mut starts: Vec<usize> = Vec::new();
    for m in RE_PORT_HEADER.find_iter(output) {
        // Rewind to the start of the header line.
        let start = output[..m.start()]
            .rfind('\n')
            .map_or(0, |idx| idx + 1);
        starts.push(start);
    }

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(output.len());
        let section = &output[start..end];
        let Some(caps) = RE_PORT_HEADER.captures(section) else {
            continue;
        };
        let port_id = caps[1].to_string();
        details.insert(port_id.clone(), parse_interface_detail(section, &port_id));
    }

    details
}

/// Single-port summary from the `show interfaces port <id>` view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortSummary {
    pub port_id: String,
    pub admin_state: Option<String>,
    pub oper_state: Option<String>,
    pub speed: Option<String>,
    pub duplex: Option<String>,
    pub vlan: Option<String>,
}

static RE_OPER: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Operational Status\s*[:\-]\s*(\w+)"));
static RE_LINK_STATE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Link State\s*[:\-]\s*(\w+)"));
static RE_ADMIN: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Admin(?:istrative)? Stat(?:us|e)\s*[:\-]\s*(\w+)"));
static RE_BANDWIDTH: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"BandWidth \(Megabits\)\s*:\s*(\d+)"));
static RE_DUPLEX: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Duplex\s*[:\-]\s*(\w+)"));
static RE_VLAN_FIELD: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)VLAN\s*[:\-]\s*(\S+)"));

/// Parse `show interfaces port <id>` output.
#[must_use]
pub fn parse_interfaces_port(output: &str, port_id: &str) -> PortSummary {
    let mut summary = PortSummary {
        port_id: port_id.to_string(),
        ..PortSummary::default()
    };

    if let Some(caps) = RE_OPER.captures(output).or_else(|| RE_LINK_STATE.captures(output)) {
        summary.oper_state = Some(caps[1].to_ascii_lowercase());
    }
    if let Some(caps) = RE_ADMIN.captures(output) {
        let admin = caps[1].to_ascii_lowercase();
        summary.admin_state = Some(
            if admin == "enabled" || admin == "enable" || admin == "up" {
                "enabled"
            } else {
                "disabled"
            }
            .into(),
        );
    }
    if let Some(caps) = RE_BANDWIDTH.captures(output) {
        summary.speed = Some(format!("{}Mbps", &caps[1]));
    }
    if let Some(caps) = RE_DUPLEX.captures(output) {
        summary.duplex = Some(caps[1].to_string());
    }
    if let Some(caps) = RE_VLAN_FIELD.captures(output) {
        summary.vlan = Some(caps[1].to_string());
    }

    summary
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_TABLE: &str = "\
                               DETECTED               CONFIGURED
 Chas/
 Slot/ Admin  Auto   Speed   Duplex  Hybrid  Speed  Duplex  Hybrid  Trap  Link  EEE
 Port  Status Nego  (Mbps)           Type    (Mbps)         Mode   LinkUpDown Mon.
-----+------+-----+-------+--------+-------+------+-------+-------+-----+-----+----
 1/1/4       en    en    1000   Full     -     DIS   Auto    Auto     -    AUTO  en
 1/1/5       en    en    -      -        -     DIS   Auto    Auto     -    AUTO  en
 1/1/19      en    en    1000   Full     -     DIS   Auto    Auto     -    AUTO  en
";

    const DETAIL: &str = "\
Chassis/Slot/Port  1/1/19 :
  Operational Status     : up,
  Last Time Link Changed : Mon Jul 28 08:12:45 2025,
  Number of Status Change: 4,
  Interface Type         : Copper,
  SFP/XFP                : N/A,
  MAC address            : 2c:fa:a2:5e:33:84,
  BandWidth (Megabits)   :     1000,  		Duplex           : Full,
  Rx              :
  Bytes Received  :         919843215, Unicast Frames :           2185021,
  Broadcast Frames:             91220, M-cast Frames  :            402188,
  UnderSize Frames:                 0, OverSize Frames:                 0,
  Lost Frames     :                 0, Error Frames   :                 3,
  Tx              :
  Bytes Xmitted   :        4102938471, Unicast Frames :           5320117,
  Broadcast Frames:            144553, M-cast Frames  :            883120,
  UnderSize Frames:                 0, OverSize Frames:                 0,
  Lost Frames     :                 0, Error Frames   :                 0,
";

    #[test]
    fn status_table_rows_parse() {
        let map = parse_interfaces_status(STATUS_TABLE);
        assert_eq!(map.len(), 3);

        let up = &map["1/1/4"];
        assert_eq!(up.admin_state, "enabled");
        assert_eq!(up.oper_state, "up");
        assert_eq!(up.speed.as_deref(), Some("1000Mbps"));
        assert_eq!(up.duplex.as_deref(), Some("Full"));
        assert!(up.auto_neg);
    }

    #[test]
    fn oper_state_derives_from_speed_dash() {
        let map = parse_interfaces_status(STATUS_TABLE);
        let down = &map["1/1/5"];
        assert_eq!(down.oper_state, "down");
        assert!(down.speed.is_none());
        assert!(down.duplex.is_none());
    }

    #[test]
    fn header_lines_are_ignored() {
        // Nothing before the dashed separator may produce a row.
        let map = parse_interfaces_status("Chas/ Slot/ Port Admin\n 1/1/9 en en 100 Full\n");
        assert!(map.is_empty());
    }

    #[test]
    fn detail_extracts_phy_and_counters() {
        let detail = parse_interface_detail(DETAIL, "1/1/19");
        assert_eq!(detail.interface_type.as_deref(), Some("Copper"));
        assert!(detail.sfp_type.is_none()); // N/A collapses to none
        assert_eq!(detail.mac_address.as_deref(), Some("2c:fa:a2:5e:33:84"));
        assert_eq!(detail.counters.rx_bytes, Some(919_843_215));
        assert_eq!(detail.counters.rx_errors, Some(3));
        assert_eq!(detail.counters.tx_bytes, Some(4_102_938_471));
        assert_eq!(detail.counters.tx_errors, Some(0));
    }

    #[test]
    fn all_ports_form_splits_into_blocks() {
        let two = format!(
            "{}\nChassis/Slot/Port  1/1/20 :\n  Interface Type         : Fiber,\n  MAC address            : 2c:fa:a2:5e:33:85,\n",
            DETAIL
        );
        let map = parse_all_interface_details(&two);
        assert_eq!(map.len(), 2);
        assert_eq!(map["1/1/19"].interface_type.as_deref(), Some("Copper"));
        assert_eq!(map["1/1/20"].interface_type.as_deref(), Some("Fiber"));
    }

    #[test]
    fn port_view_parses_states() {
        let out = "\
Chassis/Slot/Port          : 1/1/19
 Operational Status        : up,
 Admin Status              : enabled,
 BandWidth (Megabits)      :     1000,  		Duplex           : Full,
";
        let summary = parse_interfaces_port(out, "1/1/19");
        assert_eq!(summary.admin_state.as_deref(), Some("enabled"));
        assert_eq!(summary.oper_state.as_deref(), Some("up"));
        assert_eq!(summary.speed.as_deref(), Some("1000Mbps"));
        assert_eq!(summary.duplex.as_deref(), Some("Full"));
    }

    #[test]
    fn unparseable_input_degrades() {
        let summary = parse_interfaces_port("no recognizable fields", "1/1/1");
        assert_eq!(summary.port_id, "1/1/1");
        assert!(summary.admin_state.is_none());
        assert!(parse_all_interface_details("").is_empty());
    }
}
