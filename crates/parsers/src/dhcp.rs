//! Parsers for the `show ip dhcp-relay` command family.

use std::{collections::BTreeMap, sync::LazyLock};

use {
    regex::Regex,
    serde::Serialize,
};

static RE_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Interface(?:\s+Name)?:\s*(\S+(?:\s+\d+)?)"));

static RE_ADMIN_STATE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)State\s*[:=]\s*(enabled|disabled)"));

static RE_OPER_STATE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)State\s*[:=]\s*(up|down)"));

static RE_SERVER: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Server:\s*(\d+\.\d+\.\d+\.\d+)"));

static RE_KV_VALUE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"[:=]\s*(\S[^,]*?)\s*,?\s*$"));

static RE_NUM_VALUE: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"[:=]\s*(\d+)"));

static RE_COUNTER_IFACE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)^\s*(vlan\s+\d+|[\w/]+):\s*$"));

static RE_MSG_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"(?i)\b(discover|offer|request|ack|nak|release|inform|decline):\s*(\d+)")
});

/// Global relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayGlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_delay_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_82: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pxe_support: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_mode: Option<String>,
}

/// Per-interface relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayInterface {
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oper_state: Option<String>,
    pub servers: Vec<String>,
    pub agent_information: bool,
}

/// Parsed `show ip dhcp-relay interface` output: one global record plus the
/// per-interface list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayInterfaceReport {
    pub relay: RelayGlobalConfig,
    pub interfaces: Vec<RelayInterface>,
}

/// Parse `show ip dhcp-relay interface` output.
#[must_use]
pub fn parse_relay_interface(output: &str) -> RelayInterfaceReport {
    let mut report = RelayInterfaceReport::default();
    let mut current: Option<RelayInterface> = None;

    for line in output.lines() {
        if let Some(caps) = RE_INTERFACE.captures(line) {
            if let Some(done) = current.take() {
                report.interfaces.push(done);
            }
            current = Some(RelayInterface {
                interface: caps[1].trim().to_string(),
                ..RelayInterface::default()
            });
            continue;
        }

        if let Some(iface) = current.as_mut() {
            if line.contains("Admin State") || line.contains("Administrative State") {
                if let Some(caps) = RE_ADMIN_STATE.captures(line) {
                    iface.admin_state = Some(caps[1].to_ascii_lowercase());
                }
            }
            if line.contains("Oper State") || line.contains("Operational State") {
                if let Some(caps) = RE_OPER_STATE.captures(line) {
                    iface.oper_state = Some(caps[1].to_ascii_lowercase());
                }
            }
            if let Some(caps) = RE_SERVER.captures(line) {
                iface.servers.push(caps[1].to_string());
            }
            if (line.contains("Agent Information") || line.contains("Option 82"))
                && line.to_ascii_lowercase().contains("enabled")
            {
                iface.agent_information = true;
            }
            continue;
        }

        // Outside any interface block: global configuration lines.
        let global = &mut report.relay;
        if line.contains("Admin Status") {
            if let Some(caps) = RE_KV_VALUE.captures(line) {
                global.admin_status = Some(caps[1].to_ascii_lowercase());
            }
        } else if line.contains("Forward Delay") {
            if let Some(caps) = RE_NUM_VALUE.captures(line) {
                global.forward_delay_seconds = caps[1].parse().ok();
            }
        } else if line.contains("Max number of hops") || line.contains("Maximum hops") {
            if let Some(caps) = RE_NUM_VALUE.captures(line) {
                global.max_hops = caps[1].parse().ok();
            }
        } else if line.contains("Agent Information") || line.contains("Option 82") {
            if let Some(caps) = RE_KV_VALUE.captures(line) {
                global.option_82 = Some(caps[1].to_ascii_lowercase());
            }
        } else if line.contains("PXE") {
            if let Some(caps) = RE_KV_VALUE.captures(line) {
                global.pxe_support = Some(caps[1].to_ascii_lowercase());
            }
        } else if line.contains("Forward option") || line.contains("Relay Mode") {
            if let Some(caps) = RE_KV_VALUE.captures(line) {
                global.relay_mode = Some(caps[1].to_ascii_lowercase());
            }
        }
    }

    if let Some(done) = current {
        report.interfaces.push(done);
    }

    report
}

/// Aggregate relay packet statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayStatistics {
    pub requests_received: u64,
    pub requests_forwarded: u64,
    pub requests_dropped: u64,
    pub replies_received: u64,
    pub replies_forwarded: u64,
    pub replies_dropped: u64,
    pub total_packets: u64,
    pub errors: u64,
}

static RE_FROM_CLIENT: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Reception From Client.*Total Count\s*=\s*(\d+)"));
static RE_TX_SERVER: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Tx Server.*Total Count\s*=\s*(\d+)"));
static RE_DROP: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(Forw Delay|Max Hops|Agent Info|Invalid Gateway).*Total Count\s*=\s*(\d+)",
    )
});
static RE_REQ_RECEIVED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Requests?\s+Received:\s*(\d+)"));
static RE_REQ_FORWARDED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Requests?\s+Forwarded:\s*(\d+)"));
static RE_REQ_DROPPED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Requests?\s+Dropped:\s*(\d+)"));
static RE_REP_RECEIVED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Replies\s+Received:\s*(\d+)"));
static RE_REP_FORWARDED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Replies\s+Forwarded:\s*(\d+)"));
static RE_REP_DROPPED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Replies\s+Dropped:\s*(\d+)"));
static RE_ERRORS: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Errors?:\s*(\d+)"));

fn capture_u64(re: &Regex, line: &str, group: usize) -> Option<u64> {
    re.captures(line).and_then(|c| c.get(group)).and_then(|m| m.as_str().parse().ok())
}

/// Parse `show ip dhcp-relay statistics` output.
///
/// Accepts both the AOS8 `Total Count =` accounting blocks and the plain
/// `Requests Received:` summary format.
#[must_use]
pub fn parse_relay_statistics(output: &str) -> RelayStatistics {
    let mut stats = RelayStatistics::default();

    for line in output.lines() {
        if let Some(n) = capture_u64(&RE_FROM_CLIENT, line, 1) {
            stats.requests_received = n;
        }
        if let Some(n) = capture_u64(&RE_TX_SERVER, line, 1) {
            stats.requests_forwarded += n;
        }
        if let Some(n) = capture_u64(&RE_DROP, line, 2) {
            if n > 0 {
                stats.requests_dropped += n;
                stats.errors += n;
            }
        }

        if let Some(n) = capture_u64(&RE_REQ_RECEIVED, line, 1) {
            stats.requests_received = n;
        }
        if let Some(n) = capture_u64(&RE_REQ_FORWARDED, line, 1) {
            stats.requests_forwarded = n;
        }
        if let Some(n) = capture_u64(&RE_REQ_DROPPED, line, 1) {
            stats.requests_dropped = n;
        }
        if let Some(n) = capture_u64(&RE_REP_RECEIVED, line, 1) {
            stats.replies_received = n;
        }
        if let Some(n) = capture_u64(&RE_REP_FORWARDED, line, 1) {
            stats.replies_forwarded = n;
        }
        if let Some(n) = capture_u64(&RE_REP_DROPPED, line, 1) {
            stats.replies_dropped = n;
        }
        if let Some(n) = capture_u64(&RE_ERRORS, line, 1) {
            stats.errors += n;
        }
    }

    stats.total_packets = stats.requests_received + stats.replies_received;
    stats
}

/// DHCP message-type counters for one interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageCounters {
    pub discover: u64,
    pub offer: u64,
    pub request: u64,
    pub ack: u64,
    pub nak: u64,
    pub release: u64,
    pub inform: u64,
    pub decline: u64,
}

/// Parse `show ip dhcp-relay counters` output: message-type counters keyed
/// by interface.
#[must_use]
pub fn parse_relay_counters(output: &str) -> BTreeMap<String, MessageCounters> {
    let mut counters: BTreeMap<String, MessageCounters> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        if let Some(caps) = RE_COUNTER_IFACE.captures(line) {
            let name = caps[1].trim().to_string();
            counters.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(ref name) = current else {
            continue;
        };
        let Some(entry) = counters.get_mut(name) else {
            continue;
        };

        for caps in RE_MSG_TYPE.captures_iter(line) {
            let Ok(n) = caps[2].parse() else {
                continue;
            };
            match caps[1].to_ascii_lowercase().as_str() {
                "discover" => entry.discover = n,
                "offer" => entry.offer = n,
                "request" => entry.request = n,
                "ack" => entry.ack = n,
                "nak" => entry.nak = n,
                "release" => entry.release = n,
                "inform" => entry.inform = n,
                "decline" => entry.decline = n,
                _ => {},
            }
        }
    }

    counters
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const RELAY_INTERFACE: &str = "\
IP DHCP Relay:
  DHCP Relay Admin Status         = Enabled,
  Forward Delay(seconds)          = 3,
  Max number of hops              = 16,
  Relay Agent Information         = Disabled,
  PXE support                     = Disabled,
  Forward option                  = standard,

Interface Name: vlan 100
  Admin State: enabled
  Oper State: up
  Server: 10.1.0.10
  Server: 10.1.0.11
Interface Name: vlan 200
  Admin State: enabled
  Oper State: down
";

    #[test]
    fn global_config_parses() {
        let report = parse_relay_interface(RELAY_INTERFACE);
        assert_eq!(report.relay.admin_status.as_deref(), Some("enabled"));
        assert_eq!(report.relay.forward_delay_seconds, Some(3));
        assert_eq!(report.relay.max_hops, Some(16));
        assert_eq!(report.relay.option_82.as_deref(), Some("disabled"));
        assert_eq!(report.relay.pxe_support.as_deref(), Some("disabled"));
        assert_eq!(report.relay.relay_mode.as_deref(), Some("standard"));
    }

    #[test]
    fn interfaces_parse_with_servers() {
        let report = parse_relay_interface(RELAY_INTERFACE);
        assert_eq!(report.interfaces.len(), 2);
        assert_eq!(report.interfaces[0].interface, "vlan 100");
        assert_eq!(report.interfaces[0].servers, vec!["10.1.0.10", "10.1.0.11"]);
        assert_eq!(report.interfaces[0].oper_state.as_deref(), Some("up"));
        assert_eq!(report.interfaces[1].oper_state.as_deref(), Some("down"));
        assert!(report.interfaces[1].servers.is_empty());
    }

    #[test]
    fn statistics_aggregate_both_formats() {
        let out = "\
Reception From Client:  Total Count = 13371
Tx Server:              Total Count = 1062
Max Hops Violation:     Total Count = 4
";
        let stats = parse_relay_statistics(out);
        assert_eq!(stats.requests_received, 13371);
        assert_eq!(stats.requests_forwarded, 1062);
        assert_eq!(stats.requests_dropped, 4);
        assert_eq!(stats.errors, 4);
        assert_eq!(stats.total_packets, 13371);
    }

    #[test]
    fn plain_statistics_format_parses() {
        let out = "\
Requests Received: 120
Requests Forwarded: 118
Requests Dropped: 2
Replies Received: 115
Replies Forwarded: 115
Replies Dropped: 0
";
        let stats = parse_relay_statistics(out);
        assert_eq!(stats.requests_received, 120);
        assert_eq!(stats.replies_forwarded, 115);
        assert_eq!(stats.total_packets, 235);
    }

    #[test]
    fn counters_group_by_interface() {
        let out = "\
vlan 100:
  Discover: 45
  Offer: 44
  Request: 43
  Ack: 42
vlan 200:
  Discover: 1
";
        let counters = parse_relay_counters(out);
        assert_eq!(counters.len(), 2);
        assert_eq!(counters["vlan 100"].discover, 45);
        assert_eq!(counters["vlan 100"].ack, 42);
        assert_eq!(counters["vlan 200"].discover, 1);
        assert_eq!(counters["vlan 200"].offer, 0);
    }

    #[test]
    fn empty_input_degrades() {
        let report = parse_relay_interface("");
        assert!(report.interfaces.is_empty());
        assert!(report.relay.admin_status.is_none());
        assert!(parse_relay_counters("").is_empty());
    }
}
