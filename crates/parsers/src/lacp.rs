//! Parsers for `show linkagg` and `show lacp`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// OS6860: Number  Aggregate  SNMP Id  Size  Admin State  Oper State  Att/Sel Ports
static RE_LAG_OS6860: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"^\s*(\d+)\s+(\S+)\s+\d+\s+(\d+)\s+(ENABLED|DISABLED)\s+(UP|DOWN)\s+(\d+)\s+(\d+)",
    )
});

// Classic: Agg  Name  Size  AdminState  OperState  Type  Hash
static RE_LAG_CLASSIC: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(\d+)\s+(\S+)\s+(\d+)\s+(enabled|disabled)\s+(up|down)\s+(lacp|static)\s+(\S+)",
    )
});

static RE_SYSTEM_ID: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r":\s*([0-9a-fA-F:]{17})"));

static RE_SYSTEM_PRIO: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r":\s*(\d+)"));

static RE_LACP_ENABLED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)LACP\s+(Enabled|Active)"));

static RE_LACP_PORT_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"(\d+)\s+(\d+/\d+/\d+)\s+([0-9a-fA-F:]{17})\s+(\S+)")
});

/// A link-aggregation group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAgg {
    pub agg_id: u32,
    pub name: String,
    pub size: u32,
    pub admin_state: String,
    pub oper_state: String,
    /// `lacp` or `static`.
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_ports: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_ports: Option<u32>,
}

/// Parse `show linkagg` output (both table layouts).
#[must_use]
pub fn parse_show_linkagg(output: &str) -> Vec<LinkAgg> {
    let mut lags = Vec::new();

    for line in output.lines() {
        if let Some(caps) = RE_LAG_OS6860.captures(line) {
            let Ok(agg_id) = caps[1].parse::<u32>() else {
                continue;
            };
            let name = &caps[2];
            lags.push(LinkAgg {
                agg_id,
                name: if name == "---" { format!("agg{agg_id}") } else { name.to_string() },
                size: caps[3].parse().unwrap_or(0),
                admin_state: caps[4].to_ascii_lowercase(),
                oper_state: caps[5].to_ascii_lowercase(),
                r#type: if name.to_ascii_lowercase().contains("dynamic") {
                    "lacp"
                } else {
                    "static"
                }
                .into(),
                hash_algorithm: None,
                attached_ports: caps[6].parse().ok(),
                selected_ports: caps[7].parse().ok(),
            });
            continue;
        }

        if let Some(caps) = RE_LAG_CLASSIC.captures(line) {
            let Ok(agg_id) = caps[1].parse::<u32>() else {
                continue;
            };
            let name = &caps[2];
            lags.push(LinkAgg {
                agg_id,
                name: if name == "---" { format!("agg{agg_id}") } else { name.to_string() },
                size: caps[3].parse().unwrap_or(0),
                admin_state: caps[4].to_ascii_lowercase(),
                oper_state: caps[5].to_ascii_lowercase(),
                r#type: caps[6].to_ascii_lowercase(),
                hash_algorithm: Some(caps[7].to_string()),
                attached_ports: None,
                selected_ports: None,
            });
        }
    }

    lags
}

/// A member port row from `show lacp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LacpPort {
    pub port: String,
    pub partner_system: String,
    pub partner_port: String,
}

/// Per-aggregate LACP membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LacpAggregate {
    pub agg_id: u32,
    pub ports: Vec<LacpPort>,
}

/// Parsed `show lacp` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LacpReport {
    pub lacp_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_priority: Option<u32>,
    pub aggregates: Vec<LacpAggregate>,
}

/// Parse `show lacp` output.
#[must_use]
pub fn parse_show_lacp(output: &str) -> LacpReport {
    let mut report = LacpReport::default();

    for line in output.lines() {
        if line.contains("System ID:") || line.contains("System MAC:") {
            if let Some(caps) = RE_SYSTEM_ID.captures(line) {
                report.system_id = Some(caps[1].to_ascii_lowercase());
            }
        }
        if line.contains("System Priority:") {
            if let Some(caps) = RE_SYSTEM_PRIO.captures(line) {
                report.system_priority = caps[1].parse().ok();
            }
        }
        if RE_LACP_ENABLED.is_match(line) {
            report.lacp_enabled = true;
        }

        if let Some(caps) = RE_LACP_PORT_ROW.captures(line) {
            let Ok(agg_id) = caps[1].parse::<u32>() else {
                continue;
            };
            let port = LacpPort {
                port: caps[2].to_string(),
                partner_system: caps[3].to_ascii_lowercase(),
                partner_port: caps[4].to_string(),
            };
            match report.aggregates.iter_mut().find(|a| a.agg_id == agg_id) {
                Some(agg) => agg.ports.push(port),
                None => report.aggregates.push(LacpAggregate {
                    agg_id,
                    ports: vec![port],
                }),
            }
        }
    }

    report
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const LINKAGG_OS6860: &str = "\
Number  Aggregate     SNMP Id    Size  Admin State  Oper State   Att/Sel Ports
-------+------------+----------+-----+------------+------------+----+----
   5     Dynamic      40000005    2    ENABLED      UP             2   2
   7     Dynamic      40000007    2    ENABLED      DOWN           2   1
";

    const LINKAGG_CLASSIC: &str = "\
Agg  Name         Size  AdminState  OperState  Type   Hash
1    uplink-core  2     enabled     up         lacp   src-dst-mac
";

    const LACP: &str = "\
LACP Enabled
System ID: 2c:fa:a2:5e:33:71
System Priority: 32768
Agg   Port     Partner System      Partner Port
5     1/1/25   00:1b:2c:3d:4e:5f   1017
5     1/1/26   00:1b:2c:3d:4e:5f   1018
";

    #[test]
    fn os6860_layout_parses_with_port_counts() {
        let lags = parse_show_linkagg(LINKAGG_OS6860);
        assert_eq!(lags.len(), 2);
        assert_eq!(lags[0].agg_id, 5);
        assert_eq!(lags[0].r#type, "lacp");
        assert_eq!(lags[0].attached_ports, Some(2));
        assert_eq!(lags[0].selected_ports, Some(2));
        assert_eq!(lags[1].oper_state, "down");
        assert_eq!(lags[1].selected_ports, Some(1));
    }

    #[test]
    fn classic_layout_parses_with_hash() {
        let lags = parse_show_linkagg(LINKAGG_CLASSIC);
        assert_eq!(lags.len(), 1);
        assert_eq!(lags[0].name, "uplink-core");
        assert_eq!(lags[0].r#type, "lacp");
        assert_eq!(lags[0].hash_algorithm.as_deref(), Some("src-dst-mac"));
    }

    #[test]
    fn lacp_report_groups_ports_by_aggregate() {
        let report = parse_show_lacp(LACP);
        assert!(report.lacp_enabled);
        assert_eq!(report.system_id.as_deref(), Some("2c:fa:a2:5e:33:71"));
        assert_eq!(report.system_priority, Some(32768));
        assert_eq!(report.aggregates.len(), 1);
        assert_eq!(report.aggregates[0].ports.len(), 2);
    }

    #[test]
    fn empty_input_degrades() {
        assert!(parse_show_linkagg("").is_empty());
        assert!(!parse_show_lacp("").lacp_enabled);
    }
}
