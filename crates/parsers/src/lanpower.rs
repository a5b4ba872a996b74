//! Parser for `show lanpower slot <c/s>`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// port_id max_mw actual_mw status priority admin_state class type
static RE_POE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"^(\d+/\d+/\d+)\s+(\d+)\s+(\d+)\s+(\S+(?:\s+\S+)*?)\s+(Low|High|Critical)\s+(ON|OFF)\s+(\S*)\s*(.*?)$",
    )
});

static RE_CHASSIS_ROW: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"ChassisId\s+(\d+)\s+Slot\s+(\d+)\s+Max Watts\s+(\d+)"));

static RE_CONSUMED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(\d+)\s+Watts\s+Actual Power Consumed"));

static RE_REMAINING: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(\d+)\s+Watts\s+Actual Power Budget Remaining"));

static RE_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(\d+)\s+Watts\s+Total Power Budget Available"));

static RE_SUPPLIES: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(\d+)\s+Power Supply Available"));

/// Per-port PoE state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoePort {
    pub port_id: String,
    pub max_power_mw: u32,
    pub actual_used_mw: u32,
    /// e.g. `Powered On`, `Searching`, `Off`.
    pub status: String,
    /// `Low`, `High` or `Critical`.
    pub priority: String,
    /// `ON` or `OFF`.
    pub admin_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// Chassis/slot power budget aggregates from the trailing summary lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoeChassisSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_watts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_power_consumed_watts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_budget_remaining_watts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_power_budget_watts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_supplies_available: Option<u32>,
}

/// Parsed `show lanpower slot` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanpowerReport {
    pub ports: Vec<PoePort>,
    pub chassis_summary: PoeChassisSummary,
}

/// Parse `show lanpower slot <c/s>` output.
///
/// The port block begins after a `Port`-header line followed by dashes;
/// the chassis summary is parsed from the distinct trailing lines.
#[must_use]
pub fn parse_show_lanpower(output: &str) -> LanpowerReport {
    let mut report = LanpowerReport::default();
    let lines: Vec<&str> = output.lines().collect();
    let mut in_port_section = false;

    for (idx, line) in lines.iter().enumerate() {
        let stripped = line.trim();

        if line.contains("----") && idx > 0 && lines[idx - 1].contains("Port") {
            in_port_section = true;
            continue;
        }

        if in_port_section && !stripped.is_empty() && !stripped.starts_with("Chassis") {
            if let Some(caps) = RE_POE_ROW.captures(stripped) {
                let (Ok(max_mw), Ok(used_mw)) = (caps[2].parse(), caps[3].parse()) else {
                    continue;
                };
                let class = caps[7].trim();
                let ptype = caps[8].trim();
                report.ports.push(PoePort {
                    port_id: caps[1].to_string(),
                    max_power_mw: max_mw,
                    actual_used_mw: used_mw,
                    status: caps[4].trim().to_string(),
                    priority: caps[5].to_string(),
                    admin_state: caps[6].to_string(),
                    class: (!class.is_empty() && class != "_").then(|| class.to_string()),
                    r#type: (!ptype.is_empty()).then(|| ptype.to_string()),
                });
            }
        }

        let summary = &mut report.chassis_summary;
        if let Some(caps) = RE_CHASSIS_ROW.captures(stripped) {
            summary.chassis_id = caps[1].parse().ok();
            summary.slot_id = caps[2].parse().ok();
            summary.max_watts = caps[3].parse().ok();
        } else if let Some(caps) = RE_CONSUMED.captures(stripped) {
            summary.actual_power_consumed_watts = caps[1].parse().ok();
        } else if let Some(caps) = RE_REMAINING.captures(stripped) {
            summary.power_budget_remaining_watts = caps[1].parse().ok();
        } else if let Some(caps) = RE_TOTAL.captures(stripped) {
            summary.total_power_budget_watts = caps[1].parse().ok();
        } else if let Some(caps) = RE_SUPPLIES.captures(stripped) {
            summary.power_supplies_available = caps[1].parse().ok();
        }
    }

    report
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const LANPOWER: &str = "\
 Port   Maximum(mW)  Actual Used(mW)  Status       Priority  On/Off  Class  Type
--------+-----------+----------------+------------+---------+-------+------+----------
1/1/1    60000       0                Searching    Low       ON      _
1/1/12   60000       4300             Powered On   Low       ON      2
1/1/19   60000       6200             Powered On   High      ON      3      IEEE 802.3at
1/1/24   60000       0                Off          Low       OFF     _

 ChassisId 1 Slot 1 Max Watts 780
 110 Watts Actual Power Consumed
 670 Watts Actual Power Budget Remaining
 780 Watts Total Power Budget Available
 1 Power Supply Available
";

    #[test]
    fn ports_parse_with_status_and_class() {
        let report = parse_show_lanpower(LANPOWER);
        assert_eq!(report.ports.len(), 4);

        let searching = &report.ports[0];
        assert_eq!(searching.port_id, "1/1/1");
        assert_eq!(searching.status, "Searching");
        assert!(searching.class.is_none()); // "_" collapses to none

        let powered = &report.ports[2];
        assert_eq!(powered.actual_used_mw, 6200);
        assert_eq!(powered.priority, "High");
        assert_eq!(powered.class.as_deref(), Some("3"));
        assert_eq!(powered.r#type.as_deref(), Some("IEEE 802.3at"));

        let off = &report.ports[3];
        assert_eq!(off.admin_state, "OFF");
    }

    #[test]
    fn chassis_summary_parses_trailing_lines() {
        let report = parse_show_lanpower(LANPOWER);
        let summary = &report.chassis_summary;
        assert_eq!(summary.chassis_id, Some(1));
        assert_eq!(summary.slot_id, Some(1));
        assert_eq!(summary.max_watts, Some(780));
        assert_eq!(summary.actual_power_consumed_watts, Some(110));
        assert_eq!(summary.power_budget_remaining_watts, Some(670));
        assert_eq!(summary.total_power_budget_watts, Some(780));
        assert_eq!(summary.power_supplies_available, Some(1));
    }

    #[test]
    fn missing_port_header_means_no_ports() {
        let out = "1/1/1 60000 0 Searching Low ON _\n";
        let report = parse_show_lanpower(out);
        assert!(report.ports.is_empty());
    }

    #[test]
    fn trailing_newline_is_irrelevant() {
        assert_eq!(
            parse_show_lanpower(&format!("{LANPOWER}\n")),
            parse_show_lanpower(LANPOWER)
        );
    }
}
