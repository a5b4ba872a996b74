//! Parsers for the chassis environment commands: `show temperature`,
//! `show fan`, `show power-supply`, `show cmm`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// OS6860: "1/CMMA            38       15 to 85      88       85     UNDER THRESHOLD"
static RE_TEMP_OS6860: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(\d+/\w+)\s+(\d+)\s+\d+\s+to\s+\d+\s+\d+\s+(\d+)\s+(UNDER THRESHOLD|OVER THRESHOLD|OK)",
    )
});

// AOS8: "Sensor   Location   Current   Threshold   Status"
static RE_TEMP_AOS8: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"(?i)(\w+[-\w]*)\s+([\w/]+)\s+(\d+)C?\s+(\d+)C?\s+(OK|WARNING|CRITICAL)")
});

// OS6860: "1/--         1       YES"
static RE_FAN_OS6860: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)(\d+)/[-\w]*\s+(\d+)\s+(YES|NO)"));

// AOS8: "Fan 1   3300 RPM   OK"
static RE_FAN_AOS8: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(?:Fan|FAN)\s+(\d+)\s+(\d+)\s*(RPM)?\s+(OK|WARNING|CRITICAL|FAILED|operational|not operational)",
    )
});

static RE_PSU: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(?:PSU|PS|Power Supply)\s+(\d+)\s+(present|not present|operational|failed)\s+(AC|DC)?\s*(\d+)?",
    )
});

static RE_CMM: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(?:Slot|CMM)\s+(\d+)\s+(primary|secondary|running|standby)\s+(running|standby|up|down)\s*(\d+)?",
    )
});

/// One temperature sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSensor {
    pub sensor: String,
    pub location: String,
    pub current_celsius: i64,
    pub threshold_celsius: i64,
    pub status: String,
}

/// Parsed `show temperature` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReport {
    pub sensors: Vec<TemperatureSensor>,
    pub overall_status: String,
    pub issues: Vec<String>,
}

impl Default for TemperatureReport {
    fn default() -> Self {
        Self {
            sensors: Vec::new(),
            overall_status: "OK".into(),
            issues: Vec::new(),
        }
    }
}

/// Parse `show temperature` output (AOS8 and OS6860 layouts).
#[must_use]
pub fn parse_show_temperature(output: &str) -> TemperatureReport {
    let mut report = TemperatureReport::default();

    for line in output.lines() {
        if let Some(caps) = RE_TEMP_OS6860.captures(line) {
            let current: i64 = caps[2].parse().unwrap_or(0);
            let threshold: i64 = caps[3].parse().unwrap_or(0);
            let over = caps[4].to_ascii_uppercase().contains("OVER");
            report.sensors.push(TemperatureSensor {
                sensor: caps[1].to_string(),
                location: caps[1].to_string(),
                current_celsius: current,
                threshold_celsius: threshold,
                status: if over { "CRITICAL" } else { "OK" }.into(),
            });
            if over || current >= threshold {
                report.overall_status = "CRITICAL".into();
                report
                    .issues
                    .push(format!("{}: {current}°C (threshold: {threshold}°C)", &caps[1]));
            }
            continue;
        }

        if let Some(caps) = RE_TEMP_AOS8.captures(line) {
            let current: i64 = caps[3].parse().unwrap_or(0);
            let threshold: i64 = caps[4].parse().unwrap_or(0);
            let status = caps[5].to_ascii_uppercase();
            report.sensors.push(TemperatureSensor {
                sensor: caps[1].to_string(),
                location: caps[2].to_string(),
                current_celsius: current,
                threshold_celsius: threshold,
                status: status.clone(),
            });
            if status != "OK" {
                report.overall_status = status;
                report.issues.push(format!(
                    "{} at {}: {current}°C (threshold: {threshold}°C)",
                    &caps[1], &caps[2]
                ));
            }
        }
    }

    report
}

/// One fan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanStatus {
    pub fan_id: u32,
    pub speed_rpm: u32,
    pub status: String,
}

/// Parse `show fan` / `show fantray` output (AOS8 and OS6860 layouts).
#[must_use]
pub fn parse_show_fan(output: &str) -> Vec<FanStatus> {
    let mut fans = Vec::new();

    for line in output.lines() {
        if let Some(caps) = RE_FAN_OS6860.captures(line) {
            let functional = caps[3].eq_ignore_ascii_case("YES");
            fans.push(FanStatus {
                fan_id: caps[2].parse().unwrap_or(0),
                // The compact layout reports no RPM; substitute a nominal
                // speed for a functional fan so threshold checks behave.
                speed_rpm: if functional { 3500 } else { 0 },
                status: if functional { "OK" } else { "FAILED" }.into(),
            });
            continue;
        }

        if let Some(caps) = RE_FAN_AOS8.captures(line) {
            let raw_status = caps[4].to_ascii_uppercase();
            let status = match raw_status.as_str() {
                "OK" | "WARNING" | "CRITICAL" | "FAILED" => raw_status,
                s if s.contains("NOT") => "FAILED".into(),
                _ => "OK".into(),
            };
            fans.push(FanStatus {
                fan_id: caps[1].parse().unwrap_or(0),
                speed_rpm: caps[2].parse().unwrap_or(0),
                status,
            });
        }
    }

    fans
}

/// One power supply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSupplyStatus {
    pub psu_id: u32,
    pub status: String,
    pub operational: bool,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watts: Option<u32>,
}

/// Parse `show power-supply` output.
#[must_use]
pub fn parse_show_power_supply(output: &str) -> Vec<PowerSupplyStatus> {
    let mut supplies = Vec::new();

    for line in output.lines() {
        let Some(caps) = RE_PSU.captures(line) else {
            continue;
        };
        let raw = caps[2].to_ascii_lowercase();
        supplies.push(PowerSupplyStatus {
            psu_id: caps[1].parse().unwrap_or(0),
            status: if raw.contains("present") && !raw.contains("not") {
                "present"
            } else if raw == "operational" {
                "present"
            } else {
                "not_present"
            }
            .into(),
            operational: raw == "operational" || (raw.contains("present") && !raw.contains("not")),
            r#type: caps.get(3).map_or("unknown".into(), |m| m.as_str().to_string()),
            watts: caps.get(4).and_then(|m| m.as_str().parse().ok()),
        });
    }

    supplies
}

/// One Chassis Management Module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmmInfo {
    pub slot: u32,
    pub role: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<i64>,
}

/// Parsed `show cmm` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CmmReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<CmmInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<CmmInfo>,
    pub status: String,
}

/// Parse `show cmm` output.
#[must_use]
pub fn parse_show_cmm(output: &str) -> CmmReport {
    let mut report = CmmReport {
        status: "unknown".into(),
        ..CmmReport::default()
    };

    for line in output.lines() {
        let Some(caps) = RE_CMM.captures(line) else {
            continue;
        };
        let role = caps[2].to_ascii_lowercase();
        let info = CmmInfo {
            slot: caps[1].parse().unwrap_or(0),
            role: role.clone(),
            status: caps[3].to_ascii_lowercase(),
            temperature_celsius: caps.get(4).and_then(|m| m.as_str().parse().ok()),
        };

        if role == "primary" || role == "running" {
            report.status = info.status.clone();
            report.primary = Some(info);
        } else if role == "secondary" || role == "standby" {
            report.secondary = Some(info);
        }
    }

    report
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os6860_temperature_rows_parse() {
        let out = "\
Chassis/Device | Current | Range    | Danger | Thresh | Status
1/CMMA            38       15 to 85      88       85     UNDER THRESHOLD
1/CMMB            87       15 to 85      88       85     OVER THRESHOLD
";
        let report = parse_show_temperature(out);
        assert_eq!(report.sensors.len(), 2);
        assert_eq!(report.sensors[0].status, "OK");
        assert_eq!(report.sensors[1].status, "CRITICAL");
        assert_eq!(report.overall_status, "CRITICAL");
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("87°C"));
    }

    #[test]
    fn aos8_temperature_rows_parse() {
        let out = "Sensor1   CMM/1   45C   75C   OK\nSensor2   NI/1    78C   75C   WARNING\n";
        let report = parse_show_temperature(out);
        assert_eq!(report.sensors.len(), 2);
        assert_eq!(report.overall_status, "WARNING");
    }

    #[test]
    fn fans_parse_in_both_layouts() {
        let compact = "Chassis/Tray   Fan   Functional\n1/--         1       YES\n1/--         2       NO\n";
        let fans = parse_show_fan(compact);
        assert_eq!(fans.len(), 2);
        assert_eq!(fans[0].status, "OK");
        assert_eq!(fans[1].status, "FAILED");
        assert_eq!(fans[1].speed_rpm, 0);

        let tabular = "Fan 1   3300 RPM   OK\nFan 2   0 RPM   FAILED\n";
        let fans = parse_show_fan(tabular);
        assert_eq!(fans.len(), 2);
        assert_eq!(fans[0].speed_rpm, 3300);
        assert_eq!(fans[1].status, "FAILED");
    }

    #[test]
    fn power_supplies_parse() {
        let out = "PSU 1   present       AC   920\nPSU 2   not present\n";
        let psus = parse_show_power_supply(out);
        assert_eq!(psus.len(), 2);
        assert_eq!(psus[0].status, "present");
        assert_eq!(psus[0].watts, Some(920));
        assert_eq!(psus[1].status, "not_present");
        assert!(!psus[1].operational);
    }

    #[test]
    fn cmm_roles_route_to_slots() {
        let out = "CMM 1   primary    running   43\nCMM 2   secondary  standby\n";
        let report = parse_show_cmm(out);
        assert_eq!(report.status, "running");
        assert_eq!(report.primary.as_ref().map(|c| c.slot), Some(1));
        assert_eq!(
            report.primary.as_ref().and_then(|c| c.temperature_celsius),
            Some(43)
        );
        assert_eq!(report.secondary.as_ref().map(|c| c.slot), Some(2));
    }

    #[test]
    fn empty_inputs_degrade() {
        assert!(parse_show_fan("").is_empty());
        assert!(parse_show_power_supply("").is_empty());
        assert!(parse_show_cmm("").primary.is_none());
        assert_eq!(parse_show_temperature("").overall_status, "OK");
    }
}
