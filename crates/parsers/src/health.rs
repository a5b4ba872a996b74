//! Parser for `show health` / `show health all`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// AOS8 chassis table: Module Slot Status CPU% Memory% RxErrors TxErrors
static RE_MODULE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(r"(\w+)\s+(\d+/?\d*)\s+(OK|WARNING|CRITICAL|DOWN)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)")
});

static RE_CMM_CPU: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"^CPU\s+(\d+)"));
static RE_CMM_MEM: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"^Memory\s+(\d+)"));

/// CPU usage above this percentage raises an issue.
pub const CPU_WARN_PERCENT: u32 = 80;
/// Memory usage above this percentage raises an issue.
pub const MEMORY_WARN_PERCENT: u32 = 85;

/// Health metrics for one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthModule {
    pub module_name: String,
    pub slot: String,
    pub status: String,
    pub cpu_usage_percent: u32,
    pub memory_usage_percent: u32,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// Parsed `show health` output with the rolled-up status and threshold
/// violations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub modules: Vec<HealthModule>,
    pub overall_status: String,
    pub issues: Vec<String>,
}

impl Default for HealthReport {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            overall_status: "OK".into(),
            issues: Vec::new(),
        }
    }
}

/// Parse `show health` output.
///
/// Two layouts: the AOS8 chassis table, and the OS6860 "CMM Resources"
/// table. Overall status rolls up from the worst module; CPU > 80% or
/// memory > 85% emit issues.
#[must_use]
pub fn parse_show_health(output: &str) -> HealthReport {
    let mut report = HealthReport::default();

    // OS6860 compact layout: a resources table with current/average columns.
    if output.contains("Resources") && output.contains("Current") {
        let mut cpu = 0u32;
        let mut memory = 0u32;

        for line in output.lines() {
            let line = line.trim_start();
            if let Some(caps) = RE_CMM_CPU.captures(line) {
                cpu = caps[1].parse().unwrap_or(0);
            }
            if let Some(caps) = RE_CMM_MEM.captures(line) {
                memory = caps[1].parse().unwrap_or(0);
            }
        }

        if cpu > 0 || memory > 0 {
            report.modules.push(HealthModule {
                module_name: "CMM".into(),
                slot: "1".into(),
                status: "OK".into(),
                cpu_usage_percent: cpu,
                memory_usage_percent: memory,
                rx_errors: 0,
                tx_errors: 0,
            });

            if cpu > CPU_WARN_PERCENT {
                report.overall_status = "WARNING".into();
                report.issues.push(format!("CMM CPU usage high: {cpu}%"));
            }
            if memory > MEMORY_WARN_PERCENT {
                report.overall_status = "WARNING".into();
                report.issues.push(format!("CMM memory usage high: {memory}%"));
            }
        }

        return report;
    }

    for line in output.lines() {
        let Some(caps) = RE_MODULE_ROW.captures(line) else {
            continue;
        };
        let module = HealthModule {
            module_name: caps[1].to_string(),
            slot: caps[2].to_string(),
            status: caps[3].to_string(),
            cpu_usage_percent: caps[4].parse().unwrap_or(0),
            memory_usage_percent: caps[5].parse().unwrap_or(0),
            rx_errors: caps[6].parse().unwrap_or(0),
            tx_errors: caps[7].parse().unwrap_or(0),
        };

        if module.status != "OK" {
            report.overall_status = module.status.clone();
            report.issues.push(format!(
                "{} slot {} status: {}",
                module.module_name, module.slot, module.status
            ));
        }
        if module.cpu_usage_percent > CPU_WARN_PERCENT {
            report.issues.push(format!(
                "{} slot {} CPU usage high: {}%",
                module.module_name, module.slot, module.cpu_usage_percent
            ));
        }
        if module.memory_usage_percent > MEMORY_WARN_PERCENT {
            report.issues.push(format!(
                "{} slot {} memory usage high: {}%",
                module.module_name, module.slot, module.memory_usage_percent
            ));
        }

        report.modules.push(module);
    }

    report
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const AOS8_HEALTH: &str = "\
Module   Slot   Status     CPU   Memory   RX       TX
NI       1/1    OK         23    44       0        0
NI       1/2    WARNING    88    41       12       3
CMM      1      OK         31    52       0        0
";

    const OS6860_HEALTH: &str = "\
* - current value exceeds threshold

                       1 Min    1 Hr     1 Hr
CMM Resources          Current  Average  Max
CPU                     38       40      32
Memory                  10       10      10
";

    #[test]
    fn aos8_table_rolls_up_worst_status() {
        let report = parse_show_health(AOS8_HEALTH);
        assert_eq!(report.modules.len(), 3);
        assert_eq!(report.overall_status, "WARNING");
        // Status issue plus CPU threshold issue for the warning module.
        assert!(report.issues.iter().any(|i| i.contains("NI slot 1/2 status: WARNING")));
        assert!(report.issues.iter().any(|i| i.contains("CPU usage high: 88%")));
    }

    #[test]
    fn os6860_layout_produces_single_cmm_module() {
        let report = parse_show_health(OS6860_HEALTH);
        assert_eq!(report.modules.len(), 1);
        assert_eq!(report.modules[0].module_name, "CMM");
        assert_eq!(report.modules[0].cpu_usage_percent, 38);
        assert_eq!(report.modules[0].memory_usage_percent, 10);
        assert_eq!(report.overall_status, "OK");
        assert!(report.issues.is_empty());
    }

    #[test]
    fn os6860_thresholds_emit_issues() {
        let hot = OS6860_HEALTH.replace("CPU                     38", "CPU                     92");
        let report = parse_show_health(&hot);
        assert_eq!(report.overall_status, "WARNING");
        assert_eq!(report.issues, vec!["CMM CPU usage high: 92%".to_string()]);
    }

    #[test]
    fn empty_input_is_ok_with_no_modules() {
        let report = parse_show_health("");
        assert!(report.modules.is_empty());
        assert_eq!(report.overall_status, "OK");
    }
}
