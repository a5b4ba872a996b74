//! Parsers for the `show spantree` command family.

use serde::Serialize;

/// Parsed `show spantree mode` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpantreeMode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_cost_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_vlan_containment: Option<String>,
}

/// Parse `show spantree mode` output.
#[must_use]
pub fn parse_spantree_mode(output: &str) -> SpantreeMode {
    let mut mode = SpantreeMode::default();

    for line in output.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_end_matches(',').to_string();

        if key.contains("Current Running Mode") {
            mode.mode = Some(value);
        } else if key.contains("Current Protocol") {
            mode.protocol = Some(value);
        } else if key.contains("Path Cost Mode") {
            mode.path_cost_mode = Some(value);
        } else if key.contains("Auto Vlan Containment") {
            mode.auto_vlan_containment = Some(value);
        }
    }

    mode
}

/// Parsed `show spantree cist` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpantreeCist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designated_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cst_designated_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_to_root: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_to_cst_root: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_changes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tc_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tc_bridge: Option<String>,
}

/// Parse `show spantree cist` output (key/value form).
#[must_use]
pub fn parse_spantree_cist(output: &str) -> SpantreeCist {
    let mut cist = SpantreeCist::default();

    for line in output.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_end_matches(',').to_string();

        if key.contains("Spanning Tree Status") {
            cist.stp_status = Some(value);
        } else if key == "Protocol" {
            cist.protocol = Some(value);
        } else if key == "Priority" {
            cist.priority = Some(value);
        } else if key == "Bridge ID" {
            cist.bridge_id = Some(value);
        } else if key == "CST Designated Root" {
            cist.cst_designated_root = Some(value);
        } else if key == "Cost to CST Root" {
            cist.cost_to_cst_root = value.parse().ok();
        } else if key == "Designated Root" {
            cist.designated_root = Some(value);
        } else if key == "Cost to Root Bridge" {
            cist.cost_to_root = value.parse().ok();
        } else if key == "Root Port" {
            cist.root_port = Some(value);
        } else if key == "Topology Changes" {
            cist.topology_changes = value.parse().ok();
        } else if key == "Topology age" {
            cist.topology_age = Some(value);
        } else if key == "Last TC Rcvd Port" {
            cist.last_tc_port = Some(value);
        } else if key == "Last TC Rcvd Bridge" {
            cist.last_tc_bridge = Some(value);
        }
    }

    cist
}

/// One `show spantree ports` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpantreePort {
    pub msti: String,
    pub port_id: String,
    pub oper_status: String,
    pub path_cost: String,
    pub role: String,
    pub loop_guard: String,
}

/// Parse `show spantree ports` output.
#[must_use]
pub fn parse_spantree_ports(output: &str) -> Vec<SpantreePort> {
    let mut ports = Vec::new();
    let mut in_data = false;

    for line in output.lines() {
        let line = line.trim();

        if line.contains("Msti") && line.contains("Port") && line.contains("Oper Status") {
            in_data = true;
            continue;
        }
        if !in_data || line.is_empty() || line.starts_with("---") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 || parts[0] == "Msti" || parts[1] == "Port" {
            continue;
        }

        ports.push(SpantreePort {
            msti: parts[0].to_string(),
            port_id: parts[1].to_string(),
            oper_status: parts[2].to_string(),
            path_cost: parts[3].to_string(),
            role: parts[4].to_string(),
            loop_guard: parts[5].to_string(),
        });
    }

    ports
}

/// One `show spantree vlan` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpantreeVlan {
    pub vlan_id: u32,
    pub status: String,
    pub protocol: String,
    pub priority: String,
}

/// Parse `show spantree vlan` output.
#[must_use]
pub fn parse_spantree_vlans(output: &str) -> Vec<SpantreeVlan> {
    let mut vlans = Vec::new();
    let mut in_data = false;

    for line in output.lines() {
        let line = line.trim();

        if line.contains("Vlan") && line.contains("STP Status") && line.contains("Protocol") {
            in_data = true;
            continue;
        }
        if !in_data || line.is_empty() || line.starts_with("---") {
            continue;
        }
        if line.contains("Spanning Tree") || line.contains("Inactive") || line.contains("Path Cost Mode")
        {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let Ok(vlan_id) = parts[0].parse() else {
            continue;
        };
        vlans.push(SpantreeVlan {
            vlan_id,
            status: parts[1].to_string(),
            protocol: parts[2].to_string(),
            priority: parts[3].to_string(),
        });
    }

    vlans
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const CIST: &str = "\
Per Vlan Spanning Tree Parameters for Cist
  Spanning Tree Status :                    ON,
  Protocol             :                  MSTP,
  mode                 :      FLAT (Single STP),
  Priority             :        32768 (0x8000),
  Bridge ID            : 8000-2c:fa:a2:5e:33:71,
  CST Designated Root  : 1000-00:e0:b1:c5:f2:40,
  Cost to CST Root     :                  2004,
  Designated Root      : 8000-00:e0:b1:c5:f2:40,
  Cost to Root Bridge  :                  2000,
  Root Port            :                1/1/25,
  TxHoldCount          :                     3,
  Topology Changes     :                    17,
  Topology age         :           0:10:22,
  Last TC Rcvd Port    :                1/1/25,
";

    const PORTS: &str = "\
  Msti  Port      Oper Status  Path Cost  Role   Loop Guard
-----+---------+------------+---------+-------+----------
    0  1/1/4     FORW         19        DESG    DIS
    0  1/1/19    FORW         19        DESG    DIS
    0  1/1/25    FORW         2000      ROOT    DIS
    0  1/1/26    BLOCK        2000      ALT     DIS
";

    const VLANS: &str = "\
  Spanning Tree Path Cost Mode : AUTO
 Vlan   STP Status   Protocol   Priority
------+------------+----------+--------------
    1     ON          MSTP      32768 (0x8000)
   19     ON          MSTP      32768 (0x8000)
 1098     OFF         MSTP      32768 (0x8000)
";

    #[test]
    fn mode_parses_key_values() {
        let out = "\
Spanning Tree Global Parameters
   Current Running Mode : Flat,
   Current Protocol     : MSTP,
   Path Cost Mode       : AUTO,
   Auto Vlan Containment: Enabled
";
        let mode = parse_spantree_mode(out);
        assert_eq!(mode.mode.as_deref(), Some("Flat"));
        assert_eq!(mode.protocol.as_deref(), Some("MSTP"));
        assert_eq!(mode.auto_vlan_containment.as_deref(), Some("Enabled"));
    }

    #[test]
    fn cist_parses_bridge_and_root() {
        let cist = parse_spantree_cist(CIST);
        assert_eq!(cist.stp_status.as_deref(), Some("ON"));
        assert_eq!(cist.bridge_id.as_deref(), Some("8000-2c:fa:a2:5e:33:71"));
        assert_eq!(cist.designated_root.as_deref(), Some("8000-00:e0:b1:c5:f2:40"));
        assert_eq!(cist.cost_to_root, Some(2000));
        assert_eq!(cist.root_port.as_deref(), Some("1/1/25"));
        assert_eq!(cist.topology_changes, Some(17));
    }

    #[test]
    fn ports_parse_after_header() {
        let ports = parse_spantree_ports(PORTS);
        assert_eq!(ports.len(), 4);
        assert_eq!(ports[2].port_id, "1/1/25");
        assert_eq!(ports[2].role, "ROOT");
        assert_eq!(ports[2].oper_status, "FORW");
        assert_eq!(ports[3].oper_status, "BLOCK");
    }

    #[test]
    fn vlans_parse_and_skip_legend() {
        let vlans = parse_spantree_vlans(VLANS);
        assert_eq!(vlans.len(), 3);
        assert_eq!(vlans[0].vlan_id, 1);
        assert_eq!(vlans[2].vlan_id, 1098);
        assert_eq!(vlans[2].status, "OFF");
    }

    #[test]
    fn empty_inputs_degrade() {
        assert_eq!(parse_spantree_mode(""), SpantreeMode::default());
        assert!(parse_spantree_ports("").is_empty());
        assert!(parse_spantree_vlans("").is_empty());
    }
}
