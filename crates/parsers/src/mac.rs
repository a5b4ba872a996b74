//! Parsers for `show mac-learning` and `show arp`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

// AOS8 domain layout: "VLAN   1098   70:4c:a5:50:45:ce   dynamic   bridging   1/1/24"
static RE_MAC_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)VLAN\s+(\d+)\s+([0-9a-fA-F:]{17})\s+(\S+)\s+\S+\s+(\d+/\d+/\d+|\d+)",
    )
});

// Columnar layout without the domain column: "1098  70:4c:a5:50:45:ce  dynamic  1/1/24"
static RE_MAC_COLUMNAR: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"^\s*(\d+)\s+([0-9a-fA-F:]{17})\s+(dynamic|static|permanent)\s+(?:\S+\s+)?(\d+/\d+/\d+|\d+)",
    )
});

static RE_ARP_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"^\s*((?:\d{1,3}\.){3}\d{1,3})\s+([0-9a-fA-F:]{17})\s+(\S+)\s+.*?(\d+/\d+/\d+)(?:\s+vlan\s+(\d+))?",
    )
});

/// A learned MAC address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacEntry {
    /// Lowercased, colon-separated.
    pub mac_address: String,
    pub vlan: u32,
    pub port: String,
    /// `dynamic` or `static`.
    pub r#type: String,
}

/// Normalize a MAC to lowercase colon form. Accepts `:` and `-` separators.
#[must_use]
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().to_ascii_lowercase().replace('-', ":")
}

/// Parse `show mac-learning` output (any filter form).
///
/// Accepts both the AOS8 `VLAN <id> <mac> …` domain layout and the plain
/// columnar layout. Legend and total lines are skipped.
#[must_use]
pub fn parse_mac_learning(output: &str) -> Vec<MacEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if line.contains("Legend:")
            || line.contains("Domain")
            || line.contains("----")
            || line.contains("Total number")
        {
            continue;
        }

        if let Some(caps) = RE_MAC_DOMAIN.captures(line) {
            let Ok(vlan) = caps[1].parse() else {
                continue;
            };
            entries.push(MacEntry {
                mac_address: normalize_mac(&caps[2]),
                vlan,
                port: caps[4].to_string(),
                r#type: caps[3].to_ascii_lowercase(),
            });
            continue;
        }

        if let Some(caps) = RE_MAC_COLUMNAR.captures(line) {
            let Ok(vlan) = caps[1].parse() else {
                continue;
            };
            entries.push(MacEntry {
                mac_address: normalize_mac(&caps[2]),
                vlan,
                port: caps[4].to_string(),
                r#type: caps[3].to_ascii_lowercase(),
            });
        }
    }

    entries
}

/// One `show arp` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArpEntry {
    pub ip_address: String,
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u32>,
    pub port: String,
    pub r#type: String,
}

/// Parse `show arp` output.
#[must_use]
pub fn parse_show_arp(output: &str) -> Vec<ArpEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if line.contains("----") || line.contains("Total") || line.contains("Hardware") {
            continue;
        }
        let Some(caps) = RE_ARP_ROW.captures(line) else {
            continue;
        };
        entries.push(ArpEntry {
            ip_address: caps[1].to_string(),
            mac_address: normalize_mac(&caps[2]),
            vlan: caps.get(5).and_then(|m| m.as_str().parse().ok()),
            port: caps[4].to_string(),
            r#type: caps[3].to_ascii_lowercase(),
        });
    }

    entries
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const MAC_LEARNING: &str = "\
Legend: Mac Address: * = address not valid,
   Domain    Vlan/SrvcId/[ISId/vnId]  Mac Address         Type       Operation  Interface
------------+------------------------+-------------------+----------+----------+----------
   VLAN      1098                     70:4C:A5:50:45:CE    dynamic    bridging   1/1/24
   VLAN      19                       24:9a:d8:1f:20:99    dynamic    bridging   1/1/4
 Total number of Valid MAC addresses above = 2
";

    const MAC_COLUMNAR: &str = "\
  Vlan    Mac Address          Type     Protocol  Port
-------+--------------------+----------+---------+------
  1098   70-4C-A5-50-45-CE    dynamic    ---       1/1/24
";

    const ARP: &str = "\
Total 2 arp entries
 IP Addr          Hardware Addr       Type      Flags  Port      Interface
-----------------+-------------------+----------+------+---------+----------
 10.9.19.50       70:4c:a5:50:45:ce   DYNAMIC           1/1/24   vlan 1098
 10.9.19.1        2c:fa:a2:5e:33:71   STATIC            1/1/1    vlan 1
";

    #[test]
    fn domain_layout_parses() {
        let entries = parse_mac_learning(MAC_LEARNING);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mac_address, "70:4c:a5:50:45:ce");
        assert_eq!(entries[0].vlan, 1098);
        assert_eq!(entries[0].port, "1/1/24");
        assert_eq!(entries[0].r#type, "dynamic");
    }

    #[test]
    fn columnar_layout_parses() {
        let entries = parse_mac_learning(MAC_COLUMNAR);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mac_address, "70:4c:a5:50:45:ce");
        assert_eq!(entries[0].vlan, 1098);
        assert_eq!(entries[0].port, "1/1/24");
    }

    #[test]
    fn mac_normalization_accepts_both_separators() {
        assert_eq!(normalize_mac("70-4C-A5-50-45-CE"), "70:4c:a5:50:45:ce");
        assert_eq!(normalize_mac("70:4C:A5:50:45:CE"), "70:4c:a5:50:45:ce");
    }

    #[test]
    fn arp_rows_parse_with_vlan() {
        let entries = parse_show_arp(ARP);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ip_address, "10.9.19.50");
        assert_eq!(entries[0].mac_address, "70:4c:a5:50:45:ce");
        assert_eq!(entries[0].vlan, Some(1098));
        assert_eq!(entries[0].port, "1/1/24");
        assert_eq!(entries[0].r#type, "dynamic");
    }

    #[test]
    fn empty_and_garbage_inputs_degrade() {
        assert!(parse_mac_learning("").is_empty());
        assert!(parse_show_arp("no entries found\n").is_empty());
    }
}
