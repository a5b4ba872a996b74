//! Parsers for `show ntp status`, `show ntp client server-list`, and
//! `show ntp peers`.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

static RE_SYNCED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)synchronized|sync.*yes|status.*synchronized"));

static RE_NOT_SYNCED: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)not.*synchronized|sync.*no"));

static RE_MODE: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Mode:\s*(client|server|peer|broadcast)"));

static RE_STRATUM: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"Stratum:\s*(\d+)"));

static RE_REF_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r":\s*(\d+\.\d+\.\d+\.\d+)"));

static RE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"(?i)Offset:\s*([-\d.]+)\s*ms"));

static RE_MS_VALUE: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"(?i):\s*([\d.]+)\s*ms"));

static RE_SERVER_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"(?i)(\d+\.\d+\.\d+\.\d+)\s+(synchronized|reachable|unreachable|inactive)\s+(\d+)\s+([\d.]+)\s+(\d+)\s*(\*)?",
    )
});

static RE_PEER_ROW: LazyLock<Regex> = LazyLock::new(|| {
    crate::static_regex(
        r"([*+\-x\s])\s*(\d+\.\d+\.\d+\.\d+)\s+([\w.]+)\s+(\d+)\s+(\d+)\s+(\d+)\s+([\d.]+)\s*([\d.]+)?\s*([\d.]+)?",
    )
});

/// Parsed `show ntp status` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NtpStatus {
    pub synchronized: bool,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stratum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_delay_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dispersion_ms: Option<f64>,
}

impl Default for NtpStatus {
    fn default() -> Self {
        Self {
            synchronized: false,
            mode: "unknown".into(),
            stratum: None,
            reference_clock: None,
            offset_ms: None,
            root_delay_ms: None,
            root_dispersion_ms: None,
        }
    }
}

/// Parse `show ntp status` output.
#[must_use]
pub fn parse_show_ntp_status(output: &str) -> NtpStatus {
    let mut status = NtpStatus::default();

    for line in output.lines() {
        if RE_SYNCED.is_match(line) {
            status.synchronized = true;
        }
        if RE_NOT_SYNCED.is_match(line) {
            status.synchronized = false;
        }

        if let Some(caps) = RE_MODE.captures(line) {
            status.mode = caps[1].to_ascii_lowercase();
        }
        if line.contains("Stratum:") {
            if let Some(caps) = RE_STRATUM.captures(line) {
                status.stratum = caps[1].parse().ok();
            }
        }
        if line.contains("Reference Clock:") || line.contains("Reference:") {
            if let Some(caps) = RE_REF_CLOCK.captures(line) {
                status.reference_clock = Some(caps[1].to_string());
            }
        }
        if line.contains("Offset:") {
            if let Some(caps) = RE_OFFSET.captures(line) {
                status.offset_ms = caps[1].parse().ok();
            }
        }
        if line.contains("Root Delay:") {
            if let Some(caps) = RE_MS_VALUE.captures(line) {
                status.root_delay_ms = caps[1].parse().ok();
            }
        }
        if line.contains("Root Dispersion:") {
            if let Some(caps) = RE_MS_VALUE.captures(line) {
                status.root_dispersion_ms = caps[1].parse().ok();
            }
        }
    }

    status
}

/// One configured NTP server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NtpServer {
    pub ip: String,
    pub status: String,
    pub stratum: u32,
    pub delay_ms: f64,
    /// Reachability register; 255 means all recent polls succeeded.
    pub reachability: u32,
    pub preferred: bool,
}

/// Parse `show ntp client server-list` output.
#[must_use]
pub fn parse_show_ntp_server_list(output: &str) -> Vec<NtpServer> {
    let mut servers = Vec::new();

    for line in output.lines() {
        let Some(caps) = RE_SERVER_ROW.captures(line) else {
            continue;
        };
        servers.push(NtpServer {
            ip: caps[1].to_string(),
            status: caps[2].to_ascii_lowercase(),
            stratum: caps[3].parse().unwrap_or(0),
            delay_ms: caps[4].parse().unwrap_or(0.0),
            reachability: caps[5].parse().unwrap_or(0),
            preferred: caps.get(6).is_some(),
        });
    }

    servers
}

/// One NTP peer association.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NtpPeer {
    pub ip: String,
    /// Decoded from the selection indicator column.
    pub status: String,
    pub reference_id: String,
    pub stratum: u32,
    pub poll_interval: u32,
    pub reachability: u32,
    pub delay_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<f64>,
}

/// Parse `show ntp peers` output.
#[must_use]
pub fn parse_show_ntp_peers(output: &str) -> Vec<NtpPeer> {
    let mut peers = Vec::new();

    for line in output.lines() {
        let Some(caps) = RE_PEER_ROW.captures(line) else {
            continue;
        };
        let status = match caps[1].trim() {
            "*" => "synchronized",
            "+" => "candidate",
            "-" => "outlier",
            "x" => "falseticker",
            "" => "rejected",
            _ => "unknown",
        };
        peers.push(NtpPeer {
            ip: caps[2].to_string(),
            status: status.into(),
            reference_id: caps[3].to_string(),
            stratum: caps[4].parse().unwrap_or(0),
            poll_interval: caps[5].parse().unwrap_or(0),
            reachability: caps[6].parse().unwrap_or(0),
            delay_ms: caps[7].parse().unwrap_or(0.0),
            offset_ms: caps.get(8).and_then(|m| m.as_str().parse().ok()),
            jitter_ms: caps.get(9).and_then(|m| m.as_str().parse().ok()),
        });
    }

    peers
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const NTP_STATUS: &str = "\
Current time:          TUE JUL 29 2025 14:02:11 (CEST)
NTP Status:            synchronized
Mode:                  client
Stratum:               3
Reference Clock:       10.1.0.200
Offset:                -1.25 ms
Root Delay:            12.5 ms
Root Dispersion:       40.1 ms
";

    const SERVER_LIST: &str = "\
Server IP       Status        Stratum  Delay(ms)  Reach  Pref
10.1.0.200      synchronized  2        2.5        255    *
10.1.0.201      unreachable   16       0.0        0
";

    #[test]
    fn status_fields_parse() {
        let status = parse_show_ntp_status(NTP_STATUS);
        assert!(status.synchronized);
        assert_eq!(status.mode, "client");
        assert_eq!(status.stratum, Some(3));
        assert_eq!(status.reference_clock.as_deref(), Some("10.1.0.200"));
        assert_eq!(status.offset_ms, Some(-1.25));
        assert_eq!(status.root_delay_ms, Some(12.5));
    }

    #[test]
    fn unsynchronized_wins_on_its_line() {
        let status = parse_show_ntp_status("NTP Status:  not synchronized\nStratum: 16\n");
        assert!(!status.synchronized);
        assert_eq!(status.stratum, Some(16));
    }

    #[test]
    fn server_list_rows_parse() {
        let servers = parse_show_ntp_server_list(SERVER_LIST);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].ip, "10.1.0.200");
        assert_eq!(servers[0].status, "synchronized");
        assert!(servers[0].preferred);
        assert_eq!(servers[0].reachability, 255);
        assert_eq!(servers[1].status, "unreachable");
        assert!(!servers[1].preferred);
    }

    #[test]
    fn peers_decode_selection_indicator() {
        let out = "* 10.1.0.200  .GPS.  2  64  377  2.5  0.125  0.250\n+ 10.1.0.201  .PPS.  2  64  377  3.1\n";
        let peers = parse_show_ntp_peers(out);
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].status, "synchronized");
        assert_eq!(peers[0].offset_ms, Some(0.125));
        assert_eq!(peers[1].status, "candidate");
        assert!(peers[1].offset_ms.is_none());
    }

    #[test]
    fn empty_input_degrades() {
        let status = parse_show_ntp_status("");
        assert!(!status.synchronized);
        assert_eq!(status.mode, "unknown");
        assert!(parse_show_ntp_server_list("").is_empty());
    }
}
