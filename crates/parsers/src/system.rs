//! `show system`, `show chassis`, and `show hardware-info` parsers.

use std::sync::LazyLock;

use {
    regex::Regex,
    serde::Serialize,
};

static RE_KV_COLON: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"^\s*([A-Za-z0-9 &/_-]+?)\s*:\s*(.*?)\s*,?\s*$"));

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| crate::static_regex(r"\b\d+\.\d+\.\d+\.R\d+\b"));

static RE_MODEL: LazyLock<Regex> = LazyLock::new(|| crate::static_regex(r"\bOS\d+[A-Z0-9-]+\b"));

/// Facts from the `System:` block of `show system`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemInfo {
    pub system_name: Option<String>,
    pub system_description: Option<String>,
    pub snmp_object_id: Option<String>,
    pub uptime: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub services: Option<String>,
    pub date_time: Option<String>,
    /// Model token (e.g. `OS6860-P24`) extracted from the description.
    pub model: Option<String>,
    /// Software version token (e.g. `8.9.94.R04`) extracted from the description.
    pub software_version: Option<String>,
}

/// Parse `show system` output.
///
/// Only the `System:` block is considered; the next top-level section
/// (e.g. `Flash Space:`) terminates parsing so unrelated key/value pairs
/// never leak in.
#[must_use]
pub fn parse_show_system(output: &str) -> SystemInfo {
    let mut info = SystemInfo::default();
    let mut in_system = false;

    for raw in output.lines() {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.trim().eq_ignore_ascii_case("system:") {
            in_system = true;
            continue;
        }
        if in_system && !line.is_empty() && !line.starts_with(' ') && !line.starts_with('\t') {
            break;
        }
        if !in_system {
            continue;
        }

        let Some(caps) = RE_KV_COLON.captures(line) else {
            continue;
        };
        let key = caps[1].trim().to_ascii_lowercase();
        let value = caps[2].trim().trim_matches('"').to_string();

        match key.as_str() {
            "description" => {
                if let Some(m) = RE_VERSION.find(&value) {
                    info.software_version = Some(m.as_str().to_string());
                }
                if let Some(m) = RE_MODEL.find(&value) {
                    info.model = Some(m.as_str().to_string());
                }
                info.system_description = Some(value);
            },
            "object id" => info.snmp_object_id = Some(value),
            "up time" => info.uptime = Some(value),
            "contact" => info.contact = Some(value),
            "name" => info.system_name = Some(value),
            "location" => info.location = Some(value),
            "services" => info.services = Some(value),
            "date & time" => info.date_time = Some(value),
            _ => {},
        }
    }

    info
}

/// Facts from `show chassis`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChassisInfo {
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub part_number: Option<String>,
    pub hardware_revision: Option<String>,
    pub manufacture_date: Option<String>,
    pub base_mac: Option<String>,
}

/// Parse `show chassis` output (comma-terminated key/value lines).
#[must_use]
pub fn parse_show_chassis(output: &str) -> ChassisInfo {
    let mut info = ChassisInfo::default();

    for raw in output.lines() {
        let Some(caps) = RE_KV_COLON.captures(raw.trim_end_matches(['\r', '\n'])) else {
            continue;
        };
        let key = caps[1].trim().to_ascii_lowercase();
        let value = caps[2].trim().trim_matches('"').to_string();

        match key.as_str() {
            "model name" => info.model = Some(value),
            "serial number" => info.serial_number = Some(value),
            "part number" => info.part_number = Some(value),
            "hardware revision" => info.hardware_revision = Some(value),
            "manufacture date" => info.manufacture_date = Some(value),
            "mac address" => info.base_mac = Some(value),
            _ => {},
        }
    }

    info
}

/// Selected fields from `show hardware-info`. Platforms differ; everything
/// is best effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardwareInfo {
    pub cpu_manufacturer: Option<String>,
    pub cpu_model: Option<String>,
    pub flash_size: Option<String>,
    pub ram_size: Option<String>,
    pub fpga_version: Option<String>,
    pub bootrom_version: Option<String>,
    pub miniboot_version: Option<String>,
}

impl HardwareInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpu_manufacturer.is_none()
            && self.cpu_model.is_none()
            && self.flash_size.is_none()
            && self.ram_size.is_none()
            && self.fpga_version.is_none()
            && self.bootrom_version.is_none()
            && self.miniboot_version.is_none()
    }
}

/// Parse `show hardware-info` output.
#[must_use]
pub fn parse_show_hardware_info(output: &str) -> HardwareInfo {
    let mut hw = HardwareInfo::default();

    for raw in output.lines() {
        let Some(caps) = RE_KV_COLON.captures(raw.trim_end_matches(['\r', '\n'])) else {
            continue;
        };
        let key = caps[1].trim().to_ascii_lowercase();
        let value = caps[2].trim().trim_matches('"').to_string();

        match key.as_str() {
            "cpu manufacturer" => hw.cpu_manufacturer = Some(value),
            "cpu model" => hw.cpu_model = Some(value),
            "flash size" => hw.flash_size = Some(value),
            "ram size" => hw.ram_size = Some(value),
            "fpga version" => hw.fpga_version = Some(value),
            "bootrom version" => hw.bootrom_version = Some(value),
            "miniboot version" => hw.miniboot_version = Some(value),
            _ => {},
        }
    }

    hw
}
