//! Config schema types (ssh, command policy, templates, zone auth, server).

use std::collections::HashMap;

use {
    secrecy::SecretString,
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AosdConfig {
    pub ssh: SshConfig,
    pub command_policy: CommandPolicyConfig,
    pub templates: TemplatesConfig,
    pub zone_auth: Option<ZoneAuthConfig>,
    /// Named SSH bastions referenced by `Device.jump`.
    pub jump_hosts: Vec<JumpHostConfig>,
    /// Fallback connection parameters applied when a request specifies none.
    pub device_defaults: Option<DeviceDefaults>,
    pub server: ServerConfig,
}

/// SSH session parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Reject hosts absent from the known-hosts material. When false, new
    /// keys are learned and saved to `known_hosts_file`.
    pub strict_host_key_checking: bool,
    /// Additional known-hosts file (strict mode) or the learn target.
    pub known_hosts_file: Option<String>,

    pub connect_timeout_s: u64,
    pub banner_timeout_s: u64,
    pub auth_timeout_s: u64,

    pub default_command_timeout_s: u64,
    /// Per-stream output cap. Excess bytes are dropped and the result is
    /// flagged truncated.
    pub max_output_bytes: usize,

    /// Commands executed before the target command (e.g. disable paging).
    /// Their output is discarded.
    pub pre_commands: Vec<String>,

    pub keepalive_s: Option<u64>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            strict_host_key_checking: true,
            known_hosts_file: None,
            connect_timeout_s: 10,
            banner_timeout_s: 10,
            auth_timeout_s: 10,
            default_command_timeout_s: 30,
            max_output_bytes: 200_000,
            pre_commands: Vec::new(),
            keepalive_s: Some(30),
        }
    }
}

/// A single output redaction rule, applied as a global regex substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionRule {
    pub pattern: String,
    #[serde(default = "default_replacement")]
    pub replacement: String,
}

fn default_replacement() -> String {
    "***".into()
}

/// Command policy: allow/deny regexes plus output sanitization rules.
///
/// A command must match at least one allow regex and none of the deny
/// regexes. Matching is anchored at the start of the command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandPolicyConfig {
    pub allow_regex: Vec<String>,
    pub deny_regex: Vec<String>,

    pub max_command_length: usize,
    pub deny_multiline: bool,

    /// Strip ANSI escape sequences from command output.
    pub strip_ansi: bool,

    pub redactions: Vec<RedactionRule>,
}

impl Default for CommandPolicyConfig {
    fn default() -> Self {
        Self {
            allow_regex: vec![
                r"^show\s+.*$".into(),
                r"^vrf\s+\S+\s+show\s+.*$".into(),
                r"^ping\s+.*$".into(),
                r"^traceroute\s+.*$".into(),
                r"^lanpower\s+port\s+\d+/\d+/\d+\s+admin-state\s+(enable|disable)$".into(),
                r"^write\s+terminal$".into(),
            ],
            deny_regex: Vec::new(),
            max_command_length: 512,
            deny_multiline: true,
            strip_ansi: true,
            redactions: vec![
                RedactionRule {
                    pattern: r"(?i)(password\s+)(\S+)".into(),
                    replacement: "${1}***".into(),
                },
                RedactionRule {
                    pattern: r"(?i)(community\s+)(\S+)".into(),
                    replacement: "${1}***".into(),
                },
            ],
        }
    }
}

/// Command templates for the typed diagnostic tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub ping: String,
    pub traceroute: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            ping: "ping {destination}".into(),
            traceroute: "traceroute {destination}".into(),
        }
    }
}

/// SSH credential material. Inline passwords are discouraged in production;
/// prefer `password_env`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    PasswordEnv {
        env: String,
    },
    PasswordInline {
        password: SecretString,
    },
    PrivateKeyFile {
        private_key_file: String,
        #[serde(default)]
        passphrase_env: Option<String>,
    },
}

/// An intermediate SSH bastion. Always fully specified — no defaulting.
#[derive(Debug, Clone, Deserialize)]
pub struct JumpHostConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    pub auth: Credential,
}

fn default_ssh_port() -> u16 {
    22
}

/// Fallback connection parameters for devices that carry no explicit
/// credentials in the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceDefaults {
    pub username_env: Option<String>,
    pub username: Option<String>,
    pub auth: Option<Credential>,
    pub jump: Option<String>,
}

/// Credentials for a zone or the global slot. Env names take precedence
/// over literals when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ZoneCredentialSpec {
    pub username_env: Option<String>,
    pub username: Option<String>,
    pub password_env: Option<String>,
    pub password: Option<SecretString>,
}

/// Zone-based credential selection. The zone id is the second octet of the
/// device's IPv4 address: 10.9.5.10 → zone 9.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneAuthConfig {
    #[serde(default, rename = "global")]
    pub global: Option<ZoneCredentialSpec>,
    #[serde(default)]
    pub zones: HashMap<u8, ZoneCredentialSpec>,
}

/// Transport-layer settings: bind address, auth gate, rate limiting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,

    /// Static secret accepted as `Authorization: Bearer` or
    /// `X-Internal-Api-Key`. Unset disables the check.
    pub api_key: Option<SecretString>,

    /// Client CIDR allow-list. Empty allows all.
    pub allowed_ips: Vec<String>,

    /// Per-client-IP request budget per minute. Unset disables throttling.
    pub rate_limit_per_minute: Option<u32>,

    /// Reject tool calls whose context carries no subject.
    pub require_authz_context: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            api_key: None,
            allowed_ips: Vec::new(),
            rate_limit_per_minute: None,
            require_authz_context: false,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_closed() {
        let cfg = AosdConfig::default();
        assert!(cfg.ssh.strict_host_key_checking);
        assert!(cfg.command_policy.deny_multiline);
        assert!(cfg.command_policy.strip_ansi);
        assert!(!cfg.command_policy.allow_regex.is_empty());
        assert_eq!(cfg.ssh.max_output_bytes, 200_000);
    }

    #[test]
    fn credential_variants_parse() {
        let yaml = r"
type: password_env
env: AOS_ZONE9_PASSWORD
";
        let cred: Credential = serde_yaml::from_str(yaml).expect("parse");
        assert!(matches!(cred, Credential::PasswordEnv { ref env } if env == "AOS_ZONE9_PASSWORD"));

        let yaml = r"
type: private_key_file
private_key_file: /etc/aosd/id_ed25519
passphrase_env: AOSD_KEY_PASSPHRASE
";
        let cred: Credential = serde_yaml::from_str(yaml).expect("parse");
        assert!(matches!(cred, Credential::PrivateKeyFile { .. }));
    }

    #[test]
    fn zone_auth_parses_numeric_keys() {
        let yaml = r"
global:
  username_env: AOS_GLOBAL_USERNAME
  password_env: AOS_GLOBAL_PASSWORD
zones:
  9:
    username_env: AOS_ZONE9_USERNAME
    password_env: AOS_ZONE9_PASSWORD
";
        let zone: ZoneAuthConfig = serde_yaml::from_str(yaml).expect("parse");
        assert!(zone.global.is_some());
        assert!(zone.zones.contains_key(&9));
    }
}
