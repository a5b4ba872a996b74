//! Zone-based credential resolution for multi-site deployments.
//!
//! The zone id is the second octet of the device's IPv4 address:
//! 10.9.5.10 → zone 9, 192.168.1.1 → zone 168. Hostnames have no zone.

use {
    secrecy::SecretString,
    tracing::{debug, warn},
};

use aosd_config::{ZoneAuthConfig, ZoneCredentialSpec};

/// Extract the zone id from a dotted-quad IPv4 host.
///
/// Returns `None` for hostnames, malformed addresses, or octets out of
/// range.
#[must_use]
pub fn extract_zone(host: &str) -> Option<u8> {
    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() != 4 {
        return None;
    }
    let mut parsed = [0u8; 4];
    for (i, octet) in octets.iter().enumerate() {
        if octet.is_empty() || !octet.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        parsed[i] = octet.parse().ok()?;
    }
    Some(parsed[1])
}

/// A fully resolved username/password pair for one zone slot.
#[derive(Clone)]
pub struct ResolvedCredential {
    pub username: String,
    pub password: SecretString,
    /// `None` marks the global slot.
    pub zone_id: Option<u8>,
}

/// Resolves credentials for a host from the configured zone map.
pub struct ZoneResolver {
    config: ZoneAuthConfig,
}

impl ZoneResolver {
    #[must_use]
    pub fn new(config: ZoneAuthConfig) -> Self {
        Self { config }
    }

    /// Ordered credential candidates for a host: global first (when it
    /// resolves), then the zone-specific entry. A candidate resolves only
    /// when both username and password are non-empty after env lookup;
    /// missing env vars skip the entry rather than failing.
    #[must_use]
    pub fn resolve(&self, host: &str) -> Vec<ResolvedCredential> {
        let mut candidates = Vec::new();

        if let Some(ref global) = self.config.global {
            if let Some((username, password)) = resolve_spec(global) {
                debug!(host, "using global zone credentials");
                candidates.push(ResolvedCredential {
                    username,
                    password,
                    zone_id: None,
                });
            }
        }

        if let Some(zone_id) = extract_zone(host) {
            if let Some(spec) = self.config.zones.get(&zone_id) {
                match resolve_spec(spec) {
                    Some((username, password)) => {
                        debug!(host, zone_id, "using zone credentials");
                        candidates.push(ResolvedCredential {
                            username,
                            password,
                            zone_id: Some(zone_id),
                        });
                    },
                    None => {
                        warn!(host, zone_id, "zone configured but credentials did not resolve");
                    },
                }
            }
        }

        if candidates.is_empty() {
            debug!(host, "no zone credentials resolved");
        }
        candidates
    }

    /// First resolved candidate, if any.
    #[must_use]
    pub fn primary(&self, host: &str) -> Option<ResolvedCredential> {
        self.resolve(host).into_iter().next()
    }
}

/// Resolve one spec: env var names take precedence over literals; empty
/// values never count.
fn resolve_spec(spec: &ZoneCredentialSpec) -> Option<(String, SecretString)> {
    use secrecy::ExposeSecret;

    let username = spec
        .username_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
        .or_else(|| spec.username.clone().filter(|v| !v.is_empty()))?;

    let password = spec
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
        .map(SecretString::new)
        .or_else(|| {
            spec.password
                .clone()
                .filter(|v| !v.expose_secret().is_empty())
        })?;

    Some((username, password))
}
