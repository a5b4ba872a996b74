//! OpenSSH known-hosts handling: strict verification against loaded
//! material, or learn-on-first-use with a single-entry file update.

use std::{
    collections::HashMap,
    fs::OpenOptions,
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use {
    aosd_config::SshConfig,
    russh::keys::PublicKey,
};

use crate::device::SshError;

/// One accepted key for a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownKey {
    pub key_type: String,
    pub key_base64: String,
}

/// Host-key verification policy, fixed at startup.
pub enum HostKeyPolicy {
    /// Reject hosts absent from the loaded known-hosts material.
    Strict {
        known: HashMap<String, Vec<KnownKey>>,
    },
    /// Accept on first use and persist the key to the configured file.
    Learn { file: Option<PathBuf> },
}

impl HostKeyPolicy {
    /// Build the policy from config. In strict mode the system known-hosts
    /// files are loaded best effort, but a configured additional file that
    /// is missing is a hard error.
    pub fn from_config(cfg: &SshConfig) -> Result<Self, SshError> {
        if !cfg.strict_host_key_checking {
            return Ok(Self::Learn {
                file: cfg.known_hosts_file.clone().map(PathBuf::from),
            });
        }

        let mut known: HashMap<String, Vec<KnownKey>> = HashMap::new();

        for path in system_known_hosts_paths() {
            if let Ok(content) = std::fs::read_to_string(&path) {
                merge_entries(&mut known, &content);
            }
        }

        if let Some(ref extra) = cfg.known_hosts_file {
            let content = std::fs::read_to_string(extra).map_err(|_| {
                SshError::Transport(format!("known_hosts_file not found: {extra}"))
            })?;
            merge_entries(&mut known, &content);
        }

        Ok(Self::Strict { known })
    }

    /// Check a server key, learning it when the policy allows.
    ///
    /// In learn mode a failed file update is logged but never blocks the
    /// connection.
    #[must_use]
    pub fn verify(&self, host: &str, key: &PublicKey) -> bool {
        let Some((key_type, key_base64)) = key_parts(key) else {
            return false;
        };

        match self {
            Self::Strict { known } => known
                .get(host)
                .is_some_and(|keys| {
                    keys.iter()
                        .any(|k| k.key_type == key_type && k.key_base64 == key_base64)
                }),
            Self::Learn { file } => {
                if let Some(path) = file {
                    if let Err(err) = learn_key(path, host, &key_type, &key_base64) {
                        warn!(host, error = %err, "could not save host key to known_hosts");
                    }
                }
                true
            },
        }
    }
}

fn system_known_hosts_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/ssh/ssh_known_hosts")];
    if let Ok(home) = std::env::var("HOME") {
        paths.push(Path::new(&home).join(".ssh/known_hosts"));
    }
    paths
}

/// Extract `(key_type, base64)` from a public key.
fn key_parts(key: &PublicKey) -> Option<(String, String)> {
    let openssh = key.to_openssh().ok()?;
    let mut parts = openssh.split_whitespace();
    Some((parts.next()?.to_string(), parts.next()?.to_string()))
}

/// Merge the entries of one known-hosts file into the map. Hashed
/// hostnames (`|1|…`) are tolerated but cannot be matched, so they are
/// skipped; comment and blank lines are ignored.
fn merge_entries(known: &mut HashMap<String, Vec<KnownKey>>, content: &str) {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("|1|") {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let (Some(hosts), Some(key_type), Some(key_base64)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        for host in hosts.split(',') {
            known.entry(host.to_string()).or_default().push(KnownKey {
                key_type: key_type.to_string(),
                key_base64: key_base64.to_string(),
            });
        }
    }
}

/// Replace any prior line for `host` with the new key, preserving all
/// other lines and comments; append when absent. Entries are always
/// written in plain (unhashed) form.
fn upsert_entry(content: &str, host: &str, key_type: &str, key_base64: &str) -> String {
    let new_line = format!("{host} {key_type} {key_base64}");
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            lines.push(line.to_string());
            continue;
        }
        let host_field = trimmed.split_whitespace().next().unwrap_or_default();
        if host_field == host || host_field.split(',').any(|h| h == host) {
            if !replaced {
                lines.push(new_line.clone());
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }

    if !replaced {
        lines.push(new_line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Update the known-hosts file atomically under a file-wide lock.
///
/// The lock guards the whole read-modify-write sequence against other
/// processes (and other runs in this process) touching the same file.
fn learn_key(path: &Path, host: &str, key_type: &str, key_base64: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    let mut lock = fd_lock::RwLock::new(file);
    let mut guard = lock.write()?;

    let mut content = String::new();
    guard.read_to_string(&mut content)?;

    let updated = upsert_entry(&content, host, key_type, key_base64);
    if updated != content {
        guard.seek(SeekFrom::Start(0))?;
        guard.set_len(0)?;
        guard.write_all(updated.as_bytes())?;
        debug!(host, path = %path.display(), "saved host key");
    }

    Ok(())
}
