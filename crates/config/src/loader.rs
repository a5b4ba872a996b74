use std::path::Path;

use tracing::debug;

use crate::{env_subst::substitute_env, schema::AosdConfig};

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "AOS_CONFIG_FILE";

/// Default config path when `AOS_CONFIG_FILE` is unset.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Load config from the given YAML path with env substitution.
pub fn load_config(path: &Path) -> anyhow::Result<AosdConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let cfg: AosdConfig = serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

/// Load config from the path named by `AOS_CONFIG_FILE`.
///
/// Falls back to `./config.yaml`. A missing file is a fatal error — the
/// service refuses to start without an explicit policy and SSH setup.
pub fn load_from_env() -> anyhow::Result<AosdConfig> {
    let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    load_config(Path::new(&path))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r"
ssh:
  strict_host_key_checking: false
  pre_commands: []
server:
  port: 9000
",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert!(!cfg.ssh.strict_host_key_checking);
        assert_eq!(cfg.server.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.ssh.default_command_timeout_s, 30);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/aosd.yaml")).is_err());
    }

    #[test]
    fn rejects_invalid_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "ssh: [not, a, mapping]").expect("write");
        assert!(load_config(&path).is_err());
    }
}
