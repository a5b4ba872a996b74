//! Request-scoped device description and the command runner contract.

use std::time::Duration;

use {
    async_trait::async_trait,
    thiserror::Error,
};

use aosd_config::Credential;

/// A target switch for a single request. Never persisted.
#[derive(Debug, Clone)]
pub struct Device {
    /// Unique within a request.
    pub id: String,
    pub host: String,
    pub port: u16,
    /// Explicit username override; otherwise resolved from the zone map,
    /// device defaults, or `AOS_DEVICE_USERNAME`.
    pub username: Option<String>,
    /// Explicit credential override.
    pub credential: Option<Credential>,
    /// Name of a configured jump host to tunnel through.
    pub jump: Option<String>,
}

impl Device {
    /// Build a transient device from a request's host argument.
    #[must_use]
    pub fn from_host(host: &str, port: u16, username: Option<String>) -> Self {
        Self {
            id: format!("dynamic:{host}"),
            host: host.to_string(),
            port,
            username,
            credential: None,
            jump: None,
        }
    }
}

/// Output of one remote command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// Best effort; `None` when the channel closed without reporting one.
    pub exit_status: Option<u32>,
    pub duration_ms: u64,
    /// True when either stream exceeded the configured output cap.
    pub truncated: bool,
}

/// SSH-layer failures. All of these surface to callers as `ssh_error`.
#[derive(Error, Debug)]
pub enum SshError {
    #[error("missing SSH username for device '{0}'; set device.username or export AOS_DEVICE_USERNAME")]
    MissingUsername(String),

    #[error("missing SSH password for device '{0}'; set device credentials or export AOS_DEVICE_PASSWORD")]
    MissingCredential(String),

    #[error("unknown jump host: {0}")]
    UnknownJumpHost(String),

    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("host key verification failed for {0}")]
    HostKeyRejected(String),

    #[error("authentication failed for {user}@{host}")]
    AuthFailed { user: String, host: String },

    #[error("{phase} timed out after {seconds}s")]
    Timeout { phase: &'static str, seconds: u64 },

    #[error("{0}")]
    Transport(String),
}

impl From<russh::Error> for SshError {
    fn from(err: russh::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for SshError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Executes sanitized commands against devices.
///
/// Implementations must be safe to call from concurrent tasks: every `run`
/// owns its connections end to end. Tool handlers depend only on this
/// trait, which keeps them testable without a network.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        device: &Device,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<CommandResult, SshError>;
}
