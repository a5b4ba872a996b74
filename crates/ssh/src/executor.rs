//! The SSH executor: opens a session per call (directly or via a jump
//! host), runs pre-commands and the target command with independent
//! timeouts, and caps captured output.

use std::{collections::HashMap, future::Future, sync::Arc, time::{Duration, Instant}};

use {
    async_trait::async_trait,
    russh::{
        client::{self, Handle},
        keys::{load_secret_key, PrivateKeyWithHashAlg, PublicKey},
        ChannelMsg, Disconnect,
    },
    secrecy::{ExposeSecret, SecretString},
    tokio::net::TcpStream,
    tracing::{debug, warn},
};

use aosd_config::{AosdConfig, Credential, JumpHostConfig, SshConfig};

use crate::{
    device::{CommandResult, CommandRunner, Device, SshError},
    known_hosts::HostKeyPolicy,
    zone::ZoneResolver,
};

/// Final process-wide fallbacks when nothing else resolves.
const USERNAME_ENV: &str = "AOS_DEVICE_USERNAME";
const PASSWORD_ENV: &str = "AOS_DEVICE_PASSWORD";

/// Opens one SSH session per `run` call. Shares no mutable state between
/// calls apart from the known-hosts file, which the policy locks.
pub struct SshExecutor {
    cfg: SshConfig,
    jump_hosts: HashMap<String, JumpHostConfig>,
    zone: Option<ZoneResolver>,
    default_username: Option<String>,
    default_credential: Option<Credential>,
    default_jump: Option<String>,
    policy: Arc<HostKeyPolicy>,
}

impl SshExecutor {
    /// Build the executor from the loaded configuration. Fails when strict
    /// host-key checking is requested but the configured known-hosts file
    /// is unreadable.
    pub fn from_config(cfg: &AosdConfig) -> Result<Self, SshError> {
        let policy = Arc::new(HostKeyPolicy::from_config(&cfg.ssh)?);

        let defaults = cfg.device_defaults.as_ref();
        let default_username = defaults.and_then(|d| {
            d.username_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
                .filter(|v| !v.is_empty())
                .or_else(|| d.username.clone())
        });

        Ok(Self {
            cfg: cfg.ssh.clone(),
            jump_hosts: cfg
                .jump_hosts
                .iter()
                .map(|j| (j.name.clone(), j.clone()))
                .collect(),
            zone: cfg.zone_auth.clone().map(ZoneResolver::new),
            default_username,
            default_credential: defaults.and_then(|d| d.auth.clone()),
            default_jump: defaults.and_then(|d| d.jump.clone()),
            policy,
        })
    }

    /// Username precedence: device, zone map, device defaults, env.
    fn resolve_username(&self, device: &Device) -> Result<String, SshError> {
        if let Some(ref username) = device.username {
            return Ok(username.clone());
        }
        if let Some(ref zone) = self.zone {
            if let Some(primary) = zone.primary(&device.host) {
                return Ok(primary.username);
            }
        }
        if let Some(ref username) = self.default_username {
            return Ok(username.clone());
        }
        std::env::var(USERNAME_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SshError::MissingUsername(device.id.clone()))
    }

    /// Credential precedence: device, zone map, device defaults, env.
    fn resolve_credential(&self, device: &Device) -> Result<Credential, SshError> {
        if let Some(ref credential) = device.credential {
            return Ok(credential.clone());
        }
        if let Some(ref zone) = self.zone {
            if let Some(primary) = zone.primary(&device.host) {
                return Ok(Credential::PasswordInline {
                    password: primary.password,
                });
            }
        }
        if let Some(ref credential) = self.default_credential {
            return Ok(credential.clone());
        }
        if std::env::var(PASSWORD_ENV).is_ok_and(|v| !v.is_empty()) {
            return Ok(Credential::PasswordEnv {
                env: PASSWORD_ENV.to_string(),
            });
        }
        Err(SshError::MissingCredential(device.id.clone()))
    }

    fn client_config(&self) -> Arc<client::Config> {
        Arc::new(client::Config {
            keepalive_interval: self.cfg.keepalive_s.map(Duration::from_secs),
            ..client::Config::default()
        })
    }

    /// Open and authenticate a session over an established stream.
    async fn session_over<S>(
        &self,
        stream: S,
        host: &str,
        username: &str,
        credential: &Credential,
    ) -> Result<Handle<HostKeyHandler>, SshError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let handler = HostKeyHandler {
            host: host.to_string(),
            policy: Arc::clone(&self.policy),
        };

        let mut session = phase_timeout(
            "ssh handshake",
            self.cfg.banner_timeout_s,
            client::connect_stream(self.client_config(), stream, handler),
        )
        .await??;

        let authenticated = phase_timeout(
            "authentication",
            self.cfg.auth_timeout_s,
            authenticate(&mut session, username, credential),
        )
        .await??;

        if !authenticated {
            return Err(SshError::AuthFailed {
                user: username.to_string(),
                host: host.to_string(),
            });
        }

        Ok(session)
    }

    async fn open_device_session(
        &self,
        device: &Device,
        username: &str,
        credential: &Credential,
    ) -> Result<(Handle<HostKeyHandler>, Option<Handle<HostKeyHandler>>), SshError> {
        let jump_name = device.jump.as_ref().or(self.default_jump.as_ref());
        if let Some(jump_name) = jump_name {
            let jump = self
                .jump_hosts
                .get(jump_name)
                .ok_or_else(|| SshError::UnknownJumpHost(jump_name.clone()))?;

            let tcp = phase_timeout(
                "jump connect",
                self.cfg.connect_timeout_s,
                TcpStream::connect((jump.host.as_str(), jump.port)),
            )
            .await??;
            let jump_session = self
                .session_over(tcp, &jump.host, &jump.username, &jump.auth)
                .await?;

            let channel = jump_session
                .channel_open_direct_tcpip(
                    device.host.clone(),
                    u32::from(device.port),
                    "127.0.0.1",
                    0,
                )
                .await?;

            let session = self
                .session_over(channel.into_stream(), &device.host, username, credential)
                .await?;
            Ok((session, Some(jump_session)))
        } else {
            let tcp = phase_timeout(
                "connect",
                self.cfg.connect_timeout_s,
                TcpStream::connect((device.host.as_str(), device.port)),
            )
            .await??;
            let session = self
                .session_over(tcp, &device.host, username, credential)
                .await?;
            Ok((session, None))
        }
    }

    /// Run one command on an open session, capping each stream at
    /// `max_output_bytes`.
    async fn exec_capped(
        &self,
        session: &Handle<HostKeyHandler>,
        command: &str,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Vec<u8>, Option<u32>, bool), SshError> {
        let mut channel = session.channel_open_session().await?;
        channel.exec(true, command).await?;

        let cap = self.cfg.max_output_bytes;
        let mut stdout: Vec<u8> = Vec::new();
        let mut stderr: Vec<u8> = Vec::new();
        let mut exit_status = None;
        let mut truncated = false;

        let read_loop = async {
            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Data { ref data } => {
                        append_capped(&mut stdout, data, cap, &mut truncated);
                    },
                    ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                        append_capped(&mut stderr, data, cap, &mut truncated);
                    },
                    ChannelMsg::ExitStatus { exit_status: code } => {
                        exit_status = Some(code);
                    },
                    _ => {},
                }
            }
            Ok::<(), SshError>(())
        };

        phase_timeout("command", timeout.as_secs(), read_loop).await??;

        Ok((stdout, stderr, exit_status, truncated))
    }
}

fn append_capped(buf: &mut Vec<u8>, data: &[u8], cap: usize, truncated: &mut bool) {
    if buf.len() >= cap {
        *truncated = true;
        return;
    }
    let room = cap - buf.len();
    if data.len() > room {
        buf.extend_from_slice(&data[..room]);
        *truncated = true;
    } else {
        buf.extend_from_slice(data);
    }
}

async fn phase_timeout<T>(
    phase: &'static str,
    seconds: u64,
    fut: impl Future<Output = T>,
) -> Result<T, SshError> {
    tokio::time::timeout(Duration::from_secs(seconds), fut)
        .await
        .map_err(|_| SshError::Timeout { phase, seconds })
}

/// Authenticate with the resolved credential. Password material only ever
/// flows into the SSH library.
async fn authenticate(
    session: &mut Handle<HostKeyHandler>,
    username: &str,
    credential: &Credential,
) -> Result<bool, SshError> {
    match credential {
        Credential::PasswordEnv { env } => {
            let password = std::env::var(env)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SshError::MissingEnv(env.clone()))?;
            let result = session
                .authenticate_password(username, password.as_str())
                .await?;
            Ok(result.success())
        },
        Credential::PasswordInline { password } => {
            let result = session
                .authenticate_password(username, password.expose_secret().as_str())
                .await?;
            Ok(result.success())
        },
        Credential::PrivateKeyFile {
            private_key_file,
            passphrase_env,
        } => {
            let passphrase: Option<SecretString> = match passphrase_env {
                Some(env) => Some(SecretString::new(
                    std::env::var(env).map_err(|_| SshError::MissingEnv(env.clone()))?,
                )),
                None => None,
            };
            let key = load_secret_key(
                private_key_file,
                passphrase.as_ref().map(|p| p.expose_secret().as_str()),
            )
            .map_err(|e| SshError::Transport(format!("cannot load private key: {e}")))?;

            let hash_alg = session.best_supported_rsa_hash().await?.flatten();
            let result = session
                .authenticate_publickey(
                    username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                )
                .await?;
            Ok(result.success())
        },
    }
}

/// Per-connection handler delegating host-key decisions to the policy.
struct HostKeyHandler {
    host: String,
    policy: Arc<HostKeyPolicy>,
}

impl client::Handler for HostKeyHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(self.policy.verify(&self.host, server_public_key))
    }
}

#[async_trait]
impl CommandRunner for SshExecutor {
    async fn run(
        &self,
        device: &Device,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<CommandResult, SshError> {
        let start = Instant::now();
        let timeout =
            timeout.unwrap_or(Duration::from_secs(self.cfg.default_command_timeout_s));

        // Credentials must resolve before any network activity.
        let username = self.resolve_username(device)?;
        let credential = self.resolve_credential(device)?;

        debug!(device = %device.id, host = %device.host, command, "ssh exec");

        let (session, jump_session) = self
            .open_device_session(device, &username, &credential)
            .await?;

        let outcome = async {
            for pre in &self.cfg.pre_commands {
                let pre = pre.trim();
                if pre.is_empty() {
                    continue;
                }
                // Pre-command output is irrelevant; failures are not.
                self.exec_capped(&session, pre, timeout).await?;
            }

            self.exec_capped(&session, command, timeout).await
        }
        .await;

        // Close device first, then the jump session, on every exit path.
        let _ = session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await;
        if let Some(jump) = jump_session {
            let _ = jump.disconnect(Disconnect::ByApplication, "", "en").await;
        }

        let (stdout, stderr, exit_status, truncated) = outcome?;

        if truncated {
            warn!(device = %device.id, command, "output truncated at {} bytes", self.cfg.max_output_bytes);
        }

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
            duration_ms: start.elapsed().as_millis() as u64,
            truncated,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn executor_with(cfg: AosdConfig) -> SshExecutor {
        SshExecutor::from_config(&cfg).expect("executor")
    }

    fn learn_mode_config() -> AosdConfig {
        AosdConfig {
            ssh: SshConfig {
                strict_host_key_checking: false,
                ..SshConfig::default()
            },
            ..AosdConfig::default()
        }
    }

    #[test]
    fn missing_credentials_fail_before_any_network_io() {
        let exec = executor_with(learn_mode_config());
        let device = Device::from_host("203.0.113.1", 22, None);

        // Neither the device, a zone map, defaults, nor the env provide a
        // username here.
        if std::env::var(USERNAME_ENV).is_err() {
            let err = exec.resolve_username(&device).expect_err("no username");
            assert!(matches!(err, SshError::MissingUsername(_)));
        }
    }

    #[test]
    fn device_username_wins_over_everything() {
        let exec = executor_with(learn_mode_config());
        let device = Device::from_host("203.0.113.1", 22, Some("operator".into()));
        assert_eq!(exec.resolve_username(&device).expect("username"), "operator");
    }

    #[test]
    fn unknown_jump_host_is_reported() {
        let exec = executor_with(learn_mode_config());
        assert!(exec.jump_hosts.is_empty());
        // The lookup failure shape used by open_device_session.
        let err = exec
            .jump_hosts
            .get("missing")
            .ok_or_else(|| SshError::UnknownJumpHost("missing".into()))
            .expect_err("unknown jump");
        assert!(matches!(err, SshError::UnknownJumpHost(_)));
    }

    #[test]
    fn append_capped_marks_truncation() {
        let mut buf = Vec::new();
        let mut truncated = false;
        append_capped(&mut buf, b"hello world", 5, &mut truncated);
        assert_eq!(buf, b"hello");
        assert!(truncated);

        let mut buf = Vec::new();
        let mut truncated = false;
        append_capped(&mut buf, b"ok", 5, &mut truncated);
        assert_eq!(buf, b"ok");
        assert!(!truncated);
    }
}
