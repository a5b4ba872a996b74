//! `aos.cli.readonly` — raw read-only CLI execution.

use std::time::Duration;

use {
    serde::Deserialize,
    serde_json::{json, Value},
};

use {
    aosd_common::ToolError,
    aosd_ssh::Device,
};

use crate::{
    service::{default_port, parse_args, ToolOutput, ToolService},
    types::ContentBlock,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CliArgs {
    pub host: String,
    pub command: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

impl ToolService {
    pub(crate) async fn cli_readonly(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: CliArgs = parse_args(args)?;
        if args.host.trim().is_empty() {
            return Err(ToolError::InvalidRequest("host must be non-empty".into()));
        }
        let device = Device::from_host(&args.host, args.port, args.username.clone());

        self.exec_cli(&device, &args.command, args.timeout_s.map(Duration::from_secs))
            .await
    }

    /// Shared body for the raw CLI and diagnostic tools: sanitize, run,
    /// sanitize output, and report the redaction flag.
    pub(crate) async fn exec_cli(
        &self,
        device: &Device,
        raw_command: &str,
        timeout: Option<Duration>,
    ) -> Result<ToolOutput, ToolError> {
        let (command, result) = self.run_sanitized(device, raw_command, timeout).await?;
        let (stdout, stderr, redacted) = self.sanitize_output(&result);

        let data = json!({
            "host": device.host,
            "command": command,
            "stdout": stdout,
            "stderr": stderr,
            "exit_status": result.exit_status,
            "duration_ms": result.duration_ms,
            "truncated": result.truncated,
            "redacted": redacted,
        });

        Ok(ToolOutput::new(data).with_content(ContentBlock::text(stdout)))
    }
}
