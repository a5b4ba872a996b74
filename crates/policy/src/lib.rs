//! Command policy enforcement and output sanitization.
//!
//! This is the only barrier between a prompt-driven caller and a device
//! shell: it fails closed (implicit deny), is regex-only, and is compiled
//! once at startup.

use {
    regex::Regex,
    thiserror::Error,
};

use aosd_config::CommandPolicyConfig;

/// ANSI CSI escape sequence: `ESC [`, parameter bytes, intermediate bytes,
/// one final byte.
const ANSI_CSI: &str = r"\x1B\[[0-?]*[ -/]*[@-~]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("command must be a non-empty string")]
    Empty,
    #[error("multiline commands are not allowed")]
    Multiline,
    #[error("command too long (>{0})")]
    TooLong(usize),
    #[error("control characters are not allowed")]
    ControlChars,
    #[error("command rejected by allowlist policy")]
    NotAllowed,
    #[error("command rejected by denylist policy")]
    Denied,
}

/// Pre-compiled policy. Immutable after startup and shared freely.
pub struct CompiledPolicy {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
    max_command_length: usize,
    deny_multiline: bool,
    strip_ansi: bool,
    redactions: Vec<(Regex, String)>,
    ansi: Regex,
}

impl CompiledPolicy {
    /// Compile the configured regex lists. An invalid pattern is a fatal
    /// configuration error.
    pub fn compile(cfg: &CommandPolicyConfig) -> anyhow::Result<Self> {
        Ok(Self {
            allow: compile_anchored(&cfg.allow_regex)?,
            deny: compile_anchored(&cfg.deny_regex)?,
            max_command_length: cfg.max_command_length,
            deny_multiline: cfg.deny_multiline,
            strip_ansi: cfg.strip_ansi,
            redactions: cfg
                .redactions
                .iter()
                .map(|r| {
                    Regex::new(&r.pattern)
                        .map(|re| (re, r.replacement.clone()))
                        .map_err(|e| anyhow::anyhow!("invalid redaction pattern '{}': {e}", r.pattern))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            ansi: Regex::new(ANSI_CSI)
                .map_err(|e| anyhow::anyhow!("invalid ANSI pattern: {e}"))?,
        })
    }

    /// Validate and canonicalize a command.
    ///
    /// Returns the trimmed command on success. Checks, in order: non-empty,
    /// multiline, length, control characters, allowlist (implicit deny),
    /// denylist.
    pub fn sanitize_command(&self, command: &str) -> Result<String, PolicyError> {
        let cmd = command.trim();
        if cmd.is_empty() {
            return Err(PolicyError::Empty);
        }

        if self.deny_multiline && (cmd.contains('\n') || cmd.contains('\r')) {
            return Err(PolicyError::Multiline);
        }

        if cmd.len() > self.max_command_length {
            return Err(PolicyError::TooLong(self.max_command_length));
        }

        // NUL and other control chars can be used to confuse downstream parsers.
        if cmd.chars().any(|ch| (ch as u32) < 0x20 && ch != '\t') {
            return Err(PolicyError::ControlChars);
        }

        if !self.allow.iter().any(|re| re.is_match(cmd)) {
            return Err(PolicyError::NotAllowed);
        }

        if self.deny.iter().any(|re| re.is_match(cmd)) {
            return Err(PolicyError::Denied);
        }

        Ok(cmd.to_string())
    }

    /// Strip ANSI CSI sequences from device output.
    #[must_use]
    pub fn strip_ansi(&self, text: &str) -> String {
        self.ansi.replace_all(text, "").into_owned()
    }

    /// Apply the redaction list in order. Returns the rewritten text and
    /// whether any rule actually changed it.
    #[must_use]
    pub fn apply_redactions(&self, text: &str) -> (String, bool) {
        let mut out = text.to_string();
        let mut changed = false;
        for (re, repl) in &self.redactions {
            let next = re.replace_all(&out, repl.as_str()).into_owned();
            if next != out {
                changed = true;
                out = next;
            }
        }
        (out, changed)
    }

    /// Full output sanitization: optional ANSI strip, then redactions.
    /// Applied to both stdout and stderr.
    #[must_use]
    pub fn sanitize_output(&self, text: &str) -> (String, bool) {
        let stripped = if self.strip_ansi {
            self.strip_ansi(text)
        } else {
            text.to_string()
        };
        self.apply_redactions(&stripped)
    }
}

/// Compile patterns anchored at the start, mirroring a prefix match rather
/// than a substring search.
fn compile_anchored(patterns: &[String]) -> anyhow::Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(&format!(r"\A(?:{p})"))
                .map_err(|e| anyhow::anyhow!("invalid policy pattern '{p}': {e}"))
        })
        .collect()
}
