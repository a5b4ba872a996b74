//! Configuration schema and loader for the aosd gateway.
//!
//! The service reads a single YAML file whose path comes from the
//! `AOS_CONFIG_FILE` environment variable. `${ENV_VAR}` placeholders in the
//! raw file are substituted before parsing so secrets can stay out of the
//! file itself.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{load_config, load_from_env, CONFIG_FILE_ENV},
    schema::{
        AosdConfig, CommandPolicyConfig, Credential, DeviceDefaults, JumpHostConfig,
        RedactionRule, ServerConfig, SshConfig, TemplatesConfig, ZoneAuthConfig,
        ZoneCredentialSpec,
    },
};
