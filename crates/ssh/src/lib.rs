//! SSH execution layer: zone-based credential resolution, known-hosts
//! handling, and the executor that runs sanitized CLI commands on devices
//! (directly or through a jump host).

pub mod device;
pub mod executor;
pub mod known_hosts;
pub mod zone;

pub use {
    device::{CommandResult, CommandRunner, Device, SshError},
    executor::SshExecutor,
    zone::{extract_zone, ZoneResolver},
};
