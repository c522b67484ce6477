//! Fallback values for fields no appliance in a composition chain sets,
//! overridable once at process start through `MILLWRIGHT_*` environment
//! variables. Environment overrides are the lowest-precedence layer: any
//! definition in the chain still wins over them.

use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_OS_NAME: &str = "fedora";
pub const DEFAULT_OS_VERSION: &str = "11";
pub const DEFAULT_OS_PASSWORD: &str = "millwright";
pub const DEFAULT_CPUS: u32 = 1;
/// MiB.
pub const DEFAULT_MEMORY: u64 = 256;
/// GiB, applied to the synthesized `/` partition.
pub const DEFAULT_DISK_SIZE: u64 = 1;
pub const DEFAULT_VERSION: &str = "1";
pub const DEFAULT_RELEASE: &str = "0";

/// Session-wide default values for otherwise-unset configuration fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildDefaults {
    pub arch: String,
    pub os_name: String,
    pub os_version: String,
    pub os_password: String,
    pub cpus: u32,
    pub memory: u64,
    pub disk_size: u64,
    pub version: String,
    pub release: String,
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            arch: env::consts::ARCH.to_owned(),
            os_name: DEFAULT_OS_NAME.to_owned(),
            os_version: DEFAULT_OS_VERSION.to_owned(),
            os_password: DEFAULT_OS_PASSWORD.to_owned(),
            cpus: DEFAULT_CPUS,
            memory: DEFAULT_MEMORY,
            disk_size: DEFAULT_DISK_SIZE,
            version: DEFAULT_VERSION.to_owned(),
            release: DEFAULT_RELEASE.to_owned(),
        }
    }
}

impl BuildDefaults {
    /// Build defaults with `MILLWRIGHT_*` environment overrides applied.
    ///
    /// Unset or unparsable variables leave the built-in default in place.
    pub fn from_env() -> Self {
        let mut defaults = Self::default();
        if let Some(arch) = env_string("MILLWRIGHT_ARCH") {
            defaults.arch = arch;
        }
        if let Some(name) = env_string("MILLWRIGHT_OS_NAME") {
            defaults.os_name = name;
        }
        if let Some(version) = env_string("MILLWRIGHT_OS_VERSION") {
            defaults.os_version = version;
        }
        if let Some(cpus) = env_number("MILLWRIGHT_CPUS") {
            defaults.cpus = cpus;
        }
        if let Some(memory) = env_number("MILLWRIGHT_MEMORY") {
            defaults.memory = memory;
        }
        if let Some(disk) = env_number("MILLWRIGHT_DISK_SIZE") {
            defaults.disk_size = disk;
        }
        defaults
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
