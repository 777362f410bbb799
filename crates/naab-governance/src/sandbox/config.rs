//! Sandbox configuration: granted capabilities, allow-lists and ceilings.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::capability::{Capability, PermissionLevel};

/// What a sandboxed block may do.
///
/// Empty allow-lists admit everything the capability covers. Zero ceilings
/// mean unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub capabilities: BTreeSet<Capability>,

    pub allowed_read_paths: Vec<PathBuf>,
    pub allowed_write_paths: Vec<PathBuf>,
    pub allowed_exec_paths: Vec<PathBuf>,

    pub allowed_hosts: Vec<String>,
    pub allowed_ports: Vec<u16>,
    pub network_enabled: bool,

    pub max_memory_mb: u64,
    pub max_cpu_seconds: u64,
    pub max_file_size_mb: u64,

    pub allow_fork: bool,
    pub allow_exec: bool,
    /// Executable names (first token of a command line).
    pub allowed_commands: Vec<String>,
}

impl SandboxConfig {
    /// Expand a preset.
    pub fn from_permission_level(level: PermissionLevel) -> Self {
        match level {
            PermissionLevel::Restricted => Self {
                max_memory_mb: 128,
                max_cpu_seconds: 10,
                max_file_size_mb: 10,
                ..Self::default()
            }
            .with_capability(Capability::FsRead),

            PermissionLevel::Standard => {
                let mut cfg = Self {
                    max_memory_mb: 512,
                    max_cpu_seconds: 30,
                    max_file_size_mb: 100,
                    ..Self::default()
                }
                .with_capabilities(STANDARD_CAPS)
                .allow_read_path("/tmp")
                .allow_write_path("/tmp");
                if let Some(home) = home_dir() {
                    cfg = cfg.allow_read_path(home);
                }
                cfg
            }

            PermissionLevel::Elevated => Self {
                network_enabled: true,
                allow_fork: true,
                allow_exec: true,
                max_memory_mb: 1024,
                max_cpu_seconds: 60,
                max_file_size_mb: 1000,
                ..Self::default()
            }
            .with_capabilities(STANDARD_CAPS)
            .with_capability(Capability::NetConnect)
            .with_capability(Capability::SysExec),

            PermissionLevel::Unrestricted => Self {
                network_enabled: true,
                allow_fork: true,
                allow_exec: true,
                ..Self::default()
            }
            .with_capability(Capability::Unsafe),
        }
    }

    pub fn with_capability(mut self, cap: Capability) -> Self {
        self.capabilities.insert(cap);
        self
    }

    pub fn with_capabilities(mut self, caps: &[Capability]) -> Self {
        self.capabilities.extend(caps.iter().copied());
        self
    }

    /// `Unsafe` grants every capability.
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.is_unsafe() || self.capabilities.contains(&cap)
    }

    pub fn is_unsafe(&self) -> bool {
        self.capabilities.contains(&Capability::Unsafe)
    }

    pub fn allow_read_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allowed_read_paths.push(path.into());
        self
    }

    pub fn allow_write_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allowed_write_paths.push(path.into());
        self
    }

    pub fn allow_execute_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allowed_exec_paths.push(path.into());
        self
    }

    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into());
        self
    }

    pub fn allow_port(mut self, port: u16) -> Self {
        self.allowed_ports.push(port);
        self
    }

    pub fn allow_command(mut self, command: impl Into<String>) -> Self {
        self.allowed_commands.push(command.into());
        self
    }
}

const STANDARD_CAPS: &[Capability] = &[
    Capability::FsRead,
    Capability::FsWrite,
    Capability::FsCreateDir,
    Capability::BlockLoad,
    Capability::BlockCall,
    Capability::SysEnv,
    Capability::SysTime,
];

pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_preset() {
        let cfg = SandboxConfig::from_permission_level(PermissionLevel::Restricted);
        assert!(cfg.has_capability(Capability::FsRead));
        assert!(!cfg.has_capability(Capability::FsWrite));
        assert!(!cfg.network_enabled);
        assert_eq!((cfg.max_memory_mb, cfg.max_cpu_seconds, cfg.max_file_size_mb), (128, 10, 10));
    }

    #[test]
    fn test_standard_preset_paths() {
        let cfg = SandboxConfig::from_permission_level(PermissionLevel::Standard);
        assert!(cfg.allowed_write_paths.contains(&PathBuf::from("/tmp")));
        assert!(cfg.allowed_read_paths.contains(&PathBuf::from("/tmp")));
        assert!(cfg.has_capability(Capability::BlockCall));
        assert!(!cfg.has_capability(Capability::NetConnect));
        assert!(!cfg.allow_exec);
    }

    #[test]
    fn test_elevated_preset() {
        let cfg = SandboxConfig::from_permission_level(PermissionLevel::Elevated);
        assert!(cfg.has_capability(Capability::NetConnect));
        assert!(cfg.has_capability(Capability::SysExec));
        assert!(!cfg.has_capability(Capability::NetListen));
        assert!(cfg.network_enabled && cfg.allow_fork && cfg.allow_exec);
        assert_eq!(cfg.max_file_size_mb, 1000);
    }

    #[test]
    fn test_unsafe_grants_everything() {
        let cfg = SandboxConfig::from_permission_level(PermissionLevel::Unrestricted);
        assert!(cfg.has_capability(Capability::NetRaw));
        assert!(cfg.has_capability(Capability::FsDelete));
        assert_eq!(cfg.max_memory_mb, 0);
    }
}
