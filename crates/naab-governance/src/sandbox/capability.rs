//! Capabilities and permission presets, the permission axis of the sandbox.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named permission a block must hold for an operation.
///
/// [`Capability::Unsafe`] satisfies every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    FsRead,
    FsWrite,
    FsExecute,
    FsDelete,
    FsCreateDir,
    NetConnect,
    NetListen,
    NetRaw,
    SysExec,
    SysEnv,
    SysTime,
    BlockLoad,
    BlockCall,
    ResUnlimitedMem,
    ResUnlimitedCpu,
    Unsafe,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::FsRead => "FS_READ",
            Capability::FsWrite => "FS_WRITE",
            Capability::FsExecute => "FS_EXECUTE",
            Capability::FsDelete => "FS_DELETE",
            Capability::FsCreateDir => "FS_CREATE_DIR",
            Capability::NetConnect => "NET_CONNECT",
            Capability::NetListen => "NET_LISTEN",
            Capability::NetRaw => "NET_RAW",
            Capability::SysExec => "SYS_EXEC",
            Capability::SysEnv => "SYS_ENV",
            Capability::SysTime => "SYS_TIME",
            Capability::BlockLoad => "BLOCK_LOAD",
            Capability::BlockCall => "BLOCK_CALL",
            Capability::ResUnlimitedMem => "RES_UNLIMITED_MEM",
            Capability::ResUnlimitedCpu => "RES_UNLIMITED_CPU",
            Capability::Unsafe => "UNSAFE",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preset a [`SandboxConfig`](super::SandboxConfig) is expanded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Read-only; no network, no processes.
    Restricted,
    /// Read/write under `/tmp`, block loading, env and time; no network.
    #[default]
    Standard,
    /// Standard plus outbound network and process execution.
    Elevated,
    /// Everything.
    Unrestricted,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PermissionLevel::Restricted => "restricted",
            PermissionLevel::Standard => "standard",
            PermissionLevel::Elevated => "elevated",
            PermissionLevel::Unrestricted => "unrestricted",
        };
        f.write_str(s)
    }
}

impl FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restricted" => Ok(PermissionLevel::Restricted),
            "standard" => Ok(PermissionLevel::Standard),
            "elevated" => Ok(PermissionLevel::Elevated),
            "unrestricted" => Ok(PermissionLevel::Unrestricted),
            other => Err(format!(
                "unknown permission level '{other}' (expected restricted, standard, elevated or unrestricted)"
            )),
        }
    }
}
