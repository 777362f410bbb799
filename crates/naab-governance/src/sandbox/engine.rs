//! Capability checks for resource operations.
//!
//! `can_*` predicates answer without side effects. `check_*` variants
//! return a [`SandboxViolation`] and log it to stderr, tracing and the audit
//! sink. A config holding `UNSAFE` allows everything.

use std::path::Path;
use std::sync::Arc;

use super::capability::Capability;
use super::config::SandboxConfig;
use super::error::SandboxViolation;
use super::path::is_within;
use crate::audit::{record_best_effort, AuditEvent, AuditMetadata, AuditSink};
use crate::obs;

type Decision = Result<(), String>;

fn require(cfg: &SandboxConfig, cap: Capability) -> Decision {
    if cfg.has_capability(cap) {
        Ok(())
    } else {
        Err(format!("missing capability {cap}"))
    }
}

fn require_path(path: &Path, allowed: &[std::path::PathBuf], list: &str) -> Decision {
    if allowed.is_empty() || is_within(path, allowed) {
        Ok(())
    } else {
        Err(format!("path is outside the {list} allow-list"))
    }
}

/// `host` equals an allowed entry or is a subdomain of one.
fn host_matches(host: &str, allowed: &str) -> bool {
    let host = host.trim_end_matches('.');
    let allowed = allowed.trim_end_matches('.');
    host.eq_ignore_ascii_case(allowed)
        || host
            .len()
            .checked_sub(allowed.len() + 1)
            .is_some_and(|split| {
                host.as_bytes()[split] == b'.' && host[split + 1..].eq_ignore_ascii_case(allowed)
            })
}

pub struct Sandbox {
    config: SandboxConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("config", &self.config)
            .field("has_audit", &self.audit.is_some())
            .finish()
    }
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        tracing::debug!(capabilities = config.capabilities.len(), "sandbox initialized");
        Self { config, audit: None }
    }

    /// Send violations to `sink` as `SECURITY_VIOLATION` events.
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn decide_read(&self, path: &Path) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        require(&self.config, Capability::FsRead)?;
        require_path(path, &self.config.allowed_read_paths, "read")
    }

    fn decide_write(&self, path: &Path) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        require(&self.config, Capability::FsWrite)?;
        require_path(path, &self.config.allowed_write_paths, "write")
    }

    fn decide_execute(&self, path: &Path) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        require(&self.config, Capability::FsExecute)?;
        require_path(path, &self.config.allowed_exec_paths, "execute")
    }

    fn decide_delete(&self, path: &Path) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        require(&self.config, Capability::FsDelete)?;
        self.decide_write(path)
    }

    fn decide_connect(&self, host: &str, port: u16) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        if !self.config.network_enabled {
            return Err("network is disabled".to_string());
        }
        require(&self.config, Capability::NetConnect)?;
        let hosts = &self.config.allowed_hosts;
        if !hosts.is_empty() && !hosts.iter().any(|h| host_matches(host, h)) {
            return Err("host is not in the allow-list".to_string());
        }
        self.decide_port(port)
    }

    fn decide_listen(&self, port: u16) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        if !self.config.network_enabled {
            return Err("network is disabled".to_string());
        }
        require(&self.config, Capability::NetListen)?;
        self.decide_port(port)
    }

    fn decide_port(&self, port: u16) -> Decision {
        let ports = &self.config.allowed_ports;
        if ports.is_empty() || ports.contains(&port) {
            Ok(())
        } else {
            Err(format!("port {port} is not in the allow-list"))
        }
    }

    fn decide_command(&self, command: &str) -> Decision {
        if self.config.is_unsafe() {
            return Ok(());
        }
        if !self.config.allow_exec {
            return Err("process execution is disabled".to_string());
        }
        require(&self.config, Capability::SysExec)?;
        let name = command.split_whitespace().next().unwrap_or_default();
        let allowed = &self.config.allowed_commands;
        if allowed.is_empty() || allowed.iter().any(|c| c == name) {
            Ok(())
        } else {
            Err(format!("command '{name}' is not in the allow-list"))
        }
    }

    pub fn can_read(&self, path: impl AsRef<Path>) -> bool {
        self.decide_read(path.as_ref()).is_ok()
    }

    pub fn can_write(&self, path: impl AsRef<Path>) -> bool {
        self.decide_write(path.as_ref()).is_ok()
    }

    pub fn can_execute(&self, path: impl AsRef<Path>) -> bool {
        self.decide_execute(path.as_ref()).is_ok()
    }

    /// Needs `FS_DELETE` and write access to the path.
    pub fn can_delete(&self, path: impl AsRef<Path>) -> bool {
        self.decide_delete(path.as_ref()).is_ok()
    }

    /// Host and port allow-lists apply independently.
    pub fn can_connect(&self, host: &str, port: u16) -> bool {
        self.decide_connect(host, port).is_ok()
    }

    pub fn can_listen(&self, port: u16) -> bool {
        self.decide_listen(port).is_ok()
    }

    /// Only the first token of `command` is matched against the allow-list.
    pub fn can_execute_command(&self, command: &str) -> bool {
        self.decide_command(command).is_ok()
    }

    pub fn can_access_env(&self, _name: &str) -> bool {
        self.config.has_capability(Capability::SysEnv)
    }

    pub fn can_load_block(&self, _block_id: &str) -> bool {
        self.config.has_capability(Capability::BlockLoad)
    }

    pub fn can_call_block(&self, _block_id: &str) -> bool {
        self.config.has_capability(Capability::BlockCall)
    }

    pub fn check_read(&self, path: impl AsRef<Path>) -> Result<(), SandboxViolation> {
        let path = path.as_ref();
        self.enforce("read", &path.display().to_string(), self.decide_read(path))
    }

    pub fn check_write(&self, path: impl AsRef<Path>) -> Result<(), SandboxViolation> {
        let path = path.as_ref();
        self.enforce("write", &path.display().to_string(), self.decide_write(path))
    }

    pub fn check_execute(&self, path: impl AsRef<Path>) -> Result<(), SandboxViolation> {
        let path = path.as_ref();
        self.enforce("execute", &path.display().to_string(), self.decide_execute(path))
    }

    pub fn check_delete(&self, path: impl AsRef<Path>) -> Result<(), SandboxViolation> {
        let path = path.as_ref();
        self.enforce("delete", &path.display().to_string(), self.decide_delete(path))
    }

    pub fn check_connect(&self, host: &str, port: u16) -> Result<(), SandboxViolation> {
        self.enforce("connect", &format!("{host}:{port}"), self.decide_connect(host, port))
    }

    pub fn check_listen(&self, port: u16) -> Result<(), SandboxViolation> {
        self.enforce("listen", &port.to_string(), self.decide_listen(port))
    }

    pub fn check_execute_command(&self, command: &str) -> Result<(), SandboxViolation> {
        self.enforce("exec", command, self.decide_command(command))
    }

    pub fn check_access_env(&self, name: &str) -> Result<(), SandboxViolation> {
        self.enforce("env", name, require(&self.config, Capability::SysEnv))
    }

    pub fn check_load_block(&self, block_id: &str) -> Result<(), SandboxViolation> {
        self.enforce("load_block", block_id, require(&self.config, Capability::BlockLoad))
    }

    pub fn check_call_block(&self, block_id: &str) -> Result<(), SandboxViolation> {
        self.enforce("call_block", block_id, require(&self.config, Capability::BlockCall))
    }

    fn enforce(
        &self,
        operation: &str,
        resource: &str,
        decision: Decision,
    ) -> Result<(), SandboxViolation> {
        decision.map_err(|reason| {
            self.log_violation(operation, resource, &reason);
            SandboxViolation::new(operation, resource, reason)
        })
    }

    /// Report a denied operation to stderr, tracing and the audit sink.
    pub fn log_violation(&self, operation: &str, resource: &str, reason: &str) {
        obs::emit_sandbox_violation(operation, resource, reason);
        eprintln!("[SANDBOX VIOLATION] {operation} on '{resource}': {reason}");
        if let Some(sink) = &self.audit {
            let mut metadata = AuditMetadata::new();
            metadata.insert("operation".to_string(), operation.to_string());
            metadata.insert("resource".to_string(), resource.to_string());
            let details = SandboxViolation::new(operation, resource, reason).to_string();
            record_best_effort(sink.as_ref(), AuditEvent::SecurityViolation, &details, &metadata);
        }
    }
}
