//! Per-block sandbox configuration registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::capability::PermissionLevel;
use super::config::{home_dir, SandboxConfig};
use super::error::{SandboxError, SandboxResult};
use crate::audit::{record_best_effort, AuditEvent, AuditMetadata, AuditSink};

/// Block ids become directory names, so only a conservative character set
/// is accepted.
pub fn is_valid_block_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub struct SandboxManager {
    default_config: SandboxConfig,
    block_configs: HashMap<String, SandboxConfig>,
    scratch_root: PathBuf,
    audit: Option<Arc<dyn AuditSink>>,
}

impl std::fmt::Debug for SandboxManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxManager")
            .field("blocks", &self.block_configs.len())
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

impl Default for SandboxManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxManager {
    /// STANDARD by default; per-block scratch directories live under
    /// `~/.naab/sandbox`.
    pub fn new() -> Self {
        let scratch_root = home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".naab")
            .join("sandbox");
        Self {
            default_config: SandboxConfig::from_permission_level(PermissionLevel::Standard),
            block_configs: HashMap::new(),
            scratch_root,
            audit: None,
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Rejected block ids are recorded as `INVALID_BLOCK_ID`.
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn set_default_config(&mut self, config: SandboxConfig) {
        self.default_config = config;
    }

    pub fn default_config(&self) -> &SandboxConfig {
        &self.default_config
    }

    pub fn register_block_permissions(
        &mut self,
        block_id: &str,
        config: SandboxConfig,
    ) -> SandboxResult<()> {
        self.validate(block_id)?;
        tracing::info!(block_id, "registered custom sandbox permissions");
        self.block_configs.insert(block_id.to_string(), config);
        Ok(())
    }

    /// The registered config for `block_id`, or the default.
    pub fn config_for_block(&self, block_id: &str) -> SandboxConfig {
        self.block_configs
            .get(block_id)
            .unwrap_or(&self.default_config)
            .clone()
    }

    /// A preset with the block's scratch directory added to its read and
    /// write allow-lists.
    pub fn create_config_for_block(
        &self,
        block_id: &str,
        level: PermissionLevel,
    ) -> SandboxResult<SandboxConfig> {
        self.validate(block_id)?;
        let scratch = self.scratch_root.join(block_id);
        Ok(SandboxConfig::from_permission_level(level)
            .allow_read_path(scratch.clone())
            .allow_write_path(scratch))
    }

    fn validate(&self, block_id: &str) -> SandboxResult<()> {
        if is_valid_block_id(block_id) {
            return Ok(());
        }
        if let Some(sink) = &self.audit {
            let mut metadata = AuditMetadata::new();
            metadata.insert("block_id".to_string(), block_id.to_string());
            record_best_effort(
                sink.as_ref(),
                AuditEvent::InvalidBlockId,
                "rejected sandbox block id",
                &metadata,
            );
        }
        Err(SandboxError::InvalidBlockId(block_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::sandbox::Sandbox;

    #[test]
    fn test_block_id_validation() {
        assert!(is_valid_block_id("BLOCK-PY-00123"));
        assert!(is_valid_block_id("my_block.v2"));
        assert!(!is_valid_block_id(""));
        assert!(!is_valid_block_id(".."));
        assert!(!is_valid_block_id("../etc"));
        assert!(!is_valid_block_id("a/b"));
    }

    #[test]
    fn test_config_for_block_falls_back_to_default() {
        let mut mgr = SandboxManager::new();
        let restricted = SandboxConfig::from_permission_level(PermissionLevel::Restricted);
        mgr.register_block_permissions("BLOCK-1", restricted.clone()).unwrap();
        assert_eq!(mgr.config_for_block("BLOCK-1"), restricted);
        assert_eq!(&mgr.config_for_block("BLOCK-2"), mgr.default_config());
    }

    #[test]
    fn test_scratch_dir_is_writable() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SandboxManager::new().with_scratch_root(dir.path());
        let cfg = mgr
            .create_config_for_block("BLOCK-7", PermissionLevel::Restricted)
            .unwrap();
        assert!(cfg.allowed_write_paths.contains(&dir.path().join("BLOCK-7")));
        // Restricted has no FS_WRITE, so the path alone does not grant writes.
        let sb = Sandbox::new(cfg);
        assert!(!sb.can_write(dir.path().join("BLOCK-7/out.txt")));

        let cfg = mgr
            .create_config_for_block("BLOCK-7", PermissionLevel::Standard)
            .unwrap();
        let sb = Sandbox::new(cfg);
        assert!(sb.can_write(dir.path().join("BLOCK-7/out.txt")));
    }

    #[test]
    fn test_invalid_id_is_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mgr = SandboxManager::new().with_audit(sink.clone());
        let err = mgr
            .create_config_for_block("../../etc", PermissionLevel::Standard)
            .unwrap_err();
        assert!(matches!(err, SandboxError::InvalidBlockId(_)));
        assert_eq!(sink.count(AuditEvent::InvalidBlockId), 1);
    }
}
