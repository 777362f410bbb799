//! Typed form of `govern.json`.
//!
//! Every section has serde defaults so a partial document loads. Check
//! sections store `level: Option<EnforcementLevel>`; `None` means "use the
//! check's own default level" (see [`crate::checks::CheckDescriptor`]).

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::flex::{self, impl_toggle};
use super::level::{EnforcementLevel, GovernanceMode};

/// A loaded, immutable rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub version: String,
    pub mode: GovernanceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub description: String,
    pub languages: LanguagesConfig,
    pub capabilities: CapabilitiesConfig,
    pub limits: LimitsConfig,
    pub requirements: RequirementsConfig,
    pub restrictions: RestrictionsConfig,
    pub code_quality: CodeQualityConfig,
    pub custom_rules: Vec<CustomRule>,
    /// Per-path scoping blocks. Kept verbatim for hosts that resolve them.
    pub scopes: Vec<Value>,
    pub output: OutputConfig,
    pub audit: AuditConfig,
    pub meta: MetaConfig,
    pub hooks: HooksConfig,
    pub polyglot: PolyglotConfig,
}

impl RuleSet {
    pub fn is_active(&self) -> bool {
        self.mode != GovernanceMode::Off
    }

    /// Per-language config, if the policy declares one for `language`.
    pub fn language_config(&self, language: &str) -> Option<&LanguageConfig> {
        self.languages.per_language.get(language)
    }

    /// Per-language timeout, then the per-block limit, then the global limit.
    /// Zero means no limit.
    pub fn timeout_for_language(&self, language: &str) -> u64 {
        if let Some(t) = self.language_config(language).map(|l| l.timeout).filter(|t| *t > 0) {
            return t;
        }
        if self.limits.timeout.per_block > 0 {
            return self.limits.timeout.per_block;
        }
        self.limits.timeout.global
    }

    /// Per-language line limit, then the code limit. Zero means no limit.
    pub fn max_lines_for_language(&self, language: &str) -> usize {
        self.language_config(language)
            .map(|l| l.max_lines)
            .filter(|n| *n > 0)
            .unwrap_or(self.limits.code.max_lines_per_block)
    }

    pub fn max_output_size_for_language(&self, language: &str) -> usize {
        self.language_config(language)
            .map(|l| l.max_output_size)
            .filter(|n| *n > 0)
            .unwrap_or(self.restrictions.polyglot_output.max_size)
    }

    /// Whether `language` passes the allow/block lists.
    pub fn is_language_allowed(&self, language: &str) -> bool {
        if self.languages.blocked.contains(language) {
            return false;
        }
        self.languages.allowed.is_empty() || self.languages.allowed.contains(language)
    }
}

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagesConfig {
    pub allowed: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
    pub require_explicit: bool,
    pub per_language: BTreeMap<String, LanguageConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub version_hint: String,
    pub timeout: u64,
    pub max_lines: usize,
    pub max_output_size: usize,
    pub banned_functions: Vec<String>,
    pub banned_imports: Vec<String>,
    /// Whole-word keywords rejected alongside `banned_functions`.
    pub banned_keywords: Vec<String>,
    pub imports: ImportRules,
    #[serde(deserialize_with = "flex::toggle")]
    pub require_set_e: StyleRule,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_var: StyleRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRules {
    pub blocked: Vec<String>,
    pub allowed: Vec<String>,
}

/// Language style switch such as `require_set_e` or `no_var`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleRule {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, bool, _>")]
    pub network: CapabilitySwitch,
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, FilesystemMode, _>")]
    pub filesystem: FilesystemCapability,
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, bool, _>")]
    pub shell: CapabilitySwitch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySwitch {
    pub enabled: bool,
}

impl Default for CapabilitySwitch {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl From<bool> for CapabilitySwitch {
    fn from(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilesystemMode {
    None,
    Read,
    #[default]
    Write,
}

impl std::fmt::Display for FilesystemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilesystemMode::None => "none",
            FilesystemMode::Read => "read",
            FilesystemMode::Write => "write",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemCapability {
    pub mode: FilesystemMode,
}

impl From<FilesystemMode> for FilesystemCapability {
    fn from(mode: FilesystemMode) -> Self {
        Self { mode }
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Resource limits. Zero disables a limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, u64, _>")]
    pub timeout: TimeoutLimits,
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, u64, _>")]
    pub memory: MemoryLimits,
    pub execution: ExecutionLimits,
    pub data: DataLimits,
    pub code: CodeLimits,
    pub rate: RateLimits,
    /// Flat legacy form of `execution.call_depth`.
    pub call_depth: usize,
    /// Flat legacy form of `data.array_size`.
    pub array_size: usize,
}

impl LimitsConfig {
    pub fn effective_call_depth(&self) -> usize {
        if self.execution.call_depth > 0 {
            self.execution.call_depth
        } else {
            self.call_depth
        }
    }

    pub fn effective_array_size(&self) -> usize {
        if self.data.array_size > 0 {
            self.data.array_size
        } else {
            self.array_size
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutLimits {
    pub global: u64,
    pub per_block: u64,
    pub total_polyglot: u64,
}

impl From<u64> for TimeoutLimits {
    fn from(global: u64) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryLimits {
    pub per_block_mb: u64,
    pub total_mb: u64,
}

impl From<u64> for MemoryLimits {
    fn from(total_mb: u64) -> Self {
        Self {
            total_mb,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    pub call_depth: usize,
    pub loop_iterations: usize,
    pub polyglot_blocks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLimits {
    pub array_size: usize,
    pub dict_size: usize,
    pub string_length: usize,
    pub nesting_depth: usize,
    pub output_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeLimits {
    pub max_lines_per_block: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub max_polyglot_per_second: u32,
    pub max_stdlib_calls_per_second: u32,
    pub max_file_ops_per_second: u32,
}

// ---------------------------------------------------------------------------
// Requirements (host-language structure; evaluated by the host)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsConfig {
    #[serde(deserialize_with = "flex::toggle")]
    pub main_block: RequirementRule,
    #[serde(deserialize_with = "flex::toggle")]
    pub error_handling: RequirementRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementRule {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Restrictions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionsConfig {
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, OutputFormat, _>")]
    pub polyglot_output: PolyglotOutputRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub dangerous_calls: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub shell_injection: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub imports: ImportsRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub data_exfiltration: DataExfiltrationRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub resource_abuse: ResourceAbuseRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub privilege_escalation: PrivilegeEscalationRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub information_disclosure: InformationDisclosureRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub code_injection: CodeInjectionRestriction,
    #[serde(deserialize_with = "flex::toggle")]
    pub crypto: CryptoRestriction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Any,
    Json,
    String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyglotOutputRestriction {
    pub format: OutputFormat,
    pub max_size: usize,
}

impl From<OutputFormat> for PolyglotOutputRestriction {
    fn from(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    /// Blocked module names keyed by language; `"any"` applies everywhere.
    pub blocked: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataExfiltrationRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_base64_encode_secrets: bool,
    pub block_hex_encode_secrets: bool,
    pub block_dns_exfiltration: bool,
}

impl Default for DataExfiltrationRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_base64_encode_secrets: true,
            block_hex_encode_secrets: true,
            block_dns_exfiltration: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceAbuseRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_fork_bomb: bool,
    pub block_disk_filling: bool,
    pub block_infinite_loops: bool,
}

impl Default for ResourceAbuseRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_fork_bomb: true,
            block_disk_filling: true,
            block_infinite_loops: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeEscalationRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_sudo: bool,
    pub block_su: bool,
    pub block_chmod_suid: bool,
    pub block_setuid: bool,
}

impl Default for PrivilegeEscalationRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_sudo: true,
            block_su: true,
            block_chmod_suid: true,
            block_setuid: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformationDisclosureRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_env_dump: bool,
    pub block_process_listing: bool,
    pub block_system_info_leak: bool,
}

impl Default for InformationDisclosureRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_env_dump: true,
            block_process_listing: true,
            block_system_info_leak: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeInjectionRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_dynamic_code_gen: bool,
    pub block_sql_injection_patterns: bool,
    pub block_command_injection: bool,
}

impl Default for CodeInjectionRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_dynamic_code_gen: true,
            block_sql_injection_patterns: true,
            block_command_injection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoRestriction {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_weak_hashing: bool,
    pub weak_hashes: Vec<String>,
    pub block_weak_encryption: bool,
    pub weak_ciphers: Vec<String>,
    pub block_hardcoded_keys: bool,
}

impl Default for CryptoRestriction {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_weak_hashing: true,
            weak_hashes: vec!["md5".into(), "sha1".into()],
            block_weak_encryption: true,
            weak_ciphers: vec!["des".into(), "rc4".into(), "blowfish".into()],
            block_hardcoded_keys: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Code quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeQualityConfig {
    #[serde(deserialize_with = "flex::toggle")]
    pub no_secrets: SecretsCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_placeholders: PlaceholdersCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_hardcoded_results: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_pii: PiiCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_temporary_code: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_simulation_markers: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_mock_data: MockDataCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_apologetic_language: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_dead_code: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_debug_artifacts: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_unsafe_deserialization: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_sql_injection: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_path_traversal: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_hardcoded_urls: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_hardcoded_ips: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub max_complexity: ComplexityCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub encoding: EncodingCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_oversimplification: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_incomplete_logic: PatternCheck,
    #[serde(deserialize_with = "flex::toggle")]
    pub no_hallucinated_apis: HallucinationCheck,
}

/// Generic regex-driven check section.
///
/// `patterns` replaces the built-in list when non-empty; `custom_patterns`
/// is always appended. Matches containing an `allowlist` entry are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub patterns: Vec<String>,
    pub custom_patterns: Vec<String>,
    pub allowlist: Vec<String>,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub allowlist: Vec<String>,
    pub custom_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholdersCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    /// Replaces the built-in marker words when non-empty.
    pub markers: Vec<String>,
    pub custom_markers: Vec<String>,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub detect_ssn: bool,
    pub detect_credit_card: bool,
    pub detect_email: bool,
    pub detect_phone: bool,
    pub detect_ip_address: bool,
    pub allowlist_patterns: Vec<String>,
    pub mask_in_errors: bool,
}

impl Default for PiiCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            detect_ssn: true,
            detect_credit_card: true,
            detect_email: true,
            detect_phone: true,
            detect_ip_address: false,
            allowlist_patterns: Vec::new(),
            mask_in_errors: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockDataCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub variable_prefixes: Vec<String>,
    pub literal_patterns: Vec<String>,
    pub custom_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub max_lines_per_block: usize,
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub block_null_bytes: bool,
    pub block_unicode_bidi: bool,
}

impl Default for EncodingCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            block_null_bytes: true,
            block_unicode_bidi: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HallucinationCheck {
    pub enabled: bool,
    pub level: Option<EnforcementLevel>,
    pub check_cross_language: bool,
    pub case_sensitive: bool,
    pub custom_patterns: Vec<String>,
}

impl Default for HallucinationCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            level: None,
            check_cross_language: true,
            case_sensitive: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl_toggle!(
    StyleRule,
    RequirementRule,
    PatternCheck,
    ImportsRestriction,
    DataExfiltrationRestriction,
    ResourceAbuseRestriction,
    PrivilegeEscalationRestriction,
    InformationDisclosureRestriction,
    CodeInjectionRestriction,
    CryptoRestriction,
    SecretsCheck,
    PlaceholdersCheck,
    PiiCheck,
    MockDataCheck,
    ComplexityCheck,
    EncodingCheck,
    HallucinationCheck,
);

// ---------------------------------------------------------------------------
// Custom rules
// ---------------------------------------------------------------------------

/// User-authored regex rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pattern: String,
    /// Empty means every language.
    pub languages: Vec<String>,
    pub level: EnforcementLevel,
    pub message: String,
    pub help: String,
    pub good_example: String,
    pub bad_example: String,
    pub tags: Vec<String>,
    pub enabled: bool,
    pub case_sensitive: bool,
    pub multiline: bool,
}

impl Default for CustomRule {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            pattern: String::new(),
            languages: Vec::new(),
            level: EnforcementLevel::Hard,
            message: String::new(),
            help: String::new(),
            good_example: String::new(),
            bad_example: String::new(),
            tags: Vec::new(),
            enabled: true,
            case_sensitive: false,
            multiline: false,
        }
    }
}

impl CustomRule {
    pub fn applies_to(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn compile(&self) -> Result<regex::Regex, regex::Error> {
        regex::RegexBuilder::new(&self.pattern)
            .case_insensitive(!self.case_sensitive)
            .multi_line(self.multiline)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Output, audit, meta, hooks, polyglot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub summary: SummaryOutput,
    pub errors: ErrorOutput,
    pub file_output: FileOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOutput {
    pub enabled: bool,
    pub show_passing: bool,
}

impl Default for SummaryOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            show_passing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorOutput {
    pub show_help: bool,
    pub show_examples: bool,
}

impl Default for ErrorOutput {
    fn default() -> Self {
        Self {
            show_help: true,
            show_examples: true,
        }
    }
}

/// Report destinations. Relative paths resolve against the policy directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutput {
    pub report_json: Option<PathBuf>,
    pub report_sarif: Option<PathBuf>,
    pub report_junit: Option<PathBuf>,
    pub report_csv: Option<PathBuf>,
    pub report_html: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    None,
    /// Failures, warnings and overrides.
    #[default]
    Basic,
    /// Everything, including passes.
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub level: AuditLevel,
    pub output_file: PathBuf,
    #[serde(deserialize_with = "flex::scalar_or_nested::<_, bool, _>")]
    pub tamper_evidence: TamperEvidence,
    pub log_events: LogEvents,
    pub retention: Retention,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            level: AuditLevel::default(),
            output_file: PathBuf::from(".governance-audit.jsonl"),
            tamper_evidence: TamperEvidence::default(),
            log_events: LogEvents::default(),
            retention: Retention::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TamperEvidence {
    pub enabled: bool,
    /// Only `sha256` is supported.
    pub algorithm: String,
    /// Accepted for older policies; chains always start from the all-zero hash.
    pub chain_genesis: String,
}

impl Default for TamperEvidence {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: "sha256".to_string(),
            chain_genesis: String::new(),
        }
    }
}

impl From<bool> for TamperEvidence {
    fn from(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEvents {
    pub checks_passed: bool,
    pub checks_failed: bool,
    pub overrides: bool,
}

impl Default for LogEvents {
    fn default() -> Self {
        Self {
            checks_passed: true,
            checks_failed: true,
            overrides: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Retention {
    /// Hard ceiling; used as the rotation threshold when `rotate_at_mb` is 0.
    pub max_file_size_mb: u64,
    pub rotate_at_mb: u64,
    pub keep_rotated: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            rotate_at_mb: 50,
            keep_rotated: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    pub schema_validation: SchemaValidation,
    pub inheritance: Inheritance,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaValidation {
    pub warn_unknown_keys: bool,
    pub suggest_corrections: bool,
}

impl Default for SchemaValidation {
    fn default() -> Self {
        Self {
            warn_unknown_keys: true,
            suggest_corrections: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inheritance {
    pub max_depth: usize,
    pub merge_strategy: String,
}

impl Default for Inheritance {
    fn default() -> Self {
        Self {
            max_depth: 5,
            merge_strategy: "child_wins".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub allow_env_var_substitution: bool,
    /// When non-empty, only variables with this prefix are substituted.
    pub env_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub on_violation: Option<HookSpec>,
    pub on_override: Option<HookSpec>,
    pub on_complete: Option<HookSpec>,
    pub pre_check: Option<HookSpec>,
    pub post_check: Option<HookSpec>,
}

/// External command fired on a governance event. `${name}` placeholders in
/// `args` are filled from the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSpec {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: u64,
}

impl Default for HookSpec {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            timeout: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyglotConfig {
    pub output: PolyglotOutputRules,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyglotOutputRules {
    pub require_json_pipe: bool,
    pub max_output_lines: usize,
}
