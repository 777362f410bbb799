//! Enforcement: decisions, recorded results, violation notices and the
//! run summary.
//!
//! # Modules
//!
//! - [`engine`]  : `EnforcementEngine`, `CheckResult`, `Outcome`
//! - [`notice`]  : `ViolationNotice` rendering plus masking helpers
//! - [`summary`] : `format_summary`, `SummaryCounts`

pub mod engine;
pub mod notice;
pub mod summary;

pub use engine::{AuditFilter, CheckResult, EnforcementEngine, Outcome};
pub use notice::{mask_secret, truncate_chars, ViolationNotice};
pub use summary::{format_summary, SummaryCounts};
