//! Sandbox: capability-based access control for polyglot blocks.
//!
//! A [`SandboxConfig`] is expanded from a [`PermissionLevel`] preset and
//! refined with allow-lists. A [`Sandbox`] answers whether a resource
//! operation is permitted; [`ScopedSandbox`] makes one current for the
//! calling thread.
//!
//! # Modules
//!
//! - [`capability`] : `Capability` flags and `PermissionLevel` presets
//! - [`config`]     : `SandboxConfig` and preset expansion
//! - [`path`]       : canonicalization and allow-list containment
//! - [`engine`]     : `Sandbox` with `can_*` predicates and `check_*` variants
//! - [`scope`]      : thread-local activation guard
//! - [`manager`]    : per-block config registry
//! - [`error`]      : `SandboxViolation` / `SandboxError`

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod path;
pub mod scope;

pub use capability::{Capability, PermissionLevel};
pub use config::SandboxConfig;
pub use engine::Sandbox;
pub use error::{SandboxError, SandboxResult, SandboxViolation};
pub use manager::{is_valid_block_id, SandboxManager};
pub use scope::ScopedSandbox;
