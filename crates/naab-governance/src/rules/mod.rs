//! Rule store: the typed policy model and how it is read from disk.
//!
//! # Modules
//!
//! - [`level`]  : `EnforcementLevel`, `GovernanceMode`
//! - [`model`]  : `RuleSet` and every policy section
//! - [`flex`]   : lenient bool / level / object deserializers
//! - [`loader`] : `RuleStore` discovery, inheritance and loading
//! - [`merge`]  : deep merge used by `extends`
//! - [`env`]    : `${VAR}` substitution
//! - [`schema`] : unknown-key warnings with suggestions

pub mod env;
pub mod flex;
pub mod level;
pub mod loader;
pub mod merge;
pub mod model;
pub mod schema;

pub use level::{EnforcementLevel, GovernanceMode};
pub use loader::{LoadedPolicy, RuleStore, POLICY_FILE_NAME};
pub use merge::merge_documents;
pub use model::*;
pub use schema::{levenshtein, suggest_key};
