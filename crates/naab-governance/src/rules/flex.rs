//! Lenient deserializers for the shapes authors actually write in
//! `govern.json`.
//!
//! A check section may be a bare boolean, a bare level string, or a full
//! object. Several legacy sections also accept a single scalar in place of
//! the nested object that replaced them.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::level::EnforcementLevel;

/// A section that can be switched on and given a level.
pub trait Toggle: Default + DeserializeOwned {
    fn set_enabled(&mut self, enabled: bool);
    fn set_level(&mut self, level: EnforcementLevel);
}

/// Implements [`Toggle`] for structs carrying `enabled: bool` and
/// `level: Option<EnforcementLevel>`.
macro_rules! impl_toggle {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::rules::flex::Toggle for $ty {
                fn set_enabled(&mut self, enabled: bool) {
                    self.enabled = enabled;
                }

                fn set_level(&mut self, level: $crate::rules::level::EnforcementLevel) {
                    self.level = Some(level);
                }
            }
        )+
    };
}
pub(crate) use impl_toggle;

/// Resolve a raw JSON value into a toggle section.
///
/// - `true` / `false` switches the section with its default level
/// - `"hard"` / `"soft"` / `"advisory"` enables it at that level
/// - an object is read as the full section, enabled unless it says otherwise
pub fn toggle_from_value<T: Toggle>(raw: Value) -> Result<T, String> {
    match raw {
        Value::Null => Ok(T::default()),
        Value::Bool(enabled) => {
            let mut section = T::default();
            section.set_enabled(enabled);
            Ok(section)
        }
        Value::String(s) => {
            let level = EnforcementLevel::parse(&s).ok_or_else(|| {
                format!(
                    "unknown enforcement level \"{s}\", expected \"hard\", \"soft\" or \"advisory\"",
                )
            })?;
            let mut section = T::default();
            section.set_enabled(true);
            section.set_level(level);
            Ok(section)
        }
        Value::Object(mut map) => {
            map.entry("enabled").or_insert(Value::Bool(true));
            serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())
        }
        other => Err(format!(
            "expected a boolean, a level string or an object, found {}",
            value_kind(&other)
        )),
    }
}

/// `deserialize_with` adapter for toggle sections.
pub fn toggle<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Toggle,
{
    let raw = Value::deserialize(deserializer)?;
    toggle_from_value(raw).map_err(D::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarOrNested<S, N> {
    Scalar(S),
    Nested(N),
}

/// `deserialize_with` adapter for sections that used to be a single scalar.
/// The scalar form is lifted with `From`.
pub fn scalar_or_nested<'de, D, S, N>(deserializer: D) -> Result<N, D::Error>
where
    D: Deserializer<'de>,
    S: DeserializeOwned,
    N: DeserializeOwned + From<S>,
{
    let raw = Value::deserialize(deserializer)?;
    match serde_json::from_value::<ScalarOrNested<S, N>>(raw.clone()) {
        Ok(ScalarOrNested::Scalar(s)) => Ok(N::from(s)),
        Ok(ScalarOrNested::Nested(n)) => Ok(n),
        // Re-run the nested form alone so the error names the bad field.
        Err(_) => serde_json::from_value::<N>(raw).map_err(D::Error::custom),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
