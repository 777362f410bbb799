//! Enforcement levels and the global governance mode.

use serde::{Deserialize, Serialize};

/// How strongly a rule is enforced when it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementLevel {
    /// Always blocks. No override.
    #[default]
    Hard,
    /// Blocks unless the session override flag is set.
    Soft,
    /// Never blocks; logs a warning.
    Advisory,
}

impl EnforcementLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hard" => Some(Self::Hard),
            "soft" => Some(Self::Soft),
            "advisory" => Some(Self::Advisory),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Soft => "soft",
            Self::Advisory => "advisory",
        }
    }

    /// Tag printed in violation headers.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Hard => "HARD-MANDATORY",
            Self::Soft => "SOFT-MANDATORY",
            Self::Advisory => "ADVISORY",
        }
    }
}

impl std::fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global switch controlling whether levels actually block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceMode {
    #[default]
    Enforce,
    Audit,
    Off,
}

impl GovernanceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Audit => "audit",
            Self::Off => "off",
        }
    }
}

impl std::fmt::Display for GovernanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_and_display() {
        for level in [
            EnforcementLevel::Hard,
            EnforcementLevel::Soft,
            EnforcementLevel::Advisory,
        ] {
            assert_eq!(EnforcementLevel::parse(level.as_str()), Some(level));
            assert_eq!(level.to_string(), level.as_str());
        }
        assert_eq!(EnforcementLevel::parse("strict"), None);
        assert_eq!(EnforcementLevel::parse("HARD"), None);
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(EnforcementLevel::Hard.tag(), "HARD-MANDATORY");
        assert_eq!(EnforcementLevel::Soft.tag(), "SOFT-MANDATORY");
        assert_eq!(EnforcementLevel::Advisory.tag(), "ADVISORY");
    }

    #[test]
    fn test_mode_serde() {
        let mode: GovernanceMode = serde_json::from_str("\"audit\"").unwrap();
        assert_eq!(mode, GovernanceMode::Audit);
        assert_eq!(GovernanceMode::default(), GovernanceMode::Enforce);
        assert!(serde_json::from_str::<GovernanceMode>("\"loud\"").is_err());
    }
}
