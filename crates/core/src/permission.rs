//! Permission decision type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of evaluating a role override against a command or permission key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionResult {
    /// Explicitly allowed, regardless of the host's own requirement
    Allow,
    /// Explicitly denied
    Deny,
    /// Usable when executed directly, but left out of suggestions
    Hidden,
    /// No role expressed an opinion; defer to the host
    #[default]
    #[serde(alias = "pass")]
    Fallback,
}

impl PermissionResult {
    /// Returns true for every result except [`PermissionResult::Fallback`]
    pub fn is_definitive(self) -> bool {
        self != Self::Fallback
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Hidden => "hidden",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PermissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for parsing an unknown decision string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission result '{0}' (expected allow, deny, hidden or fallback)")]
pub struct ParseResultError(String);

impl FromStr for PermissionResult {
    type Err = ParseResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            "hidden" => Ok(Self::Hidden),
            "fallback" | "pass" => Ok(Self::Fallback),
            _ => Err(ParseResultError(s.to_string())),
        }
    }
}
