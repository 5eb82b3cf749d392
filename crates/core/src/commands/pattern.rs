//! Command permission patterns
//!
//! A pattern selects command paths by segment: `gamemode.*`, `tp <target>`,
//! `*`. Each role carries an ordered list of patterns with a decision; the
//! most specific matching pattern decides.

use std::cmp::Reverse;
use std::fmt;

use player_roles_sdk::CommandPath;
use serde::{Deserialize, Serialize, Serializer};

use crate::overrides::OrderedEntries;
use crate::permission::PermissionResult;

/// Pattern parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Command pattern must not be empty")]
    Empty,

    /// A segment mixes wildcard or argument syntax with plain text
    #[error("Invalid segment '{segment}' in command pattern '{pattern}'")]
    InvalidSegment { pattern: String, segment: String },

    /// Command patterns must decide; `fallback` is implied by omission
    #[error("Command pattern '{0}' must be allow, deny or hidden")]
    FallbackDecision(String),
}

/// One segment of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// Matches a literal path segment with this name
    Literal(String),
    /// Matches an argument slot with this name
    Argument(String),
    /// Matches one or more remaining segments and ends the comparison
    Wildcard,
}

impl PatternSegment {
    fn parse(pattern: &str, text: &str) -> Result<Self, PatternError> {
        let invalid = || PatternError::InvalidSegment {
            pattern: pattern.to_string(),
            segment: text.to_string(),
        };

        if text == "*" {
            return Ok(Self::Wildcard);
        }
        if let Some(name) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            if name.is_empty() || name.contains(['<', '>', '*']) {
                return Err(invalid());
            }
            return Ok(Self::Argument(name.to_string()));
        }
        if text.contains(['<', '>', '*']) {
            return Err(invalid());
        }
        Ok(Self::Literal(text.to_string()))
    }
}

/// A parsed command pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPattern {
    text: String,
    segments: Vec<PatternSegment>,
}

impl PermissionPattern {
    /// Parse a pattern
    ///
    /// Segments are separated by `.` or whitespace.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let text = text.trim();
        let segments = text
            .split(|c: char| c == '.' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| PatternSegment::parse(text, s))
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Err(PatternError::Empty);
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Number of literal and argument segments before the first wildcard
    pub fn explicit_prefix(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| !matches!(s, PatternSegment::Wildcard))
            .count()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::Wildcard)
    }

    /// Check whether this pattern selects `path`
    ///
    /// Segments after the first wildcard are never compared.
    pub fn matches(&self, path: &CommandPath) -> bool {
        let path = path.segments();

        for (i, pattern) in self.segments.iter().enumerate() {
            let Some(segment) = path.get(i) else {
                return false;
            };

            let matched = match pattern {
                PatternSegment::Wildcard => return true,
                PatternSegment::Literal(name) => segment.is_literal() && segment.name() == name,
                PatternSegment::Argument(name) => segment.is_argument() && segment.name() == name,
            };
            if !matched {
                return false;
            }
        }

        path.len() == self.segments.len()
    }
}

impl fmt::Display for PermissionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Command permissions carried by one role
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "OrderedEntries<PermissionResult>")]
pub struct CommandPermissionOverride {
    /// Patterns in declaration order
    patterns: Vec<(PermissionPattern, PermissionResult)>,

    /// Indices into `patterns`, most specific first
    order: Vec<usize>,
}

impl CommandPermissionOverride {
    /// Build from pattern text and decision pairs in declaration order
    pub fn new<I>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (String, PermissionResult)>,
    {
        let mut patterns = Vec::new();
        for (text, result) in entries {
            if result == PermissionResult::Fallback {
                return Err(PatternError::FallbackDecision(text));
            }
            patterns.push((PermissionPattern::parse(&text)?, result));
        }

        let mut order: Vec<usize> = (0..patterns.len()).collect();
        // An explicit segment beats a wildcard at the same position, so the
        // longer explicit prefix wins. Stable: ties keep declaration order.
        order.sort_by_key(|&i| {
            let pattern = &patterns[i].0;
            (Reverse(pattern.explicit_prefix()), pattern.has_wildcard())
        });

        Ok(Self { patterns, order })
    }

    /// Decide a command path
    ///
    /// Returns the decision of the most specific matching pattern, or
    /// `Fallback` if none match.
    pub fn test(&self, path: &CommandPath) -> PermissionResult {
        self.order
            .iter()
            .map(|&i| &self.patterns[i])
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, result)| *result)
            .unwrap_or(PermissionResult::Fallback)
    }

    /// Patterns in declaration order
    pub fn patterns(&self) -> impl Iterator<Item = (&PermissionPattern, PermissionResult)> {
        self.patterns.iter().map(|(p, r)| (p, *r))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl TryFrom<OrderedEntries<PermissionResult>> for CommandPermissionOverride {
    type Error = PatternError;

    fn try_from(value: OrderedEntries<PermissionResult>) -> Result<Self, Self::Error> {
        Self::new(value.0)
    }
}

impl Serialize for CommandPermissionOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.patterns.iter().map(|(p, r)| (p.to_string(), r)))
    }
}
