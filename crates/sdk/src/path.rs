//! Command path types
//!
//! A [`CommandPath`] identifies one node in a dispatch tree by the sequence of
//! segments walked from the root. Literal segments are matched by name;
//! argument slots carry the argument's declared name.

use std::fmt;

/// Kind of a single path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentKind {
    /// A fixed keyword such as `gamemode`
    Literal,
    /// A user-supplied value slot such as `<target>`
    Argument,
}

/// One segment of a command path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment {
    name: String,
    kind: SegmentKind,
}

impl PathSegment {
    /// Create a literal segment
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Literal,
        }
    }

    /// Create an argument-slot segment
    pub fn argument(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::Argument,
        }
    }

    /// Segment name (the literal keyword or the argument name)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_literal(&self) -> bool {
        self.kind == SegmentKind::Literal
    }

    pub fn is_argument(&self) -> bool {
        self.kind == SegmentKind::Argument
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Literal => f.write_str(&self.name),
            SegmentKind::Argument => write!(f, "<{}>", self.name),
        }
    }
}

/// Root-to-node sequence of segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPath {
    segments: Vec<PathSegment>,
}

impl CommandPath {
    /// Create a path from its segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Create a path consisting only of literal segments
    ///
    /// `CommandPath::literals(&["gamemode", "creative"])`
    pub fn literals(names: &[&str]) -> Self {
        Self {
            segments: names.iter().map(|n| PathSegment::literal(*n)).collect(),
        }
    }

    /// Return a new path extended by one segment
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the first segment (the top-level command)
    pub fn command_name(&self) -> Option<&str> {
        self.segments.first().map(|s| s.name())
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = CommandPath::literals(&["role", "assign"])
            .child(PathSegment::argument("target"))
            .child(PathSegment::argument("role"));

        assert_eq!(path.to_string(), "role assign <target> <role>");
        assert_eq!(path.len(), 4);
        assert_eq!(path.command_name(), Some("role"));
    }

    #[test]
    fn test_literal_and_argument_differ() {
        let literal = CommandPath::new(vec![PathSegment::literal("x")]);
        let argument = CommandPath::new(vec![PathSegment::argument("x")]);

        assert_ne!(literal, argument);
        assert!(literal.segments()[0].is_literal());
        assert!(argument.segments()[0].is_argument());
    }

    #[test]
    fn test_empty_path() {
        let path = CommandPath::default();
        assert!(path.is_empty());
        assert_eq!(path.command_name(), None);
        assert_eq!(path.to_string(), "");
    }
}
