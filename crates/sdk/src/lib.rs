//! Player Roles SDK - Host Command Tree Boundary
//!
//! This crate contains the types shared between the role engine and the host
//! command dispatcher. It has no knowledge of roles; it only describes what
//! the engine needs from a host tree.
//!
//! # Modules
//!
//! - [`path`] - Command paths and their segments
//! - [`requirement`] - Guard predicates attached to tree nodes
//! - [`tree`] - The [`CommandTree`] trait hosts implement
//! - [`source`] - The [`CommandSource`] trait for whoever runs a command
//! - [`suggest`] - Request-local "suggestion pass" flag

pub mod path;
pub mod requirement;
pub mod source;
pub mod suggest;
pub mod tree;

pub use path::{CommandPath, PathSegment, SegmentKind};
pub use requirement::{FnPredicate, Predicate, Requirement};
pub use source::CommandSource;
pub use suggest::{is_suggestion_pass, SuggestionPass};
pub use tree::{CommandTree, NodeEntry, NodeId, TreeError};
