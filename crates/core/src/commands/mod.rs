//! Command permission enforcement
//!
//! Roles carry a [`CommandPermissionOverride`] mapping command patterns to
//! decisions. The [`CommandPermissionEvaluator`] resolves a user's decision
//! for a path and [`CommandRequirementHooks`] splices it into the host tree.
//!
//! # Lifecycle
//!
//! ```text
//! tree ready     → hook_all   (compile snapshot, wrap every node)
//! tree rebuilding → invalidate (empty snapshot, nothing matchable)
//! tree rebuilt   → hook_all   (reapply; existing guards are unwrapped first)
//! ```
//!
//! # Example
//!
//! ```ignore
//! [roles.builder.overrides.commands]
//! "gamemode.*" = "allow"
//! "gamemode.spectator" = "hidden"
//! "stop" = "deny"
//! ```

mod evaluator;
mod hooks;
mod matchable;
mod pattern;

pub use evaluator::CommandPermissionEvaluator;
pub use hooks::{CommandRequirementHooks, HookError, RoleGuard};
pub use matchable::{CommandSnapshot, MatchableCommand};
pub use pattern::{CommandPermissionOverride, PatternError, PatternSegment, PermissionPattern};
