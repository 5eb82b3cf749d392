//! Player Roles - Core Logic
//!
//! Role resolution and command permission enforcement.
//!
//! # Overview
//!
//! - [`overrides`] - Override type registry and built-in value types
//! - [`roles`] - Role definitions and the role store
//! - [`manager`] - Role assignments and per-user value resolution
//! - [`commands`] - Command patterns, the evaluator and tree hooks
//! - [`config`] - Roles config file
//!
//! # Re-exports
//!
//! - [`sdk`] - Host command tree boundary types

pub use player_roles_sdk as sdk;

pub mod commands;
pub mod config;
pub mod manager;
pub mod overrides;
pub mod permission;
pub mod roles;

// Re-export commonly used items
pub use commands::{
    CommandPermissionEvaluator, CommandPermissionOverride, CommandRequirementHooks,
    CommandSnapshot, HookError, MatchableCommand, PatternError, PermissionPattern, RoleGuard,
};
pub use config::{ConfigError, ConfigResult, RolesConfig};
pub use manager::PlayerRoleManager;
pub use overrides::{
    check_permission, ChatFormat, NameStyle, OverrideKey, OverrideRegistry, OverrideType,
    PermissionKeyOverride, PermissionLevel, RegistryError, TextStyle,
};
pub use permission::PermissionResult;
pub use roles::{Role, RoleDefinition, RoleError, RoleLookupError, RoleSet, RoleStore, EVERYONE};
