//! Roles and the role store
//!
//! A role is a named bundle of override values plus a priority. Roles are
//! loaded from definitions as a whole set and are immutable afterwards; a
//! reload builds a new set and swaps it in.
//!
//! # Definition format
//!
//! ```toml
//! [roles.admin]
//! priority = 100
//!
//! [roles.admin.overrides]
//! commands = { "*" = "allow" }
//! permission_level = 4
//! ```

mod store;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::overrides::{OverrideKey, OverrideType, OverrideValue};

pub use store::{RoleSet, RoleStore};

/// Name of the role implicitly held by every user
pub const EVERYONE: &str = "everyone";

/// Raw role definition as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Higher priority roles win when several define the same override
    #[serde(default, alias = "level")]
    pub priority: i32,

    /// Override type identifier → raw value, decoded by the type's codec
    #[serde(default)]
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl RoleDefinition {
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            overrides: serde_json::Map::new(),
        }
    }

    /// Add a raw override value
    pub fn with(mut self, override_id: &str, value: serde_json::Value) -> Self {
        self.overrides.insert(override_id.to_string(), value);
        self
    }
}

/// Configuration errors for a single role, collected at load time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// A role was defined with a blank name
    #[error("Role identifier must not be empty")]
    EmptyIdentifier,

    /// The same role name appeared twice; the first definition is kept
    #[error("Role '{0}' is defined more than once")]
    DuplicateRole(String),

    /// The role sets an override type nobody registered
    #[error("Role '{role}' sets unknown override '{key}'")]
    UnknownOverride { role: String, key: String },

    /// The override value was rejected by the type's codec
    #[error("Role '{role}' has an invalid value for '{key}': {message}")]
    InvalidValue {
        role: String,
        key: String,
        message: String,
    },
}

/// Errors for explicit role lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleLookupError {
    #[error("Role '{0}' does not exist")]
    UnknownRole(String),

    /// The default role applies to everyone and cannot be assigned
    #[error("Role '{}' cannot be assigned or removed", EVERYONE)]
    DefaultRole,
}

/// A loaded role
pub struct Role {
    id: String,
    priority: i32,
    overrides: HashMap<OverrideKey, OverrideValue>,
}

impl Role {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            priority,
            overrides: HashMap::new(),
        }
    }

    /// Set a typed override value
    pub fn with<V: Send + Sync + 'static>(mut self, ty: &OverrideType<V>, value: V) -> Self {
        self.overrides.insert(ty.key(), Arc::new(value));
        self
    }

    pub(crate) fn insert_raw(&mut self, key: OverrideKey, value: OverrideValue) {
        self.overrides.insert(key, value);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Get this role's value for an override type
    pub fn get<V: Send + Sync + 'static>(&self, ty: &OverrideType<V>) -> Option<Arc<V>> {
        let value = Arc::clone(self.overrides.get(&ty.key())?);
        value.downcast::<V>().ok()
    }

    /// Check whether this role defines an override type
    pub fn defines(&self, key: OverrideKey) -> bool {
        self.overrides.contains_key(&key)
    }

    /// Keys of every override type this role defines
    pub fn override_keys(&self) -> impl Iterator<Item = OverrideKey> + '_ {
        self.overrides.keys().copied()
    }

    pub(crate) fn overrides(&self) -> impl Iterator<Item = (OverrideKey, &OverrideValue)> + '_ {
        self.overrides.iter().map(|(k, v)| (*k, v))
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Role")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

/// Precedence order: descending priority, ties broken by identifier
pub(crate) fn precedence(a: &Role, b: &Role) -> std::cmp::Ordering {
    b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideRegistry;

    #[test]
    fn test_typed_get() {
        let registry = OverrideRegistry::new();
        let mute = registry.register::<bool>("mute").unwrap();
        let level = registry.register::<u8>("level").unwrap();

        let role = Role::new("muted", 5).with(&mute, true);

        assert_eq!(role.get(&mute).as_deref(), Some(&true));
        assert!(role.get(&level).is_none());
        assert!(role.defines(mute.key()));
        assert!(!role.defines(level.key()));
    }

    #[test]
    fn test_precedence() {
        let high = Role::new("b", 10);
        let low = Role::new("a", 1);
        let tie = Role::new("a2", 10);

        assert_eq!(precedence(&high, &low), std::cmp::Ordering::Less);
        assert_eq!(precedence(&tie, &high), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_definition_level_alias() {
        let def: RoleDefinition = serde_json::from_value(serde_json::json!({
            "level": 7,
            "overrides": { "mute": true }
        }))
        .unwrap();

        assert_eq!(def.priority, 7);
        assert_eq!(def.overrides.get("mute"), Some(&serde_json::json!(true)));
        assert_eq!(RoleDefinition::default().priority, 0);
    }
}
