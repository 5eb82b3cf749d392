//! Role store - the current set of loaded roles
//!
//! Readers take an `Arc<RoleSet>` snapshot; a load builds a complete new set
//! and swaps it in under a short write lock, so a reader never observes a
//! half-loaded set.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{precedence, Role, RoleDefinition, RoleError, EVERYONE};
use crate::overrides::OverrideRegistry;

/// Immutable set of roles
#[derive(Debug, Default)]
pub struct RoleSet {
    /// Roles in precedence order
    ordered: Vec<Arc<Role>>,

    /// Lookup by identifier
    by_id: HashMap<String, Arc<Role>>,
}

impl RoleSet {
    /// Build a set from roles, ordering them by precedence
    pub fn new(roles: Vec<Role>) -> Self {
        let mut ordered: Vec<Arc<Role>> = roles.into_iter().map(Arc::new).collect();
        ordered.sort_by(|a, b| precedence(a, b));

        let by_id = ordered
            .iter()
            .map(|role| (role.id().to_string(), Arc::clone(role)))
            .collect();

        Self { ordered, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Role>> {
        self.by_id.get(id)
    }

    /// The implicit default role, if defined
    pub fn everyone(&self) -> Option<&Arc<Role>> {
        self.get(EVERYONE)
    }

    /// Iterate roles in precedence order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Role>> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Holder of the current role set
pub struct RoleStore {
    registry: Arc<OverrideRegistry>,
    current: RwLock<Arc<RoleSet>>,
}

impl RoleStore {
    pub fn new(registry: Arc<OverrideRegistry>) -> Self {
        Self {
            registry,
            current: RwLock::new(Arc::new(RoleSet::default())),
        }
    }

    /// Replace the role set
    ///
    /// Every problem is collected. A role with any error is left out; all
    /// other roles still take effect.
    pub fn load<I>(&self, definitions: I) -> Result<(), Vec<RoleError>>
    where
        I: IntoIterator<Item = (String, RoleDefinition)>,
    {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        let mut roles = Vec::new();

        for (id, definition) in definitions {
            let id = id.trim().to_string();
            if id.is_empty() {
                errors.push(RoleError::EmptyIdentifier);
                continue;
            }
            if !seen.insert(id.clone()) {
                errors.push(RoleError::DuplicateRole(id));
                continue;
            }

            match self.build_role(&id, definition) {
                Ok(role) => roles.push(role),
                Err(role_errors) => errors.extend(role_errors),
            }
        }

        let set = RoleSet::new(roles);
        tracing::debug!("Loaded {} roles ({} errors)", set.len(), errors.len());
        *self.current.write() = Arc::new(set);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn build_role(&self, id: &str, definition: RoleDefinition) -> Result<Role, Vec<RoleError>> {
        let mut role = Role::new(id, definition.priority);
        let mut errors = Vec::new();

        for (key_name, raw) in definition.overrides {
            let Some(key) = self.registry.lookup(&key_name) else {
                errors.push(RoleError::UnknownOverride {
                    role: id.to_string(),
                    key: key_name,
                });
                continue;
            };

            match self.registry.decode(key, raw) {
                Some(Ok(value)) => role.insert_raw(key, value),
                Some(Err(e)) => errors.push(RoleError::InvalidValue {
                    role: id.to_string(),
                    key: key_name,
                    message: e.to_string(),
                }),
                None => errors.push(RoleError::UnknownOverride {
                    role: id.to_string(),
                    key: key_name,
                }),
            }
        }

        if errors.is_empty() {
            Ok(role)
        } else {
            Err(errors)
        }
    }

    /// Get the current role set
    pub fn snapshot(&self) -> Arc<RoleSet> {
        Arc::clone(&self.current.read())
    }

    /// Find a role by identifier
    pub fn get(&self, id: &str) -> Option<Arc<Role>> {
        self.snapshot().get(id).cloned()
    }

    /// All roles in precedence order
    pub fn all(&self) -> Vec<Arc<Role>> {
        self.snapshot().iter().cloned().collect()
    }

    /// Encode the current roles back into definitions
    ///
    /// Values whose codec fails to encode are skipped with a warning.
    pub fn to_definitions(&self) -> BTreeMap<String, RoleDefinition> {
        let snapshot = self.snapshot();
        let mut definitions = BTreeMap::new();

        for role in snapshot.iter() {
            let mut definition = RoleDefinition::new(role.priority());
            let mut overrides: Vec<_> = role
                .overrides()
                .filter_map(|(key, value)| {
                    let id = self.registry.id_of(key)?;
                    match self.registry.encode(key, value)? {
                        Ok(encoded) => Some((id.to_string(), encoded)),
                        Err(e) => {
                            tracing::warn!("Failed to encode '{}' of role '{}': {}", id, role.id(), e);
                            None
                        }
                    }
                })
                .collect();
            overrides.sort_by(|a, b| a.0.cmp(&b.0));
            definition.overrides.extend(overrides);

            definitions.insert(role.id().to_string(), definition);
        }

        definitions
    }
}
