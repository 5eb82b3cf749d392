//! Player role manager - role assignments and value resolution
//!
//! Assignments are stored per user in a [`DashMap`]; the roles themselves come
//! from the [`RoleStore`] snapshot. Resolution is computed on demand and is
//! never cached, so a reload or an assignment change is visible to the very
//! next lookup.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::overrides::{OverrideKey, OverrideRegistry, OverrideType};
use crate::roles::{
    precedence, Role, RoleDefinition, RoleError, RoleLookupError, RoleSet, RoleStore, EVERYONE,
};

/// Owner of role assignments
pub struct PlayerRoleManager {
    registry: Arc<OverrideRegistry>,
    store: RoleStore,
    assignments: DashMap<u64, Vec<String>>,
}

impl PlayerRoleManager {
    pub fn new(registry: Arc<OverrideRegistry>) -> Self {
        Self {
            store: RoleStore::new(Arc::clone(&registry)),
            registry,
            assignments: DashMap::new(),
        }
    }

    pub fn store(&self) -> &RoleStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<OverrideRegistry> {
        &self.registry
    }

    // ============================================================================
    // Mutation APIs
    // ============================================================================

    /// Assign role(s) to a user
    ///
    /// Every id is validated before anything changes. Roles the user already
    /// holds are skipped.
    ///
    /// # Returns
    /// The number of roles actually added
    pub fn assign(&self, user: u64, role_ids: &[&str]) -> Result<usize, RoleLookupError> {
        let snapshot = self.store.snapshot();
        validate(&snapshot, role_ids)?;

        let added: Vec<String> = {
            let mut entry = self.assignments.entry(user).or_default();
            let mut added = Vec::new();
            for id in role_ids {
                if !entry.iter().any(|held| held == id) {
                    entry.push(id.to_string());
                    added.push(id.to_string());
                }
            }
            added
        };

        if !added.is_empty() {
            tracing::debug!("Assigned roles {:?} to user {}", added, user);
            self.notify_roles(user, &snapshot, &added);
        }
        Ok(added.len())
    }

    /// Remove a role from a user
    ///
    /// A role that no longer exists after a reload can still be removed.
    ///
    /// # Returns
    /// `true` if the user held the role
    pub fn unassign(&self, user: u64, role_id: &str) -> Result<bool, RoleLookupError> {
        if role_id == EVERYONE {
            return Err(RoleLookupError::DefaultRole);
        }

        let snapshot = self.store.snapshot();
        let removed = match self.assignments.get_mut(&user) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|held| held != role_id);
                entry.len() != before
            }
            None => false,
        };

        if !removed {
            if snapshot.get(role_id).is_none() {
                return Err(RoleLookupError::UnknownRole(role_id.to_string()));
            }
            return Ok(false);
        }

        self.assignments.remove_if(&user, |_, roles| roles.is_empty());
        tracing::debug!("Removed role '{}' from user {}", role_id, user);
        self.notify_roles(user, &snapshot, &[role_id.to_string()]);
        Ok(true)
    }

    /// Replace all of a user's roles
    pub fn set_roles(&self, user: u64, role_ids: &[&str]) -> Result<(), RoleLookupError> {
        let snapshot = self.store.snapshot();
        validate(&snapshot, role_ids)?;

        let mut next: Vec<String> = Vec::with_capacity(role_ids.len());
        for id in role_ids {
            if !next.iter().any(|held| held == id) {
                next.push(id.to_string());
            }
        }

        let previous = if next.is_empty() {
            self.assignments.remove(&user).map(|(_, roles)| roles)
        } else {
            self.assignments.insert(user, next.clone())
        }
        .unwrap_or_default();

        let changed: Vec<String> = previous
            .iter()
            .filter(|id| !next.contains(*id))
            .chain(next.iter().filter(|id| !previous.contains(*id)))
            .cloned()
            .collect();

        if !changed.is_empty() {
            self.notify_roles(user, &snapshot, &changed);
        }
        Ok(())
    }

    /// Remove every role from a user
    pub fn clear(&self, user: u64) {
        let snapshot = self.store.snapshot();
        if let Some((_, removed)) = self.assignments.remove(&user) {
            self.notify_roles(user, &snapshot, &removed);
        }
    }

    /// Reload role definitions
    ///
    /// Every tracked user plus every user in `online` is notified once for
    /// each override type defined by their roles before or after the reload.
    /// Assignments naming roles that no longer exist are kept and ignored.
    pub fn reload<I>(&self, definitions: I, online: &[u64]) -> Result<(), Vec<RoleError>>
    where
        I: IntoIterator<Item = (String, RoleDefinition)>,
    {
        let before = self.store.snapshot();
        let result = self.store.load(definitions);
        let after = self.store.snapshot();

        let mut users: HashSet<u64> = self.tracked_users().into_iter().collect();
        users.extend(online.iter().copied());

        for user in users {
            let assigned = self.assigned(user);
            let keys: HashSet<OverrideKey> = roles_in(&before, &assigned)
                .iter()
                .chain(roles_in(&after, &assigned).iter())
                .flat_map(|role| role.override_keys())
                .collect();

            for key in keys {
                self.registry.notify(key, user);
            }
        }

        result
    }

    fn notify_roles(&self, user: u64, snapshot: &RoleSet, role_ids: &[String]) {
        let keys: HashSet<OverrideKey> = role_ids
            .iter()
            .filter_map(|id| snapshot.get(id))
            .flat_map(|role| role.override_keys())
            .collect();

        for key in keys {
            self.registry.notify(key, user);
        }
    }

    // ============================================================================
    // Query APIs
    // ============================================================================

    /// Role ids explicitly assigned to a user, in assignment order
    pub fn assigned(&self, user: u64) -> Vec<String> {
        self.assignments
            .get(&user)
            .map(|roles| roles.value().clone())
            .unwrap_or_default()
    }

    /// Check whether a user holds a role
    ///
    /// Always true for the default role when it is defined.
    pub fn has_role(&self, user: u64, role_id: &str) -> bool {
        self.roles_of(user).iter().any(|role| role.id() == role_id)
    }

    /// Effective roles of a user, highest priority first
    ///
    /// Includes the default role when defined. Assignments naming roles that
    /// are not loaded are skipped.
    pub fn roles_of(&self, user: u64) -> Vec<Arc<Role>> {
        let snapshot = self.store.snapshot();
        roles_in(&snapshot, &self.assigned(user))
    }

    /// Resolve the effective value of an override type for a user
    ///
    /// The highest priority role defining the type wins.
    pub fn resolve<V: Send + Sync + 'static>(&self, user: u64, ty: &OverrideType<V>) -> Option<Arc<V>> {
        self.roles_of(user).iter().find_map(|role| role.get(ty))
    }

    /// Users with at least one explicit assignment
    pub fn tracked_users(&self) -> Vec<u64> {
        self.assignments.iter().map(|e| *e.key()).collect()
    }
}

fn validate(snapshot: &RoleSet, role_ids: &[&str]) -> Result<(), RoleLookupError> {
    for id in role_ids {
        if *id == EVERYONE {
            return Err(RoleLookupError::DefaultRole);
        }
        if snapshot.get(id).is_none() {
            return Err(RoleLookupError::UnknownRole(id.to_string()));
        }
    }
    Ok(())
}

fn roles_in(snapshot: &RoleSet, assigned: &[String]) -> Vec<Arc<Role>> {
    let mut roles: Vec<Arc<Role>> = assigned
        .iter()
        .filter_map(|id| snapshot.get(id).cloned())
        .collect();
    if let Some(everyone) = snapshot.everyone() {
        roles.push(Arc::clone(everyone));
    }

    roles.sort_by(|a, b| precedence(a, b));
    roles.dedup_by(|a, b| a.id() == b.id());
    roles
}
