//! Permission key override value
//!
//! Lets roles answer host permission checks such as `@css/ban`. Keys use the
//! `@domain/flag` format; a role may grant or deny a whole domain with
//! `@domain/*` or `@domain/root`, or every key with `*`.

use serde::{Deserialize, Serialize, Serializer};

use super::{OrderedEntries, OverrideType};
use crate::manager::PlayerRoleManager;
use crate::permission::PermissionResult;

/// Permission prefix character for domain flags
pub const PERMISSION_PREFIX: char = '@';

/// Extract domain from permission string
///
/// `@domain/flag` -> `Some("domain")`
/// `invalid` -> `None`
pub fn extract_domain(permission: &str) -> Option<&str> {
    permission
        .strip_prefix(PERMISSION_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .filter(|domain| !domain.is_empty())
}

/// Per-role decisions for permission keys
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "OrderedEntries<PermissionResult>")]
pub struct PermissionKeyOverride {
    entries: Vec<(String, PermissionResult)>,
}

impl PermissionKeyOverride {
    /// Create from key/decision pairs
    ///
    /// Only `allow` and `deny` are meaningful for permission keys.
    pub fn new(entries: Vec<(String, PermissionResult)>) -> Result<Self, String> {
        if let Some((key, result)) = entries
            .iter()
            .find(|(_, r)| !matches!(r, PermissionResult::Allow | PermissionResult::Deny))
        {
            return Err(format!(
                "permission key '{}' must be allow or deny, got {}",
                key, result
            ));
        }
        Ok(Self { entries })
    }

    fn lookup(&self, key: &str) -> Option<PermissionResult> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, result)| *result)
    }

    /// Decide a permission key
    ///
    /// An exact entry wins over a domain wildcard, which wins over `*`.
    pub fn test(&self, permission: &str) -> PermissionResult {
        if let Some(result) = self.lookup(permission) {
            return result;
        }

        if let Some(domain) = extract_domain(permission) {
            let root_flag = format!("@{}/root", domain);
            let wildcard_flag = format!("@{}/*", domain);
            if let Some(result) = self
                .lookup(&wildcard_flag)
                .or_else(|| self.lookup(&root_flag))
            {
                return result;
            }
        }

        self.lookup("*").unwrap_or(PermissionResult::Fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<OrderedEntries<PermissionResult>> for PermissionKeyOverride {
    type Error = String;

    fn try_from(value: OrderedEntries<PermissionResult>) -> Result<Self, Self::Error> {
        Self::new(value.0)
    }
}

impl Serialize for PermissionKeyOverride {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Resolve a permission key for a user across their roles
///
/// Roles are consulted highest priority first; the first role with an opinion
/// decides.
pub fn check_permission(
    manager: &PlayerRoleManager,
    keys: &OverrideType<PermissionKeyOverride>,
    user: u64,
    permission: &str,
) -> PermissionResult {
    manager
        .roles_of(user)
        .iter()
        .filter_map(|role| role.get(keys))
        .map(|entries| entries.test(permission))
        .find(|result| result.is_definitive())
        .unwrap_or(PermissionResult::Fallback)
}
