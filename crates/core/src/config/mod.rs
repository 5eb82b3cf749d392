//! Roles configuration
//!
//! Role definitions are read from a TOML file (or JSON, by extension). A
//! missing file is created with a default `everyone` role.
//!
//! # Example
//!
//! ```toml
//! version = 1
//! debug = false
//!
//! [roles.everyone]
//! priority = 0
//!
//! [roles.everyone.overrides.commands]
//! "stop" = "hidden"
//!
//! [roles.admin]
//! priority = 100
//!
//! [roles.admin.overrides]
//! permission_level = 4
//! name_style = { color = "red", styles = ["bold"] }
//!
//! [roles.admin.overrides.commands]
//! "*" = "allow"
//! ```

mod loader;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::roles::{RoleDefinition, EVERYONE};

pub use loader::{base_dir, configs_dir, roles_config_path, CONFIG_PATH_ENV};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse or write JSON content
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine config directory from the binary location
    #[error("Config directory not available - could not resolve binary path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Contents of the roles config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Role definitions by identifier
    pub roles: BTreeMap<String, RoleDefinition>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        let mut roles = BTreeMap::new();
        roles.insert(EVERYONE.to_string(), RoleDefinition::new(0));
        Self {
            version: 1,
            debug: false,
            roles,
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl RolesConfig {
    /// Load from `path`, writing a default config there if it doesn't exist
    pub fn load_or_create(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!("Created default roles config at {:?}", path);
            Ok(default)
        }
    }

    /// Load from `path`
    ///
    /// `.json` files are read as JSON, everything else as TOML.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = if is_json(path) {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        tracing::debug!("Loaded roles config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save to `path`
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        tracing::debug!("Saved roles config to {:?}", path);
        Ok(())
    }

    /// Role definitions ready for loading into a store
    pub fn definitions(&self) -> Vec<(String, RoleDefinition)> {
        self.roles
            .iter()
            .map(|(id, def)| (id.clone(), def.clone()))
            .collect()
    }
}
