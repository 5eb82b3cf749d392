//! Config path resolution
//!
//! Config files live next to the host binary unless overridden through the
//! environment.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the roles config location
pub const CONFIG_PATH_ENV: &str = "PLAYER_ROLES_CONFIG";

/// Returns the directory containing the running binary.
pub fn base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    exe.parent()
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `<bin dir>/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(base_dir()?.join("configs"))
}

/// Returns the roles config path.
///
/// Path: `<bin dir>/configs/player_roles/roles.toml`, or the value of
/// `PLAYER_ROLES_CONFIG` when set.
pub fn roles_config_path() -> ConfigResult<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(configs_dir()?.join("player_roles").join("roles.toml"))
}
