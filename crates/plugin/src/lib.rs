//! Player Roles - Initializer
//!
//! Wires the role engine to a host: registers the built-in override types,
//! loads the roles config, applies command requirement hooks on every tree
//! build and provides the `/role` command.
//!
//! # Host integration
//!
//! ```ignore
//! let roles = player_roles::init(host)?;
//!
//! // Register our command before the tree is first built
//! player_roles::register_role_command(&roles, &mut dispatcher);
//!
//! // Tree lifecycle
//! player_roles::on_tree_ready(&mut dispatcher);
//! player_roles::on_tree_rebuilding();
//! player_roles::on_tree_rebuilt(&mut dispatcher);
//! ```

mod builtin;
mod command;
mod host;
mod logging;
mod roles;

#[cfg(test)]
mod testing;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use player_roles_sdk::{CommandSource, CommandTree};

pub use builtin::BuiltinOverrides;
pub use command::{register_role_command, ROLE_COMMAND_LEVEL};
pub use host::RolesHost;
pub use logging::init_logging;
pub use roles::{PlayerRoles, PluginError, MUTED_MESSAGE};

// Re-export the engine crates
pub use player_roles_core as core;
pub use player_roles_dispatch as dispatch;
pub use player_roles_sdk as sdk;

/// The process-wide role system
static INSTANCE: OnceLock<Arc<PlayerRoles>> = OnceLock::new();

/// Initialize the role system
///
/// Loads the roles config from its default location, creating it if missing.
/// Invalid roles are logged and skipped. Calling this again returns the
/// existing instance.
pub fn init(host: Arc<dyn RolesHost>) -> Result<Arc<PlayerRoles>, PluginError> {
    if let Some(existing) = INSTANCE.get() {
        tracing::warn!("Player roles already initialized");
        return Ok(Arc::clone(existing));
    }

    let roles = PlayerRoles::with_default_config(host)?;
    roles.start()?;
    tracing::info!("Player roles loaded from {:?}", roles.config_path());

    Ok(Arc::clone(INSTANCE.get_or_init(|| Arc::new(roles))))
}

/// Get the role system, if initialized
pub fn instance() -> Option<Arc<PlayerRoles>> {
    INSTANCE.get().cloned()
}

/// Run `f` against the instance, isolating panics from the host
fn with_instance<F>(event: &str, f: F)
where
    F: FnOnce(&PlayerRoles),
{
    let Some(roles) = INSTANCE.get() else {
        tracing::debug!("Ignoring {}: player roles not initialized", event);
        return;
    };

    if catch_unwind(AssertUnwindSafe(|| f(roles))).is_err() {
        tracing::error!("Panic while handling {}", event);
    }
}

/// The host finished building its command tree
pub fn on_tree_ready<S, T>(tree: &mut T)
where
    S: CommandSource + 'static,
    T: CommandTree<S> + ?Sized,
{
    with_instance("tree ready", |roles| {
        if let Err(e) = roles.tree_ready(tree) {
            tracing::debug!("Tree left unhooked: {}", e);
        }
    });
}

/// The host is about to rebuild its command tree
pub fn on_tree_rebuilding() {
    with_instance("tree rebuilding", |roles| roles.tree_rebuilding());
}

/// The host rebuilt its command tree
pub fn on_tree_rebuilt<S, T>(tree: &mut T)
where
    S: CommandSource + 'static,
    T: CommandTree<S> + ?Sized,
{
    with_instance("tree rebuilt", |roles| {
        if let Err(e) = roles.tree_rebuilt(tree) {
            tracing::debug!("Rebuilt tree left unhooked: {}", e);
        }
    });
}
