//! Role system instance
//!
//! Ties the registry, role manager, evaluator and tree hooks to one host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use player_roles_core::commands::{
    CommandPermissionEvaluator, CommandRequirementHooks, CommandSnapshot, HookError,
};
use player_roles_core::config::{roles_config_path, ConfigError, RolesConfig};
use player_roles_core::overrides::{check_permission, NameStyle, OverrideRegistry, RegistryError};
use player_roles_core::{PermissionResult, PlayerRoleManager, RoleError};
use player_roles_sdk::{CommandSource, CommandTree};

use crate::builtin::BuiltinOverrides;
use crate::host::RolesHost;
use crate::logging::init_logging;

/// Sent to a muted user who tries to chat
pub const MUTED_MESSAGE: &str = "You are muted!";

/// Plugin errors
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to register override types: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to load roles config: {0}")]
    Config(#[from] ConfigError),
}

/// A running role system
pub struct PlayerRoles {
    host: Arc<dyn RolesHost>,
    overrides: BuiltinOverrides,
    manager: Arc<PlayerRoleManager>,
    hooks: CommandRequirementHooks,
    config_path: PathBuf,
}

impl PlayerRoles {
    /// Create a role system with no roles loaded
    ///
    /// Registers the built-in override types and freezes the registry.
    pub fn new(host: Arc<dyn RolesHost>, config_path: PathBuf) -> Result<Self, PluginError> {
        let registry = Arc::new(OverrideRegistry::new());
        let overrides = BuiltinOverrides::register(&registry, &host)?;
        registry.freeze();

        let manager = Arc::new(PlayerRoleManager::new(registry));
        let evaluator = CommandPermissionEvaluator::new(
            Arc::clone(&manager),
            overrides.commands.clone(),
            Arc::new(CommandSnapshot::new()),
        );

        Ok(Self {
            host,
            overrides,
            manager,
            hooks: CommandRequirementHooks::new(Arc::new(evaluator)),
            config_path,
        })
    }

    /// Create a role system using the default config location
    pub fn with_default_config(host: Arc<dyn RolesHost>) -> Result<Self, PluginError> {
        Self::new(host, roles_config_path()?)
    }

    pub fn host(&self) -> &Arc<dyn RolesHost> {
        &self.host
    }

    pub fn overrides(&self) -> &BuiltinOverrides {
        &self.overrides
    }

    pub fn manager(&self) -> &Arc<PlayerRoleManager> {
        &self.manager
    }

    pub fn evaluator(&self) -> &Arc<CommandPermissionEvaluator> {
        self.hooks.evaluator()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    // ============================================================================
    // Configuration
    // ============================================================================

    /// Read the config file, creating it if missing
    ///
    /// Nothing is applied; see [`start`](Self::start).
    pub fn read_config(&self) -> Result<RolesConfig, PluginError> {
        Ok(RolesConfig::load_or_create(&self.config_path)?)
    }

    /// Read the config, install logging at its level, then apply it
    ///
    /// Role errors are reported through the subscriber installed here.
    ///
    /// # Returns
    /// The number of role errors
    pub fn start(&self) -> Result<usize, PluginError> {
        let config = self.read_config()?;
        init_logging(config.debug);
        Ok(self.apply_config(&config))
    }

    /// Re-read the config file and apply it
    ///
    /// # Returns
    /// The number of role errors
    pub fn reload(&self) -> Result<usize, PluginError> {
        let config = RolesConfig::load_from(&self.config_path)?;
        Ok(self.apply_config(&config))
    }

    /// Apply role definitions
    ///
    /// Invalid roles are skipped and logged; the rest take effect.
    ///
    /// # Returns
    /// The number of role errors
    pub fn apply_config(&self, config: &RolesConfig) -> usize {
        let online = self.host.online_users();
        match self.manager.reload(config.definitions(), &online) {
            Ok(()) => {
                tracing::info!("Loaded {} roles", self.manager.store().snapshot().len());
                0
            }
            Err(errors) => {
                log_errors(&errors);
                errors.len()
            }
        }
    }

    // ============================================================================
    // Tree lifecycle
    // ============================================================================

    /// The host tree has been built for the first time
    pub fn tree_ready<S, T>(&self, tree: &mut T) -> Result<usize, HookError>
    where
        S: CommandSource + 'static,
        T: CommandTree<S> + ?Sized,
    {
        self.hooks.hook_all(tree)
    }

    /// The host is about to rebuild its tree
    pub fn tree_rebuilding(&self) {
        self.hooks.invalidate();
    }

    /// The host has rebuilt its tree
    pub fn tree_rebuilt<S, T>(&self, tree: &mut T) -> Result<usize, HookError>
    where
        S: CommandSource + 'static,
        T: CommandTree<S> + ?Sized,
    {
        self.hooks.hook_all(tree)
    }

    // ============================================================================
    // Presentation
    // ============================================================================

    pub fn is_muted(&self, user: u64) -> bool {
        self.manager
            .resolve(user, &self.overrides.mute)
            .is_some_and(|muted| *muted)
    }

    /// Check whether a user may send a chat message
    ///
    /// Muted users are told so.
    pub fn can_chat(&self, user: u64) -> bool {
        if self.is_muted(user) {
            self.host.send_message(user, MUTED_MESSAGE);
            return false;
        }
        true
    }

    /// Whether a user receives feedback for commands run by others
    pub fn command_feedback(&self, user: u64) -> bool {
        self.manager
            .resolve(user, &self.overrides.command_feedback)
            .is_some_and(|enabled| *enabled)
    }

    /// Render a chat line for a user
    ///
    /// Without a `chat_format` role override the line is `<name> message`.
    pub fn format_chat(&self, user: u64, name: &str, message: &str) -> String {
        match self.manager.resolve(user, &self.overrides.chat_format) {
            Some(format) => format.format(name, message),
            None => format!("<{}> {}", name, message),
        }
    }

    pub fn name_style(&self, user: u64) -> Option<Arc<NameStyle>> {
        self.manager.resolve(user, &self.overrides.name_style)
    }

    /// Effective permission level of a source
    ///
    /// A `permission_level` role override replaces the host's level.
    pub fn permission_level<S: CommandSource + ?Sized>(&self, source: &S) -> u8 {
        source
            .user_id()
            .and_then(|user| self.manager.resolve(user, &self.overrides.permission_level))
            .map(|level| level.get())
            .unwrap_or_else(|| source.permission_level())
    }

    /// Decide a permission key for a user
    pub fn check_permission(&self, user: u64, permission: &str) -> PermissionResult {
        check_permission(
            &self.manager,
            &self.overrides.permission_keys,
            user,
            permission,
        )
    }

    /// Check a permission key, using `default` when no role decides
    pub fn has_permission(&self, user: u64, permission: &str, default: bool) -> bool {
        match self.check_permission(user, permission) {
            PermissionResult::Allow => true,
            PermissionResult::Deny => false,
            _ => default,
        }
    }
}

fn log_errors(errors: &[RoleError]) {
    tracing::warn!("Failed to load player-roles config! ({} errors)", errors.len());
    for error in errors {
        tracing::warn!(" - {}", error);
    }
}

#[cfg(test)]
mod tests {
    use player_roles_core::EVERYONE;
    use player_roles_dispatch::{CommandDispatcher, CommandResult};
    use player_roles_sdk::{CommandPath, Requirement};

    use super::*;
    use crate::testing::{LogCapture, MockHost, Player};

    const ROLES: &str = r#"
[roles.admin]
priority = 100

[roles.admin.overrides]
permission_level = 4
chat_format = "[Admin] {name}: {message}"
command_feedback = true

[roles.admin.overrides.commands]
"*" = "allow"

[roles.admin.overrides.permission_keys]
"@css/*" = "allow"

[roles.muted]
priority = 50

[roles.muted.overrides]
mute = true
name_style = { color = "gray", styles = ["italic"] }
"#;

    fn setup(host: MockHost) -> (Arc<MockHost>, PlayerRoles) {
        let host = Arc::new(host);
        let roles = PlayerRoles::new(host.clone(), PathBuf::from("unused.toml")).unwrap();
        let config = RolesConfig::from_toml_str(ROLES).unwrap();
        assert_eq!(roles.apply_config(&config), 0);
        (host, roles)
    }

    fn tree() -> CommandDispatcher<Player> {
        let mut tree = CommandDispatcher::new();
        let stop = tree.register_command("stop", |_| CommandResult::Handled);
        tree.requires(stop, Requirement::from_fn(|p: &Player| p.permission_level() >= 4));
        tree.register_command("help", |_| CommandResult::Handled);
        tree
    }

    #[test]
    fn test_registry_frozen_with_builtins() {
        let (_, roles) = setup(MockHost::default());
        let registry = roles.manager().registry();

        assert!(registry.is_frozen());
        for id in [
            BuiltinOverrides::COMMANDS,
            BuiltinOverrides::CHAT_FORMAT,
            BuiltinOverrides::NAME_STYLE,
            BuiltinOverrides::COMMAND_FEEDBACK,
            BuiltinOverrides::MUTE,
            BuiltinOverrides::PERMISSION_LEVEL,
            BuiltinOverrides::PERMISSION_KEYS,
        ] {
            assert!(registry.lookup(id).is_some(), "{} not registered", id);
        }
    }

    #[test]
    fn test_admin_and_muted_scenario() {
        let (_, roles) = setup(MockHost::default());
        roles.manager().assign(1, &["admin", "muted"]).unwrap();

        let mut tree = tree();
        assert_eq!(roles.tree_ready(&mut tree).unwrap(), 2);

        assert!(roles.is_muted(1));
        for name in ["stop", "help"] {
            assert_eq!(
                roles.evaluator().can_use_command(1, &CommandPath::literals(&[name])),
                PermissionResult::Allow
            );
        }
        assert_eq!(tree.execute(&Player::user(1, 0), "stop"), Ok(CommandResult::Handled));
    }

    #[test]
    fn test_values_resolve_unchanged() {
        let (_, roles) = setup(MockHost::default());
        roles.manager().assign(2, &["admin"]).unwrap();
        let overrides = roles.overrides();

        let level = roles.manager().resolve(2, &overrides.permission_level).unwrap();
        assert_eq!(level.get(), 4);
        let commands = roles.manager().resolve(2, &overrides.commands).unwrap();
        assert_eq!(commands.len(), 1);
        assert!(roles.manager().resolve(2, &overrides.mute).is_none());

        roles.manager().set_roles(2, &["muted"]).unwrap();
        assert_eq!(roles.manager().resolve(2, &overrides.mute).as_deref(), Some(&true));
    }

    #[test]
    fn test_command_changes_resend_tree() {
        let (host, roles) = setup(MockHost::default());

        roles.manager().assign(3, &["admin"]).unwrap();
        // commands and permission_level both changed; one resend each
        assert_eq!(*host.resent.lock(), vec![3, 3]);

        host.resent.lock().clear();
        roles.manager().assign(3, &["muted"]).unwrap();
        assert!(host.resent.lock().is_empty());
    }

    #[test]
    fn test_presentation_helpers() {
        let (host, roles) = setup(MockHost::default());
        roles.manager().assign(4, &["admin"]).unwrap();

        assert_eq!(roles.format_chat(4, "Ann", "hi"), "[Admin] Ann: hi");
        assert_eq!(roles.format_chat(5, "Bob", "hi"), "<Bob> hi");
        assert!(roles.command_feedback(4));
        assert!(!roles.command_feedback(5));

        assert_eq!(roles.permission_level(&Player::user(4, 0)), 4);
        assert_eq!(roles.permission_level(&Player::user(5, 2)), 2);

        assert_eq!(roles.check_permission(4, "@css/ban"), PermissionResult::Allow);
        assert!(roles.has_permission(4, "@css/kick", false));
        assert!(!roles.has_permission(5, "@css/kick", false));

        roles.manager().assign(5, &["muted"]).unwrap();
        assert!(!roles.can_chat(5));
        assert!(roles.can_chat(4));
        assert_eq!(*host.messages.lock(), vec![(5, MUTED_MESSAGE.to_string())]);

        let style = roles.name_style(5).unwrap();
        assert_eq!(style.color(), Some("gray"));
    }

    #[test]
    fn test_invalid_roles_counted() {
        let (_, roles) = setup(MockHost::default());
        let config = RolesConfig::from_toml_str(
            r#"
[roles.broken.overrides]
permission_level = 12
unknown_thing = 1

[roles.fine]
priority = 1
"#,
        )
        .unwrap();

        assert_eq!(roles.apply_config(&config), 2);
        assert!(roles.manager().store().get("fine").is_some());
        assert!(roles.manager().store().get("broken").is_none());
        assert!(roles.manager().store().get("admin").is_none());
    }

    #[test]
    fn test_load_and_reload_file() {
        let dir = std::env::temp_dir().join(format!("player_roles_plugin_{}", std::process::id()));
        let path = dir.join("roles.toml");
        let _ = std::fs::remove_dir_all(&dir);

        let roles = PlayerRoles::new(Arc::new(MockHost::default()), path.clone()).unwrap();
        let config = roles.read_config().unwrap();
        assert!(config.roles.contains_key(EVERYONE));
        assert!(path.exists());
        assert!(!roles.manager().has_role(9, EVERYONE));

        assert_eq!(roles.start().unwrap(), 0);
        assert!(roles.manager().has_role(9, EVERYONE));

        std::fs::write(&path, ROLES).unwrap();
        assert_eq!(roles.reload().unwrap(), 0);
        assert!(roles.manager().store().get("admin").is_some());
        assert!(!roles.manager().has_role(9, EVERYONE));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_start_reports_errors_after_logging_init() {
        let dir = std::env::temp_dir().join(format!("player_roles_start_{}", std::process::id()));
        let path = dir.join("roles.toml");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            &path,
            "[roles.broken.overrides]\npermission_level = 12\n\n[roles.fine]\npriority = 1\n",
        )
        .unwrap();

        let roles = PlayerRoles::new(Arc::new(MockHost::default()), path).unwrap();
        let capture = LogCapture::default();
        let errors =
            tracing::subscriber::with_default(capture.subscriber(), || roles.start().unwrap());

        assert_eq!(errors, 1);
        let logs = capture.contents();
        assert!(logs.contains("Failed to load player-roles config! (1 errors)"), "{}", logs);
        assert!(logs.contains(" - "), "{}", logs);
        assert!(roles.manager().store().get("fine").is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rebuild_cycle() {
        let (_, roles) = setup(MockHost::default());
        roles.manager().assign(6, &["admin"]).unwrap();
        let mut tree = tree();
        roles.tree_ready(&mut tree).unwrap();

        roles.tree_rebuilding();
        let help = CommandPath::literals(&["help"]);
        assert_eq!(roles.evaluator().can_use_command(6, &help), PermissionResult::Fallback);

        tree.register_command("extra", |_| CommandResult::Handled);
        assert_eq!(roles.tree_rebuilt(&mut tree).unwrap(), 3);
        assert_eq!(roles.evaluator().can_use_command(6, &help), PermissionResult::Allow);
    }
}
