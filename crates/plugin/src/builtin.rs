//! Built-in override types

use std::sync::Arc;

use player_roles_core::overrides::{
    ChatFormat, NameStyle, OverrideRegistry, OverrideType, PermissionKeyOverride,
    PermissionLevel, RegistryError,
};
use player_roles_core::CommandPermissionOverride;

use crate::host::RolesHost;

/// Handles for every built-in override type
#[derive(Debug, Clone)]
pub struct BuiltinOverrides {
    pub commands: OverrideType<CommandPermissionOverride>,
    pub chat_format: OverrideType<ChatFormat>,
    pub name_style: OverrideType<NameStyle>,
    pub command_feedback: OverrideType<bool>,
    pub mute: OverrideType<bool>,
    pub permission_level: OverrideType<PermissionLevel>,
    pub permission_keys: OverrideType<PermissionKeyOverride>,
}

impl BuiltinOverrides {
    pub const COMMANDS: &'static str = "commands";
    pub const CHAT_FORMAT: &'static str = "chat_format";
    pub const NAME_STYLE: &'static str = "name_style";
    pub const COMMAND_FEEDBACK: &'static str = "command_feedback";
    pub const MUTE: &'static str = "mute";
    pub const PERMISSION_LEVEL: &'static str = "permission_level";
    pub const PERMISSION_KEYS: &'static str = "permission_keys";

    /// Register every built-in type
    ///
    /// Changes to `commands` or `permission_level` make the host resend the
    /// user's command tree.
    pub fn register(
        registry: &OverrideRegistry,
        host: &Arc<dyn RolesHost>,
    ) -> Result<Self, RegistryError> {
        let resend = |host: &Arc<dyn RolesHost>| {
            let host = Arc::clone(host);
            move |user: u64| host.resend_command_tree(user)
        };

        Ok(Self {
            commands: registry.register_with_listener(Self::COMMANDS, resend(host))?,
            chat_format: registry.register(Self::CHAT_FORMAT)?,
            name_style: registry.register(Self::NAME_STYLE)?,
            command_feedback: registry.register(Self::COMMAND_FEEDBACK)?,
            mute: registry.register(Self::MUTE)?,
            permission_level: registry
                .register_with_listener(Self::PERMISSION_LEVEL, resend(host))?,
            permission_keys: registry.register(Self::PERMISSION_KEYS)?,
        })
    }
}
