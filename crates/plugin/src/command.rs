//! The `/role` command
//!
//! ```text
//! role assign <target> <role>
//! role remove <target> <role>
//! role list <target>
//! role reload
//! ```

use std::sync::Arc;

use player_roles_dispatch::{CommandContext, CommandDispatcher, CommandResult};
use player_roles_sdk::{CommandSource, Requirement};

use crate::roles::PlayerRoles;

/// Permission level required to use `/role`
pub const ROLE_COMMAND_LEVEL: u8 = 2;

/// Permission level that may manage any role
const ADMIN_LEVEL: u8 = 4;

/// Register `/role` into a dispatcher
pub fn register_role_command<S>(roles: &Arc<PlayerRoles>, dispatcher: &mut CommandDispatcher<S>)
where
    S: CommandSource + 'static,
{
    let root = dispatcher.root();
    let role = dispatcher.literal(root, "role");
    let gate = Arc::clone(roles);
    dispatcher.requires(
        role,
        Requirement::from_fn(move |source: &S| gate.permission_level(source) >= ROLE_COMMAND_LEVEL),
    );

    let assign = dispatcher.literal(role, "assign");
    let target = dispatcher.argument(assign, "target");
    let node = dispatcher.argument(target, "role");
    let r = Arc::clone(roles);
    dispatcher.executes(node, move |ctx| assign_role(&r, ctx));

    let remove = dispatcher.literal(role, "remove");
    let target = dispatcher.argument(remove, "target");
    let node = dispatcher.argument(target, "role");
    let r = Arc::clone(roles);
    dispatcher.executes(node, move |ctx| remove_role(&r, ctx));

    let list = dispatcher.literal(role, "list");
    let node = dispatcher.argument(list, "target");
    let r = Arc::clone(roles);
    dispatcher.executes(node, move |ctx| list_roles(&r, ctx));

    let node = dispatcher.literal(role, "reload");
    let r = Arc::clone(roles);
    dispatcher.executes(node, move |ctx| reload_roles(&r, ctx));

    tracing::debug!("Registered role command");
}

/// Check whether `source` may assign or remove `role_id`
///
/// The console and level 4 sources may manage any role. Others may only
/// manage roles below their own highest role.
fn can_manage<S: CommandSource>(roles: &PlayerRoles, source: &S, role_id: &str) -> bool {
    let Some(user) = source.user_id() else {
        return true;
    };
    if roles.permission_level(source) >= ADMIN_LEVEL {
        return true;
    }

    let Some(target) = roles.manager().store().get(role_id) else {
        // Unknown roles are reported by the manager
        return true;
    };
    roles
        .manager()
        .roles_of(user)
        .first()
        .is_some_and(|highest| target.priority() < highest.priority())
}

/// Resolve the `<target>` and `<role>` arguments
fn target_and_role<'c, S: CommandSource>(
    roles: &PlayerRoles,
    ctx: &'c CommandContext<'_, S>,
) -> Option<(u64, &'c str, &'c str)> {
    let (Some(name), Some(role_id)) = (ctx.arg("target"), ctx.arg("role")) else {
        ctx.reply("Usage: role <assign|remove> <target> <role>");
        return None;
    };
    let Some(user) = roles.host().find_user(name) else {
        ctx.reply_fmt(format_args!("Player '{}' not found", name));
        return None;
    };
    if !can_manage(roles, ctx.source(), role_id) {
        ctx.reply_fmt(format_args!(
            "You do not have permission to manage role '{}'",
            role_id
        ));
        return None;
    }
    Some((user, name, role_id))
}

fn assign_role<S: CommandSource>(roles: &PlayerRoles, ctx: &CommandContext<'_, S>) -> CommandResult {
    let Some((user, name, role_id)) = target_and_role(roles, ctx) else {
        return CommandResult::Failed;
    };

    match roles.manager().assign(user, &[role_id]) {
        Ok(0) => {
            ctx.reply_fmt(format_args!("'{}' already has role '{}'", name, role_id));
            CommandResult::Failed
        }
        Ok(_) => {
            tracing::info!("{} assigned role '{}' to {}", ctx.source().display_name(), role_id, name);
            ctx.reply_fmt(format_args!("Assigned role '{}' to '{}'", role_id, name));
            CommandResult::Handled
        }
        Err(e) => {
            ctx.reply(&e.to_string());
            CommandResult::Failed
        }
    }
}

fn remove_role<S: CommandSource>(roles: &PlayerRoles, ctx: &CommandContext<'_, S>) -> CommandResult {
    let Some((user, name, role_id)) = target_and_role(roles, ctx) else {
        return CommandResult::Failed;
    };

    match roles.manager().unassign(user, role_id) {
        Ok(true) => {
            tracing::info!("{} removed role '{}' from {}", ctx.source().display_name(), role_id, name);
            ctx.reply_fmt(format_args!("Removed role '{}' from '{}'", role_id, name));
            CommandResult::Handled
        }
        Ok(false) => {
            ctx.reply_fmt(format_args!("'{}' does not have role '{}'", name, role_id));
            CommandResult::Failed
        }
        Err(e) => {
            ctx.reply(&e.to_string());
            CommandResult::Failed
        }
    }
}

fn list_roles<S: CommandSource>(roles: &PlayerRoles, ctx: &CommandContext<'_, S>) -> CommandResult {
    let Some(name) = ctx.arg("target") else {
        ctx.reply("Usage: role list <target>");
        return CommandResult::Failed;
    };
    let Some(user) = roles.host().find_user(name) else {
        ctx.reply_fmt(format_args!("Player '{}' not found", name));
        return CommandResult::Failed;
    };

    let held: Vec<String> = roles
        .manager()
        .roles_of(user)
        .iter()
        .map(|role| format!("{} ({})", role.id(), role.priority()))
        .collect();

    if held.is_empty() {
        ctx.reply_fmt(format_args!("'{}' has no roles", name));
    } else {
        ctx.reply_fmt(format_args!("Roles of '{}': {}", name, held.join(", ")));
    }
    CommandResult::Handled
}

fn reload_roles<S: CommandSource>(roles: &PlayerRoles, ctx: &CommandContext<'_, S>) -> CommandResult {
    match roles.reload() {
        Ok(0) => {
            ctx.reply("Reloaded roles config");
            CommandResult::Handled
        }
        Ok(errors) => {
            ctx.reply_fmt(format_args!(
                "Reloaded roles config with {} errors, see the server log",
                errors
            ));
            CommandResult::Handled
        }
        Err(e) => {
            tracing::error!("Failed to reload roles config: {}", e);
            ctx.reply_fmt(format_args!("Failed to reload roles config: {}", e));
            CommandResult::Failed
        }
    }
}
