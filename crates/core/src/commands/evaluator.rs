//! Command permission evaluator

use std::sync::Arc;

use player_roles_sdk::{CommandPath, CommandSource};

use super::matchable::CommandSnapshot;
use super::pattern::CommandPermissionOverride;
use crate::manager::PlayerRoleManager;
use crate::overrides::OverrideType;
use crate::permission::PermissionResult;

/// Decides command paths for users from their roles
pub struct CommandPermissionEvaluator {
    manager: Arc<PlayerRoleManager>,
    commands: OverrideType<CommandPermissionOverride>,
    snapshot: Arc<CommandSnapshot>,
}

impl CommandPermissionEvaluator {
    pub fn new(
        manager: Arc<PlayerRoleManager>,
        commands: OverrideType<CommandPermissionOverride>,
        snapshot: Arc<CommandSnapshot>,
    ) -> Self {
        Self {
            manager,
            commands,
            snapshot,
        }
    }

    /// Decide whether `user` may use the command at `path`
    ///
    /// Roles are consulted highest priority first and the first role with an
    /// opinion decides. Paths missing from the current snapshot are never
    /// decided.
    pub fn can_use_command(&self, user: u64, path: &CommandPath) -> PermissionResult {
        if !self.snapshot.load().contains(path) {
            return PermissionResult::Fallback;
        }

        self.manager
            .roles_of(user)
            .iter()
            .filter_map(|role| role.get(&self.commands))
            .map(|rules| rules.test(path))
            .find(|result| result.is_definitive())
            .unwrap_or(PermissionResult::Fallback)
    }

    /// Decide for a command source
    ///
    /// Sources that do not act for a user always fall back.
    pub fn can_source_use<S: CommandSource + ?Sized>(
        &self,
        source: &S,
        path: &CommandPath,
    ) -> PermissionResult {
        match source.user_id() {
            Some(user) => self.can_use_command(user, path),
            None => PermissionResult::Fallback,
        }
    }

    pub fn snapshot(&self) -> &Arc<CommandSnapshot> {
        &self.snapshot
    }

    pub fn manager(&self) -> &Arc<PlayerRoleManager> {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::MatchableCommand;
    use crate::overrides::OverrideRegistry;
    use crate::roles::RoleDefinition;

    fn evaluator(roles: Vec<(&str, RoleDefinition)>) -> CommandPermissionEvaluator {
        let registry = Arc::new(OverrideRegistry::new());
        let commands = registry
            .register::<CommandPermissionOverride>("commands")
            .unwrap();
        let manager = Arc::new(PlayerRoleManager::new(registry));
        manager
            .store()
            .load(roles.into_iter().map(|(k, v)| (k.to_string(), v)))
            .unwrap();

        let snapshot = Arc::new(CommandSnapshot::new());
        snapshot.replace(MatchableCommand::compile(vec![
            CommandPath::literals(&["foo"]),
            CommandPath::literals(&["foo", "bar"]),
            CommandPath::literals(&["stop"]),
        ]));

        CommandPermissionEvaluator::new(manager, commands, snapshot)
    }

    #[test]
    fn test_higher_priority_role_decides() {
        let eval = evaluator(vec![
            (
                "high",
                RoleDefinition::new(10).with("commands", json!({ "foo.bar": "deny" })),
            ),
            (
                "low",
                RoleDefinition::new(1).with("commands", json!({ "foo.*": "allow" })),
            ),
        ]);
        eval.manager().assign(1, &["high", "low"]).unwrap();

        let path = CommandPath::literals(&["foo", "bar"]);
        assert_eq!(eval.can_use_command(1, &path), PermissionResult::Deny);

        // Lower role is consulted when the higher one has no opinion
        eval.manager().unassign(1, "high").unwrap();
        assert_eq!(eval.can_use_command(1, &path), PermissionResult::Allow);
    }

    #[test]
    fn test_falls_through_roles_without_match() {
        let eval = evaluator(vec![
            (
                "high",
                RoleDefinition::new(10).with("commands", json!({ "stop": "deny" })),
            ),
            ("middle", RoleDefinition::new(5)),
            (
                "low",
                RoleDefinition::new(1).with("commands", json!({ "foo": "hidden" })),
            ),
        ]);
        eval.manager().assign(2, &["high", "middle", "low"]).unwrap();

        assert_eq!(
            eval.can_use_command(2, &CommandPath::literals(&["foo"])),
            PermissionResult::Hidden
        );
        assert_eq!(
            eval.can_use_command(2, &CommandPath::literals(&["foo", "bar"])),
            PermissionResult::Fallback
        );
    }

    #[test]
    fn test_unknown_path_falls_back() {
        let eval = evaluator(vec![(
            "all",
            RoleDefinition::new(1).with("commands", json!({ "*": "allow" })),
        )]);
        eval.manager().assign(3, &["all"]).unwrap();

        assert_eq!(
            eval.can_use_command(3, &CommandPath::literals(&["stop"])),
            PermissionResult::Allow
        );
        assert_eq!(
            eval.can_use_command(3, &CommandPath::literals(&["unknown"])),
            PermissionResult::Fallback
        );

        eval.snapshot().invalidate();
        assert_eq!(
            eval.can_use_command(3, &CommandPath::literals(&["stop"])),
            PermissionResult::Fallback
        );
    }

    #[test]
    fn test_deterministic() {
        let eval = evaluator(vec![(
            "r",
            RoleDefinition::new(1).with("commands", json!({ "foo.*": "deny", "foo": "allow" })),
        )]);
        eval.manager().assign(4, &["r"]).unwrap();

        let path = CommandPath::literals(&["foo", "bar"]);
        let first = eval.can_use_command(4, &path);
        for _ in 0..10 {
            assert_eq!(eval.can_use_command(4, &path), first);
        }
        assert_eq!(first, PermissionResult::Deny);
    }
}
