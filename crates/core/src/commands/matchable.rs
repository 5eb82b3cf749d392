//! Compiled command tree snapshot
//!
//! Command permissions are only evaluated against paths that existed when the
//! tree was last compiled. The snapshot is replaced whole on every rebuild and
//! cleared while a rebuild is in progress.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use player_roles_sdk::{CommandPath, CommandTree};

/// Immutable set of command paths
#[derive(Debug, Default)]
pub struct MatchableCommand {
    paths: HashSet<CommandPath>,
}

impl MatchableCommand {
    /// Snapshot with no paths; nothing is matchable
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile from a listing of paths
    pub fn compile<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = CommandPath>,
    {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Compile from every node of a host tree
    pub fn from_tree<S, T>(tree: &T) -> Self
    where
        T: CommandTree<S> + ?Sized,
    {
        Self::compile(tree.list_all_nodes().into_iter().map(|node| node.path))
    }

    pub fn contains(&self, path: &CommandPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Current compiled snapshot
///
/// The single indirection through which evaluations see the tree.
#[derive(Debug, Default)]
pub struct CommandSnapshot {
    current: RwLock<Arc<MatchableCommand>>,
    generation: AtomicU64,
}

impl CommandSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current snapshot
    pub fn load(&self) -> Arc<MatchableCommand> {
        Arc::clone(&self.current.read())
    }

    /// Install a freshly compiled snapshot
    pub fn replace(&self, command: MatchableCommand) {
        *self.current.write() = Arc::new(command);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Install an empty snapshot ahead of a rebuild
    pub fn invalidate(&self) {
        self.replace(MatchableCommand::empty());
    }

    /// Number of snapshots installed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use player_roles_dispatch::CommandDispatcher;
    use player_roles_sdk::CommandSource;

    use super::*;

    struct Console;

    impl CommandSource for Console {
        fn user_id(&self) -> Option<u64> {
            None
        }

        fn send_feedback(&self, _message: &str) {}
    }

    #[test]
    fn test_compile_from_tree() {
        let mut dispatcher = CommandDispatcher::<Console>::new();
        let root = dispatcher.root();
        let gamemode = dispatcher.literal(root, "gamemode");
        dispatcher.literal(gamemode, "creative");
        dispatcher.argument(gamemode, "mode");

        let command = MatchableCommand::from_tree(&dispatcher);

        assert_eq!(command.len(), 3);
        assert!(command.contains(&CommandPath::literals(&["gamemode"])));
        assert!(command.contains(&CommandPath::literals(&["gamemode", "creative"])));
        assert!(!command.contains(&CommandPath::literals(&["gamemode", "mode"])));
    }

    #[test]
    fn test_snapshot_replace_and_invalidate() {
        let snapshot = CommandSnapshot::new();
        assert!(snapshot.load().is_empty());
        assert_eq!(snapshot.generation(), 0);

        snapshot.replace(MatchableCommand::compile(vec![CommandPath::literals(&["stop"])]));
        let held = snapshot.load();
        assert!(held.contains(&CommandPath::literals(&["stop"])));
        assert_eq!(snapshot.generation(), 1);

        snapshot.invalidate();
        assert!(snapshot.load().is_empty());
        assert_eq!(snapshot.generation(), 2);
        // Old handle unaffected
        assert!(held.contains(&CommandPath::literals(&["stop"])));
    }
}
