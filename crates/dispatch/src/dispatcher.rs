//! Command dispatcher - tree registration, dispatch and suggestions

use player_roles_sdk::{
    CommandPath, CommandSource, CommandTree, NodeEntry, NodeId, PathSegment, Requirement,
    SuggestionPass, TreeError,
};
use slotmap::SlotMap;

use super::error::DispatchError;
use super::info::{CommandCallback, CommandContext, CommandResult};

/// Kind of a dispatcher node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandNodeKind {
    Root,
    Literal,
    Argument,
}

/// Registered node information
struct CommandNode<S> {
    /// Literal keyword or argument name (empty for the root)
    name: String,
    kind: CommandNodeKind,
    parent: Option<NodeId>,
    /// Children in registration order
    children: Vec<NodeId>,
    /// Guard checked before the node can be used or suggested
    requirement: Requirement<S>,
    /// Callback run when input ends at this node
    executor: Option<CommandCallback<S>>,
    /// Whether the node refuses requirement replacement
    sealed: bool,
}

impl<S: 'static> CommandNode<S> {
    fn new(name: &str, kind: CommandNodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            children: Vec::new(),
            requirement: Requirement::always(),
            executor: None,
            sealed: false,
        }
    }

    fn segment(&self) -> Option<PathSegment> {
        match self.kind {
            CommandNodeKind::Root => None,
            CommandNodeKind::Literal => Some(PathSegment::literal(&self.name)),
            CommandNodeKind::Argument => Some(PathSegment::argument(&self.name)),
        }
    }
}

/// Tree-shaped command dispatcher
pub struct CommandDispatcher<S> {
    /// Nodes indexed by key
    nodes: SlotMap<NodeId, CommandNode<S>>,

    /// The unnamed root every top-level command hangs off
    root: NodeId,
}

impl<S: CommandSource + 'static> Default for CommandDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CommandSource + 'static> CommandDispatcher<S> {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(CommandNode::new("", CommandNodeKind::Root, None));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add (or reuse) a literal child of `parent`
    pub fn literal(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child(parent, name, CommandNodeKind::Literal)
    }

    /// Add (or reuse) an argument child of `parent`
    pub fn argument(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.child(parent, name, CommandNodeKind::Argument)
    }

    fn child(&mut self, parent: NodeId, name: &str, kind: CommandNodeKind) -> NodeId {
        // Re-registering an existing child merges into it
        if let Some(existing) = self.nodes.get(parent).and_then(|p| {
            p.children
                .iter()
                .copied()
                .find(|c| self.nodes[*c].kind == kind && self.nodes[*c].name == name)
        }) {
            return existing;
        }

        let key = self.nodes.insert(CommandNode::new(name, kind, Some(parent)));
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        tracing::debug!("Registered command node: {}", name);
        key
    }

    /// Set the requirement of a node
    ///
    /// Returns false if the node is unknown.
    pub fn requires(&mut self, node: NodeId, requirement: Requirement<S>) -> bool {
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.requirement = requirement;
                true
            }
            None => false,
        }
    }

    /// Set the executor of a node
    ///
    /// Returns false if the node is unknown.
    pub fn executes<F>(&mut self, node: NodeId, callback: F) -> bool
    where
        F: for<'a> Fn(&CommandContext<'a, S>) -> CommandResult + Send + Sync + 'static,
    {
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.executor = Some(Box::new(callback));
                true
            }
            None => false,
        }
    }

    /// Mark a node as refusing requirement replacement
    pub fn seal(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.sealed = true;
        }
    }

    /// Register a top-level command with an executor
    ///
    /// # Example
    /// ```ignore
    /// dispatcher.register_command("ping", |ctx| {
    ///     ctx.reply("Pong!");
    ///     CommandResult::Handled
    /// });
    /// ```
    pub fn register_command<F>(&mut self, name: &str, callback: F) -> NodeId
    where
        F: for<'a> Fn(&CommandContext<'a, S>) -> CommandResult + Send + Sync + 'static,
    {
        let node = self.literal(self.root, name);
        self.executes(node, callback);
        node
    }

    /// Remove a top-level command and its whole subtree
    pub fn unregister_command(&mut self, name: &str) -> bool {
        let Some(node) = self.nodes[self.root]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[*c].name == name)
        else {
            return false;
        };

        let root = self.root;
        self.nodes[root].children.retain(|c| *c != node);

        let mut stack = vec![node];
        while let Some(key) = stack.pop() {
            if let Some(removed) = self.nodes.remove(key) {
                stack.extend(removed.children);
            }
        }
        tracing::debug!("Unregistered command: {}", name);
        true
    }

    /// Find the node at `path`
    pub fn find(&self, path: &CommandPath) -> Option<NodeId> {
        let mut current = self.root;
        for segment in path.segments() {
            let kind = if segment.is_literal() {
                CommandNodeKind::Literal
            } else {
                CommandNodeKind::Argument
            };
            current = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|c| self.nodes[*c].kind == kind && self.nodes[*c].name == segment.name())?;
        }
        Some(current)
    }

    /// Get the requirement currently attached to a node
    pub fn requirement(&self, node: NodeId) -> Option<&Requirement<S>> {
        self.nodes.get(node).map(|n| &n.requirement)
    }

    /// Build the root-to-node path of a node
    pub fn path_of(&self, node: NodeId) -> Option<CommandPath> {
        let mut segments = Vec::new();
        let mut current = self.nodes.get(node)?;
        while let Some(parent) = current.parent {
            segments.extend(current.segment());
            current = self.nodes.get(parent)?;
        }
        segments.reverse();
        Some(CommandPath::new(segments))
    }

    /// Get total number of nodes (root excluded)
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Check if no commands are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether `source` passes every requirement from the root to `node`
    pub fn can_use(&self, source: &S, node: NodeId) -> bool {
        let mut current = node;
        loop {
            let Some(n) = self.nodes.get(current) else {
                return false;
            };
            if !n.requirement.test(source) {
                return false;
            }
            match n.parent {
                Some(parent) => current = parent,
                None => return true,
            }
        }
    }

    /// Find the child of `node` that `token` selects for `source`
    ///
    /// A literal matching by name always wins over argument slots, so a
    /// literal hidden by its requirement makes the token unknown.
    fn visible_child(&self, node: NodeId, token: &str, source: &S) -> Option<NodeId> {
        let children = &self.nodes[node].children;

        if let Some(literal) = children.iter().copied().find(|c| {
            let n = &self.nodes[*c];
            n.kind == CommandNodeKind::Literal && n.name.eq_ignore_ascii_case(token)
        }) {
            return self.nodes[literal]
                .requirement
                .test(source)
                .then_some(literal);
        }

        children.iter().copied().find(|c| {
            let n = &self.nodes[*c];
            n.kind == CommandNodeKind::Argument && n.requirement.test(source)
        })
    }

    /// Dispatch a command string
    ///
    /// A leading `/` is ignored. Tokens are separated by whitespace.
    pub fn execute(&self, source: &S, input: &str) -> Result<CommandResult, DispatchError> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);
        if input.is_empty() {
            return Err(DispatchError::Empty);
        }

        let mut current = self.root;
        let mut args = Vec::new();
        for token in input.split_whitespace() {
            let Some(next) = self.visible_child(current, token, source) else {
                return Err(DispatchError::UnknownCommand(input.to_string()));
            };
            let node = &self.nodes[next];
            if node.kind == CommandNodeKind::Argument {
                args.push((node.name.clone(), token.to_string()));
            }
            current = next;
        }

        let node = &self.nodes[current];
        match &node.executor {
            Some(executor) => {
                let path = self.path_of(current).unwrap_or_default();
                let context = CommandContext::new(source, args, input.to_string(), path);
                Ok(executor(&context))
            }
            None => Err(DispatchError::Incomplete(input.to_string())),
        }
    }

    /// List completions for partially typed input
    ///
    /// Runs inside a [`SuggestionPass`], so requirements can tell suggestion
    /// requests apart from execution. Literal children are suggested by name,
    /// argument slots as `<name>`.
    pub fn suggest(&self, source: &S, input: &str) -> Vec<String> {
        let _pass = SuggestionPass::enter();

        let input = input.trim_start();
        let input = input.strip_prefix('/').unwrap_or(input);
        let mut tokens: Vec<&str> = input.split_whitespace().collect();
        let partial = if input.is_empty() || input.ends_with(char::is_whitespace) {
            ""
        } else {
            tokens.pop().unwrap_or("")
        };

        let mut current = self.root;
        for token in tokens {
            match self.visible_child(current, token, source) {
                Some(next) => current = next,
                None => return Vec::new(),
            }
        }

        let partial = partial.to_lowercase();
        self.nodes[current]
            .children
            .iter()
            .map(|c| &self.nodes[*c])
            .filter(|n| n.requirement.test(source))
            .filter_map(|n| match n.kind {
                CommandNodeKind::Literal if n.name.to_lowercase().starts_with(&partial) => {
                    Some(n.name.clone())
                }
                CommandNodeKind::Argument => Some(format!("<{}>", n.name)),
                _ => None,
            })
            .collect()
    }

    fn collect_nodes(&self, node: NodeId, path: &CommandPath, out: &mut Vec<NodeEntry<S>>) {
        for child in &self.nodes[node].children {
            let n = &self.nodes[*child];
            let Some(segment) = n.segment() else {
                continue;
            };
            let child_path = path.child(segment);
            out.push(NodeEntry {
                id: *child,
                path: child_path.clone(),
                requirement: n.requirement.clone(),
            });
            self.collect_nodes(*child, &child_path, out);
        }
    }
}

impl<S: CommandSource + 'static> CommandTree<S> for CommandDispatcher<S> {
    fn list_all_nodes(&self) -> Vec<NodeEntry<S>> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_nodes(self.root, &CommandPath::default(), &mut out);
        out
    }

    fn replace_requirement(
        &mut self,
        node: NodeId,
        requirement: Requirement<S>,
    ) -> Result<Requirement<S>, TreeError> {
        if node == self.root {
            return Err(TreeError::UnknownNode(node));
        }
        if self.nodes.get(node).is_some_and(|n| n.sealed) {
            let path = self.path_of(node).unwrap_or_default();
            return Err(TreeError::Sealed(path.to_string()));
        }
        let n = self
            .nodes
            .get_mut(node)
            .ok_or(TreeError::UnknownNode(node))?;
        Ok(std::mem::replace(&mut n.requirement, requirement))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use player_roles_sdk::is_suggestion_pass;

    use super::*;

    struct Player {
        id: Option<u64>,
        level: u8,
        feedback: RefCell<Vec<String>>,
    }

    impl Player {
        fn new(id: Option<u64>, level: u8) -> Self {
            Self {
                id,
                level,
                feedback: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandSource for Player {
        fn user_id(&self) -> Option<u64> {
            self.id
        }

        fn permission_level(&self) -> u8 {
            self.level
        }

        fn send_feedback(&self, message: &str) {
            self.feedback.borrow_mut().push(message.to_string());
        }
    }

    fn gamemode_tree() -> CommandDispatcher<Player> {
        let mut dispatcher = CommandDispatcher::new();
        let root = dispatcher.root();
        let gamemode = dispatcher.literal(root, "gamemode");
        dispatcher.requires(gamemode, Requirement::from_fn(|p: &Player| p.level >= 2));
        for mode in ["creative", "survival"] {
            let node = dispatcher.literal(gamemode, mode);
            dispatcher.executes(node, move |ctx| {
                ctx.reply(&format!("Set mode {}", mode));
                CommandResult::Handled
            });
            let target = dispatcher.argument(node, "target");
            dispatcher.executes(target, move |ctx| {
                ctx.reply_fmt(format_args!(
                    "Set mode {} for {}",
                    mode,
                    ctx.arg("target").unwrap_or("?")
                ));
                CommandResult::Handled
            });
        }
        dispatcher.register_command("help", |_| CommandResult::Handled);
        dispatcher
    }

    #[test]
    fn test_execute_with_arguments() {
        let dispatcher = gamemode_tree();
        let op = Player::new(Some(1), 2);

        assert_eq!(
            dispatcher.execute(&op, "/gamemode creative Steve"),
            Ok(CommandResult::Handled)
        );
        assert_eq!(
            dispatcher.execute(&op, "GAMEMODE survival"),
            Ok(CommandResult::Handled)
        );
        assert_eq!(
            *op.feedback.borrow(),
            vec!["Set mode creative for Steve", "Set mode survival"]
        );
    }

    #[test]
    fn test_requirement_blocks_execution() {
        let dispatcher = gamemode_tree();
        let player = Player::new(Some(2), 0);

        assert!(matches!(
            dispatcher.execute(&player, "gamemode creative"),
            Err(DispatchError::UnknownCommand(_))
        ));
        assert_eq!(dispatcher.execute(&player, "help"), Ok(CommandResult::Handled));
    }

    #[test]
    fn test_incomplete_and_empty() {
        let dispatcher = gamemode_tree();
        let op = Player::new(None, 4);

        assert_eq!(
            dispatcher.execute(&op, "gamemode"),
            Err(DispatchError::Incomplete("gamemode".to_string()))
        );
        assert_eq!(dispatcher.execute(&op, "  "), Err(DispatchError::Empty));
    }

    #[test]
    fn test_suggest() {
        let dispatcher = gamemode_tree();
        let op = Player::new(Some(1), 2);
        let player = Player::new(Some(2), 0);

        assert_eq!(dispatcher.suggest(&op, ""), vec!["gamemode", "help"]);
        assert_eq!(dispatcher.suggest(&player, ""), vec!["help"]);
        assert_eq!(dispatcher.suggest(&op, "gamemode c"), vec!["creative"]);
        assert_eq!(dispatcher.suggest(&op, "gamemode creative "), vec!["<target>"]);
        assert!(dispatcher.suggest(&player, "gamemode ").is_empty());
    }

    #[test]
    fn test_suggest_sets_pass_flag() {
        let mut dispatcher = CommandDispatcher::<Player>::new();
        let root = dispatcher.root();
        let secret = dispatcher.literal(root, "secret");
        dispatcher.requires(secret, Requirement::from_fn(|_| !is_suggestion_pass()));
        dispatcher.executes(secret, |_| CommandResult::Handled);

        let player = Player::new(Some(3), 0);
        assert!(dispatcher.suggest(&player, "").is_empty());
        assert_eq!(dispatcher.execute(&player, "secret"), Ok(CommandResult::Handled));
    }

    #[test]
    fn test_list_all_nodes_parent_first() {
        let dispatcher = gamemode_tree();
        let paths: Vec<String> = dispatcher
            .list_all_nodes()
            .into_iter()
            .map(|e| e.path.to_string())
            .collect();

        assert_eq!(
            paths,
            vec![
                "gamemode",
                "gamemode creative",
                "gamemode creative <target>",
                "gamemode survival",
                "gamemode survival <target>",
                "help",
            ]
        );
        assert_eq!(dispatcher.len(), 6);
    }

    #[test]
    fn test_register_merges_existing() {
        let mut dispatcher = gamemode_tree();
        let root = dispatcher.root();
        let before = dispatcher.len();
        let again = dispatcher.literal(root, "gamemode");

        assert_eq!(dispatcher.len(), before);
        assert_eq!(
            dispatcher.find(&CommandPath::literals(&["gamemode"])),
            Some(again)
        );
    }

    #[test]
    fn test_replace_requirement() {
        let mut dispatcher = gamemode_tree();
        let node = dispatcher
            .find(&CommandPath::literals(&["gamemode"]))
            .unwrap();
        let player = Player::new(Some(2), 0);

        let previous = dispatcher
            .replace_requirement(node, Requirement::always())
            .unwrap();
        assert!(!previous.test(&player));
        assert!(dispatcher.can_use(&player, node));
    }

    #[test]
    fn test_replace_requirement_errors() {
        let mut dispatcher = gamemode_tree();
        let root = dispatcher.root();
        let node = dispatcher.find(&CommandPath::literals(&["help"])).unwrap();
        dispatcher.seal(node);

        assert_eq!(
            dispatcher.replace_requirement(node, Requirement::always()).unwrap_err(),
            TreeError::Sealed("help".to_string())
        );
        assert_eq!(
            dispatcher.replace_requirement(root, Requirement::always()).unwrap_err(),
            TreeError::UnknownNode(root)
        );
    }

    #[test]
    fn test_unregister_command() {
        let mut dispatcher = gamemode_tree();
        assert!(dispatcher.unregister_command("gamemode"));
        assert!(!dispatcher.unregister_command("gamemode"));
        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher
            .find(&CommandPath::literals(&["gamemode", "creative"]))
            .is_none());
    }
}
