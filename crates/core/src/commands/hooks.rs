//! Command requirement hooks
//!
//! Splices role decisions into a host tree's existing guards. Each node's
//! requirement is wrapped in a [`RoleGuard`] that asks the evaluator first and
//! defers to the original requirement on `Fallback`.
//!
//! Hooking must be reapplied whenever the host rebuilds its tree. Reapplying
//! unwraps existing guards first, so guards never nest.

use std::any::Any;
use std::sync::Arc;

use player_roles_sdk::{
    is_suggestion_pass, CommandPath, CommandSource, CommandTree, NodeId, Predicate, Requirement,
    TreeError,
};

use super::evaluator::CommandPermissionEvaluator;
use super::matchable::MatchableCommand;
use crate::permission::PermissionResult;

/// Hook errors
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The host refused a requirement replacement; the pass was rolled back
    #[error("Failed to compose requirement for '{path}': {source}")]
    Composition {
        path: String,
        #[source]
        source: TreeError,
    },
}

/// Guard consulting role decisions before the original requirement
pub struct RoleGuard<S> {
    path: CommandPath,
    evaluator: Arc<CommandPermissionEvaluator>,
    fallback: Requirement<S>,
}

impl<S> RoleGuard<S> {
    pub fn path(&self) -> &CommandPath {
        &self.path
    }

    /// The requirement this guard defers to
    pub fn fallback(&self) -> &Requirement<S> {
        &self.fallback
    }
}

impl<S: CommandSource + 'static> Predicate<S> for RoleGuard<S> {
    fn test(&self, source: &S) -> bool {
        match self.evaluator.can_source_use(source, &self.path) {
            PermissionResult::Allow => true,
            PermissionResult::Deny => false,
            PermissionResult::Hidden => !is_suggestion_pass(),
            PermissionResult::Fallback => self.fallback.test(source),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Applies [`RoleGuard`]s to host trees
pub struct CommandRequirementHooks {
    evaluator: Arc<CommandPermissionEvaluator>,
}

impl CommandRequirementHooks {
    pub fn new(evaluator: Arc<CommandPermissionEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Arc<CommandPermissionEvaluator> {
        &self.evaluator
    }

    /// Wrap the requirement of every node in `tree`
    ///
    /// The compiled snapshot is installed only once every node is wrapped. If
    /// the host rejects any replacement, all replacements made so far are
    /// restored and the previous snapshot stays in place.
    ///
    /// # Returns
    /// The number of nodes hooked
    pub fn hook_all<S, T>(&self, tree: &mut T) -> Result<usize, HookError>
    where
        S: CommandSource + 'static,
        T: CommandTree<S> + ?Sized,
    {
        let nodes = tree.list_all_nodes();
        let compiled = MatchableCommand::compile(nodes.iter().map(|node| node.path.clone()));

        let mut replaced: Vec<(NodeId, Requirement<S>)> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let fallback = match node.requirement.downcast_ref::<RoleGuard<S>>() {
                Some(existing) => existing.fallback.clone(),
                None => node.requirement.clone(),
            };
            let guard = Requirement::new(RoleGuard {
                path: node.path.clone(),
                evaluator: Arc::clone(&self.evaluator),
                fallback,
            });

            match tree.replace_requirement(node.id, guard) {
                Ok(previous) => replaced.push((node.id, previous)),
                Err(source) => {
                    tracing::error!(
                        "Failed to compose requirement for '{}': {}",
                        node.path,
                        source
                    );
                    rollback(tree, replaced);
                    return Err(HookError::Composition {
                        path: node.path.to_string(),
                        source,
                    });
                }
            }
        }

        let count = replaced.len();
        self.evaluator.snapshot().replace(compiled);
        tracing::info!("Applied role requirements to {} command nodes", count);
        Ok(count)
    }

    /// Clear the snapshot ahead of a tree rebuild
    pub fn invalidate(&self) {
        self.evaluator.snapshot().invalidate();
        tracing::debug!("Command snapshot invalidated");
    }
}

fn rollback<S, T>(tree: &mut T, replaced: Vec<(NodeId, Requirement<S>)>)
where
    T: CommandTree<S> + ?Sized,
{
    for (id, previous) in replaced.into_iter().rev() {
        if let Err(e) = tree.replace_requirement(id, previous) {
            tracing::error!("Failed to restore requirement during rollback: {}", e);
        }
    }
}
