//! Choosing among the candidates of Ambiguous nodes.

use rustc_hash::FxHashMap;
use tangle_ir::{NodeId, SyntaxNode, SyntaxTree};

use crate::{ForkManager, ResolveError};

impl ForkManager<'_> {
    /// The one candidate of `node` that `accept` admits.
    ///
    /// A non-ambiguous node resolves to itself when accepted, so resolving
    /// a resolved node changes nothing.
    pub fn resolve<F>(tree: &SyntaxTree, node: NodeId, accept: F) -> Result<NodeId, ResolveError>
    where
        F: Fn(&SyntaxTree, NodeId) -> bool,
    {
        let candidates: &[NodeId] = match tree.node(node) {
            SyntaxNode::Ambiguous { .. } => tree.children(node),
            SyntaxNode::Leaf { .. } | SyntaxNode::Internal { .. } => std::slice::from_ref(&node),
        };
        let mut accepted = candidates.iter().copied().filter(|&c| accept(tree, c));
        match (accepted.next(), accepted.next()) {
            (Some(chosen), None) => Ok(chosen),
            _ => Err(ResolveError::UnresolvableAmbiguity {
                range: tree.range(node),
                accepted: candidates.iter().filter(|&&c| accept(tree, c)).count(),
                candidates: candidates.len(),
            }),
        }
    }

    /// A tree with every reachable ambiguity resolved by `accept`.
    ///
    /// Ambiguities nested inside rejected candidates are never consulted.
    pub fn resolve_all<F>(tree: &SyntaxTree, accept: F) -> Result<SyntaxTree, ResolveError>
    where
        F: Fn(&SyntaxTree, NodeId) -> bool,
    {
        let mut choices = FxHashMap::default();
        let mut pending = vec![tree.root()];
        while let Some(id) = pending.pop() {
            if tree.node(id).is_ambiguous() {
                let chosen = Self::resolve(tree, id, &accept)?;
                choices.insert(id, chosen);
                pending.push(chosen);
            } else {
                pending.extend(tree.children(id).iter().rev());
            }
        }
        Ok(tree.with_choices(&choices))
    }
}
