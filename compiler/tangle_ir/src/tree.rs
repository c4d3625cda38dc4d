//! Syntax trees with embedded ambiguity.
//!
//! Nodes are stored flat in a [`NodeArena`]. Child and candidate lists are
//! ranges into a single pool of `NodeId`s, so a node is a small `Copy` value
//! and building one never allocates on its own.
//!
//! During a parse the arena is shared by every candidate: a subtree built
//! before a fork is referenced by all stacks descending from it, and nodes
//! built by candidates that later die stay behind. [`SyntaxTree::compact`]
//! copies only what is reachable from the accepted root, giving each node
//! exactly one parent.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::stack::ensure_sufficient_stack;
use crate::{Name, StringInterner, Token, TokenRange};

/// Index of a node in a [`NodeArena`] or [`SyntaxTree`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a production in its grammar table.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ProductionId(u32);

impl ProductionId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ProductionId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A `(start, len)` slice of the arena's list pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct NodeList {
    start: u32,
    len: u32,
}

impl NodeList {
    pub const EMPTY: NodeList = NodeList { start: 0, len: 0 };

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    fn to_range(self) -> std::ops::Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}

/// One node of a syntax tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyntaxNode {
    /// One input token at its index in the token stream.
    Leaf { token: Token, position: u32 },
    /// A completed production. `label` is the production's node label.
    Internal {
        production: ProductionId,
        label: Name,
        range: TokenRange,
        children: NodeList,
    },
    /// Two or more interpretations of `nonterminal` over the same range.
    ///
    /// Candidates are Internal nodes in declaration order, never Ambiguous.
    Ambiguous {
        nonterminal: Name,
        range: TokenRange,
        candidates: NodeList,
    },
}

impl SyntaxNode {
    /// Token range covered by this node.
    #[inline]
    pub fn range(&self) -> TokenRange {
        match *self {
            SyntaxNode::Leaf { position, .. } => TokenRange::single(position),
            SyntaxNode::Internal { range, .. } | SyntaxNode::Ambiguous { range, .. } => range,
        }
    }

    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SyntaxNode::Ambiguous { .. })
    }

    /// Production of an Internal node.
    #[inline]
    pub fn production(&self) -> Option<ProductionId> {
        match *self {
            SyntaxNode::Internal { production, .. } => Some(production),
            SyntaxNode::Leaf { .. } | SyntaxNode::Ambiguous { .. } => None,
        }
    }

    /// Token of a Leaf node.
    #[inline]
    pub fn token(&self) -> Option<Token> {
        match *self {
            SyntaxNode::Leaf { token, .. } => Some(token),
            SyntaxNode::Internal { .. } | SyntaxNode::Ambiguous { .. } => None,
        }
    }
}

/// Append-only node storage.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SyntaxNode>,
    lists: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn push_list(&mut self, ids: &[NodeId]) -> NodeList {
        if ids.is_empty() {
            return NodeList::EMPTY;
        }
        let start = self.lists.len() as u32;
        self.lists.extend_from_slice(ids);
        NodeList {
            start,
            len: ids.len() as u32,
        }
    }

    pub fn alloc_leaf(&mut self, token: Token, position: u32) -> NodeId {
        self.push(SyntaxNode::Leaf { token, position })
    }

    pub fn alloc_internal(
        &mut self,
        production: ProductionId,
        label: Name,
        range: TokenRange,
        children: &[NodeId],
    ) -> NodeId {
        let children = self.push_list(children);
        self.push(SyntaxNode::Internal {
            production,
            label,
            range,
            children,
        })
    }

    pub fn alloc_ambiguous(
        &mut self,
        nonterminal: Name,
        range: TokenRange,
        candidates: &[NodeId],
    ) -> NodeId {
        let candidates = self.push_list(candidates);
        self.push(SyntaxNode::Ambiguous {
            nonterminal,
            range,
            candidates,
        })
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn list(&self, list: NodeList) -> &[NodeId] {
        &self.lists[list.to_range()]
    }

    /// Children of an Internal node, candidates of an Ambiguous node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match *self.get(id) {
            SyntaxNode::Leaf { .. } => &[],
            SyntaxNode::Internal { children, .. } => self.list(children),
            SyntaxNode::Ambiguous { candidates, .. } => self.list(candidates),
        }
    }

    #[inline]
    pub fn range(&self, id: NodeId) -> TokenRange {
        self.get(id).range()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// An immutable, compacted syntax tree.
///
/// Every node is reachable from the root and has exactly one parent.
/// The root is always `NodeId(0)` and nodes are numbered in pre-order.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    arena: NodeArena,
    root: NodeId,
}

impl SyntaxTree {
    /// Copy the subtree reachable from `root` out of a shared arena.
    pub fn compact(source: &NodeArena, root: NodeId) -> SyntaxTree {
        Self::copy_with(source, root, &FxHashMap::default())
    }

    fn copy_with(
        source: &NodeArena,
        root: NodeId,
        replace: &FxHashMap<NodeId, NodeId>,
    ) -> SyntaxTree {
        let mut copier = Copier {
            source,
            replace,
            target: NodeArena::new(),
        };
        let root = copier.copy(root);
        SyntaxTree {
            arena: copier.target,
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        self.arena.get(id)
    }

    /// Children of an Internal node, candidates of an Ambiguous node,
    /// nothing for a Leaf.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.children(id)
    }

    #[inline]
    pub fn range(&self, id: NodeId) -> TokenRange {
        self.arena.range(id)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order walk over every node, including every candidate subtree
    /// of every Ambiguous node.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Leaf tokens in input order, following the first candidate of each
    /// Ambiguous node.
    pub fn leaves(&self) -> Vec<Token> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match *self.node(id) {
                SyntaxNode::Leaf { token, .. } => out.push(token),
                SyntaxNode::Internal { children, .. } => {
                    stack.extend(self.arena.list(children).iter().rev());
                }
                SyntaxNode::Ambiguous { candidates, .. } => {
                    if let Some(&first) = self.arena.list(candidates).first() {
                        stack.push(first);
                    }
                }
            }
        }
        out
    }

    pub fn has_unresolved_ambiguity(&self) -> bool {
        self.arena.nodes.iter().any(SyntaxNode::is_ambiguous)
    }

    /// Every Ambiguous node, in pre-order.
    pub fn ambiguities(&self) -> Vec<NodeId> {
        self.preorder()
            .filter(|&id| self.node(id).is_ambiguous())
            .collect()
    }

    /// A new tree where the Ambiguous node `ambiguous` is replaced by its
    /// candidate `chosen`.
    ///
    /// Returns `None` if `ambiguous` is not an Ambiguous node or `chosen` is
    /// not one of its candidates.
    pub fn with_choice(&self, ambiguous: NodeId, chosen: NodeId) -> Option<SyntaxTree> {
        if ambiguous.index() >= self.len() || !self.node(ambiguous).is_ambiguous() {
            return None;
        }
        if !self.children(ambiguous).contains(&chosen) {
            return None;
        }
        let mut choices = FxHashMap::default();
        choices.insert(ambiguous, chosen);
        Some(self.with_choices(&choices))
    }

    /// A new tree where each key of `choices` is replaced by its value.
    ///
    /// Callers are responsible for only mapping Ambiguous nodes to their own
    /// candidates; anything else breaks the range invariants.
    pub fn with_choices(&self, choices: &FxHashMap<NodeId, NodeId>) -> SyntaxTree {
        Self::copy_with(&self.arena, self.root, choices)
    }

    /// S-expression rendering of the whole tree.
    pub fn display<'a>(&'a self, names: &'a StringInterner) -> TreeDisplay<'a> {
        self.display_node(self.root, names)
    }

    /// S-expression rendering of one subtree.
    pub fn display_node<'a>(&'a self, id: NodeId, names: &'a StringInterner) -> TreeDisplay<'a> {
        TreeDisplay {
            tree: self,
            names,
            node: id,
        }
    }
}

/// Pre-order copy into a fresh arena.
///
/// A node's slot is reserved before its children are copied, so ids come out
/// in pre-order with the root at 0.
struct Copier<'a> {
    source: &'a NodeArena,
    replace: &'a FxHashMap<NodeId, NodeId>,
    target: NodeArena,
}

impl Copier<'_> {
    fn copy(&mut self, id: NodeId) -> NodeId {
        ensure_sufficient_stack(|| self.copy_inner(id))
    }

    fn copy_inner(&mut self, id: NodeId) -> NodeId {
        let id = self.replace.get(&id).copied().unwrap_or(id);
        let node = *self.source.get(id);
        let slot = self.target.push(node);
        let list = match node {
            SyntaxNode::Leaf { .. } => return slot,
            SyntaxNode::Internal { children, .. } => children,
            SyntaxNode::Ambiguous { candidates, .. } => candidates,
        };
        let copied: Vec<NodeId> = self
            .source
            .list(list)
            .iter()
            .map(|&child| self.copy(child))
            .collect();
        let list = self.target.push_list(&copied);
        self.target.nodes[slot.index()] = match node {
            SyntaxNode::Internal {
                production,
                label,
                range,
                ..
            } => SyntaxNode::Internal {
                production,
                label,
                range,
                children: list,
            },
            SyntaxNode::Ambiguous {
                nonterminal, range, ..
            } => SyntaxNode::Ambiguous {
                nonterminal,
                range,
                candidates: list,
            },
            leaf @ SyntaxNode::Leaf { .. } => leaf,
        };
        slot
    }
}

/// Lazy pre-order iterator over a [`SyntaxTree`].
pub struct Preorder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// `Display` adapter returned by [`SyntaxTree::display`].
///
/// Leaves render as `text` when their kind is the text itself (punctuation
/// literals) and as `kind:text` otherwise. Internal nodes render as
/// `(label child...)`, Ambiguous nodes as `(? candidate...)`.
pub struct TreeDisplay<'a> {
    tree: &'a SyntaxTree,
    names: &'a StringInterner,
    node: NodeId,
}

impl TreeDisplay<'_> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        ensure_sufficient_stack(|| match *self.tree.node(id) {
            SyntaxNode::Leaf { token, .. } => {
                let text = self.names.lookup(token.text);
                if token.kind == token.text {
                    f.write_str(text)
                } else {
                    write!(f, "{}:{text}", self.names.lookup(token.kind))
                }
            }
            SyntaxNode::Internal { label, .. } => {
                write!(f, "({}", self.names.lookup(label))?;
                self.write_list(f, id)
            }
            SyntaxNode::Ambiguous { .. } => {
                f.write_str("(?")?;
                self.write_list(f, id)
            }
        })
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        for &child in self.tree.children(id) {
            f.write_str(" ")?;
            self.write_node(f, child)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.node)
    }
}
