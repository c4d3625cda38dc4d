//! Productions.

use tangle_ir::{Name, ProductionId};

use crate::Symbol;

/// One alternative of a nonterminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub id: ProductionId,
    pub lhs: Name,
    /// Index among the alternatives of `lhs`, in declaration order.
    pub alternative: u32,
    /// Label of the node built for this production. Defaults to `lhs`.
    pub label: Name,
    pub rhs: Box<[Symbol]>,
    /// Whether this alternative may share a span with another flagged
    /// alternative of the same nonterminal, in which case both are kept.
    pub ambiguous: bool,
}

impl Production {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// Symbol after the dot, or `None` when the production is complete.
    #[inline]
    pub fn symbol_at(&self, dot: usize) -> Option<Symbol> {
        self.rhs.get(dot).copied()
    }
}
