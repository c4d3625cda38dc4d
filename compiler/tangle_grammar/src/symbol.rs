//! Grammar symbols.

use tangle_ir::Name;

/// A right-hand-side symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Matches one token whose kind is this name.
    Terminal(Name),
    /// Expands through the productions of this nonterminal.
    Nonterminal(Name),
}

impl Symbol {
    #[inline]
    pub fn name(self) -> Name {
        match self {
            Symbol::Terminal(name) | Symbol::Nonterminal(name) => name,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}
