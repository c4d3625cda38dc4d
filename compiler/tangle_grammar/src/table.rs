//! The read-only grammar table consulted by the parse engine.

use std::ops::Range;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tangle_ir::{Name, ProductionId, SharedInterner};

use crate::analysis::{Analysis, TerminalSet};
use crate::{GrammarError, Production, Symbol};

/// A validated grammar with its analysis.
///
/// Productions of one nonterminal are stored contiguously, in declaration
/// order, so [`GrammarTable::lookup`] is a slice. The table is immutable and
/// `Sync`; any number of parses may share one.
#[derive(Debug)]
pub struct GrammarTable {
    interner: SharedInterner,
    start: Name,
    productions: Vec<Production>,
    rules: FxHashMap<Name, Range<u32>>,
    nonterminals: Vec<Name>,
    terminals: Vec<Name>,
    terminal_set: FxHashSet<Name>,
    hidden: FxHashSet<Name>,
    literals: FxHashMap<Name, Name>,
    analysis: Analysis,
}

pub(crate) struct TableParts {
    pub interner: SharedInterner,
    pub start: Name,
    pub productions: Vec<Production>,
    pub nonterminals: Vec<Name>,
    pub terminals: Vec<Name>,
    pub literals: FxHashMap<Name, Name>,
    pub analysis: Analysis,
}

impl GrammarTable {
    pub(crate) fn from_parts(parts: TableParts) -> Self {
        let mut rules: FxHashMap<Name, Range<u32>> = FxHashMap::default();
        for production in &parts.productions {
            let id = production.id.raw();
            rules
                .entry(production.lhs)
                .and_modify(|range| range.end = id + 1)
                .or_insert(id..id + 1);
        }
        let hidden = parts
            .nonterminals
            .iter()
            .copied()
            .filter(|&nt| parts.interner.lookup(nt).starts_with('_'))
            .collect();
        let terminal_set = parts.terminals.iter().copied().collect();
        GrammarTable {
            interner: parts.interner,
            start: parts.start,
            productions: parts.productions,
            rules,
            nonterminals: parts.nonterminals,
            terminals: parts.terminals,
            terminal_set,
            hidden,
            literals: parts.literals,
            analysis: parts.analysis,
        }
    }

    /// The interner every name in this grammar comes from.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Text of a name from this grammar's interner.
    #[inline]
    pub fn name(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    pub fn start(&self) -> Name {
        self.start
    }

    /// Productions of `nonterminal`, in declaration order.
    pub fn lookup(&self, nonterminal: Name) -> Result<&[Production], GrammarError> {
        self.alternatives(nonterminal)
            .ok_or_else(|| GrammarError::UnknownNonterminal {
                name: self.name(nonterminal).to_string(),
            })
    }

    /// Productions of `nonterminal`, or `None` if it is not defined.
    #[inline]
    pub fn alternatives(&self, nonterminal: Name) -> Option<&[Production]> {
        let range = self.rules.get(&nonterminal)?;
        Some(&self.productions[range.start as usize..range.end as usize])
    }

    #[inline]
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.index()]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Nonterminals in order of first definition.
    pub fn nonterminals(&self) -> &[Name] {
        &self.nonterminals
    }

    /// Terminal kinds in order of first mention.
    pub fn terminals(&self) -> &[Name] {
        &self.terminals
    }

    #[inline]
    pub fn is_nonterminal(&self, name: Name) -> bool {
        self.rules.contains_key(&name)
    }

    #[inline]
    pub fn is_terminal(&self, name: Name) -> bool {
        self.terminal_set.contains(&name)
    }

    /// Hidden nonterminals (`_name`) build no node of their own.
    #[inline]
    pub fn is_hidden(&self, nonterminal: Name) -> bool {
        self.hidden.contains(&nonterminal)
    }

    /// Terminal kind for a literal token text, if the grammar declares one.
    pub fn literal_kind(&self, text: &str) -> Option<Name> {
        let text = self.interner.get(text)?;
        self.literals.get(&text).copied()
    }

    /// Every `(text, kind)` literal mapping, sorted by text.
    pub fn literals(&self) -> Vec<(&'static str, Name)> {
        let mut literals: Vec<_> = self
            .literals
            .iter()
            .map(|(&text, &kind)| (self.name(text), kind))
            .collect();
        literals.sort_unstable_by_key(|&(text, _)| text);
        literals
    }

    pub fn is_nullable(&self, nonterminal: Name) -> bool {
        self.analysis.nullable.contains(&nonterminal)
    }

    pub fn first(&self, nonterminal: Name) -> Option<&TerminalSet> {
        self.analysis.first.get(&nonterminal)
    }

    pub fn follow(&self, nonterminal: Name) -> Option<&TerminalSet> {
        self.analysis.follow.get(&nonterminal)
    }

    /// Whether `production` can start at a token of kind `lookahead`
    /// (`None` = end of input): the kind is in FIRST of the right-hand
    /// side, or the right-hand side is nullable and the kind may follow
    /// the left-hand side.
    #[inline]
    pub fn predicts(&self, production: ProductionId, lookahead: Option<Name>) -> bool {
        let index = production.index();
        if lookahead.is_some() && self.analysis.production_first[index].contains(lookahead) {
            return true;
        }
        self.analysis.production_nullable[index]
            && self
                .follow(self.productions[index].lhs)
                .is_some_and(|follow| follow.contains(lookahead))
    }

    /// Whether the right-hand side of `production` derives the empty string.
    pub fn is_production_nullable(&self, production: ProductionId) -> bool {
        self.analysis.production_nullable[production.index()]
    }

    /// First symbol of every alternative of `nonterminal`, in declaration
    /// order and without duplicates. Hidden nonterminals are replaced by
    /// their own leading symbols; empty alternatives contribute nothing.
    pub fn leading_symbols(&self, nonterminal: Name) -> SmallVec<[Name; 4]> {
        let mut out = SmallVec::new();
        let mut visited = FxHashSet::default();
        self.collect_leading(nonterminal, &mut visited, &mut out);
        out
    }

    fn collect_leading(
        &self,
        nonterminal: Name,
        visited: &mut FxHashSet<Name>,
        out: &mut SmallVec<[Name; 4]>,
    ) {
        if !visited.insert(nonterminal) {
            return;
        }
        for production in self.alternatives(nonterminal).unwrap_or(&[]) {
            match production.symbol_at(0) {
                Some(Symbol::Nonterminal(nt)) if self.is_hidden(nt) => {
                    self.collect_leading(nt, visited, out);
                }
                Some(symbol) => {
                    if !out.contains(&symbol.name()) {
                        out.push(symbol.name());
                    }
                }
                None => {}
            }
        }
    }

    pub fn ambiguous_count(&self) -> usize {
        self.productions.iter().filter(|p| p.ambiguous).count()
    }

    /// `lhs := a b c`, for traces and the CLI.
    pub fn describe(&self, production: ProductionId) -> String {
        let production = self.production(production);
        let op = if production.ambiguous { "?=" } else { ":=" };
        let mut out = format!("{} {op}", self.name(production.lhs));
        if production.rhs.is_empty() {
            out.push_str(" %empty");
        }
        for symbol in production.rhs.iter() {
            out.push(' ');
            out.push_str(self.name(symbol.name()));
        }
        if production.label != production.lhs {
            out.push_str(" @");
            out.push_str(self.name(production.label));
        }
        out
    }
}

#[cfg(test)]
mod tests;
