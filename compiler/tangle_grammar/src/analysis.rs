//! Nullable, FIRST and FOLLOW sets, and left-recursion detection.
//!
//! All three sets are least fixpoints over the production list. Grammars are
//! small and built once, so the passes simply iterate until nothing changes.

use rustc_hash::{FxHashMap, FxHashSet};
use tangle_ir::stack::ensure_sufficient_stack;
use tangle_ir::Name;

use crate::{Production, Symbol};

/// A set of terminal kinds, plus the end-of-input marker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminalSet {
    terminals: FxHashSet<Name>,
    end: bool,
}

impl TerminalSet {
    /// Whether `lookahead` is in the set; `None` is end of input.
    #[inline]
    pub fn contains(&self, lookahead: Option<Name>) -> bool {
        match lookahead {
            Some(kind) => self.terminals.contains(&kind),
            None => self.end,
        }
    }

    pub fn contains_end(&self) -> bool {
        self.end
    }

    /// Terminal kinds in the set, in no particular order.
    pub fn terminals(&self) -> impl Iterator<Item = Name> + '_ {
        self.terminals.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.terminals.len() + usize::from(self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, kind: Name) -> bool {
        self.terminals.insert(kind)
    }

    fn insert_end(&mut self) -> bool {
        !std::mem::replace(&mut self.end, true)
    }

    fn union(&mut self, other: &TerminalSet) -> bool {
        let before = self.len();
        self.terminals.extend(other.terminals.iter().copied());
        self.end |= other.end;
        self.len() != before
    }
}

/// Analysis results for one grammar.
#[derive(Debug, Default)]
pub(crate) struct Analysis {
    pub nullable: FxHashSet<Name>,
    pub first: FxHashMap<Name, TerminalSet>,
    pub follow: FxHashMap<Name, TerminalSet>,
    /// FIRST of each production's right-hand side, indexed by production.
    pub production_first: Vec<TerminalSet>,
    /// Whether each production's right-hand side derives the empty string.
    pub production_nullable: Vec<bool>,
}

impl Analysis {
    pub(crate) fn compute(productions: &[Production], nonterminals: &[Name], start: Name) -> Self {
        let mut analysis = Analysis::default();
        for &nt in nonterminals {
            analysis.first.insert(nt, TerminalSet::default());
            analysis.follow.insert(nt, TerminalSet::default());
        }
        analysis.compute_nullable(productions);
        analysis.compute_first(productions);
        analysis.compute_follow(productions, start);

        for production in productions {
            let (first, nullable) = analysis.first_of_sequence(&production.rhs);
            analysis.production_first.push(first);
            analysis.production_nullable.push(nullable);
        }
        analysis
    }

    fn compute_nullable(&mut self, productions: &[Production]) {
        let mut changed = true;
        while changed {
            changed = false;
            for production in productions {
                if self.nullable.contains(&production.lhs) {
                    continue;
                }
                let all_nullable = production.rhs.iter().all(|symbol| match *symbol {
                    Symbol::Terminal(_) => false,
                    Symbol::Nonterminal(nt) => self.nullable.contains(&nt),
                });
                if all_nullable {
                    self.nullable.insert(production.lhs);
                    changed = true;
                }
            }
        }
    }

    fn compute_first(&mut self, productions: &[Production]) {
        let mut changed = true;
        while changed {
            changed = false;
            for production in productions {
                let (rhs_first, _) = self.first_of_sequence(&production.rhs);
                if let Some(set) = self.first.get_mut(&production.lhs) {
                    changed |= set.union(&rhs_first);
                }
            }
        }
    }

    fn compute_follow(&mut self, productions: &[Production], start: Name) {
        if let Some(set) = self.follow.get_mut(&start) {
            set.insert_end();
        }
        let mut changed = true;
        while changed {
            changed = false;
            for production in productions {
                for (i, symbol) in production.rhs.iter().enumerate() {
                    let Symbol::Nonterminal(nt) = *symbol else {
                        continue;
                    };
                    let (rest_first, rest_nullable) =
                        self.first_of_sequence(&production.rhs[i + 1..]);
                    let mut addition = rest_first;
                    if rest_nullable && nt != production.lhs {
                        if let Some(lhs_follow) = self.follow.get(&production.lhs) {
                            addition.union(lhs_follow);
                        }
                    }
                    if let Some(set) = self.follow.get_mut(&nt) {
                        changed |= set.union(&addition);
                    }
                }
            }
        }
    }

    /// FIRST of a symbol sequence and whether the whole sequence is nullable.
    ///
    /// The end marker is never part of a FIRST set.
    pub(crate) fn first_of_sequence(&self, symbols: &[Symbol]) -> (TerminalSet, bool) {
        let mut set = TerminalSet::default();
        for symbol in symbols {
            match *symbol {
                Symbol::Terminal(kind) => {
                    set.insert(kind);
                    return (set, false);
                }
                Symbol::Nonterminal(nt) => {
                    if let Some(first) = self.first.get(&nt) {
                        set.terminals.extend(first.terminals.iter().copied());
                    }
                    if !self.nullable.contains(&nt) {
                        return (set, false);
                    }
                }
            }
        }
        (set, true)
    }
}

/// Left-corner edges: `A -> B` when some production of `A` can start
/// with `B` after a nullable prefix.
pub(crate) fn left_corners(
    productions: &[Production],
    nullable: &FxHashSet<Name>,
) -> FxHashMap<Name, Vec<Name>> {
    let mut edges: FxHashMap<Name, Vec<Name>> = FxHashMap::default();
    for production in productions {
        for symbol in production.rhs.iter() {
            let Symbol::Nonterminal(nt) = *symbol else {
                break;
            };
            let targets = edges.entry(production.lhs).or_default();
            if !targets.contains(&nt) {
                targets.push(nt);
            }
            if !nullable.contains(&nt) {
                break;
            }
        }
    }
    edges
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// First left-recursive cycle, searching from nonterminals in declaration
/// order. The returned cycle starts and ends with the same name.
pub(crate) fn find_left_recursion(
    nonterminals: &[Name],
    edges: &FxHashMap<Name, Vec<Name>>,
) -> Option<Vec<Name>> {
    let mut dfs = CycleSearch {
        edges,
        marks: FxHashMap::default(),
        path: Vec::new(),
    };
    nonterminals.iter().find_map(|&nt| {
        if dfs.marks.contains_key(&nt) {
            None
        } else {
            dfs.visit(nt)
        }
    })
}

struct CycleSearch<'a> {
    edges: &'a FxHashMap<Name, Vec<Name>>,
    marks: FxHashMap<Name, Mark>,
    path: Vec<Name>,
}

impl CycleSearch<'_> {
    fn visit(&mut self, nt: Name) -> Option<Vec<Name>> {
        ensure_sufficient_stack(|| {
            self.marks.insert(nt, Mark::Active);
            self.path.push(nt);
            let edges = self.edges;
            for &next in edges.get(&nt).into_iter().flatten() {
                match self.marks.get(&next) {
                    Some(Mark::Active) => {
                        let from = self.path.iter().position(|&n| n == next).unwrap_or(0);
                        let mut cycle = self.path[from..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        if let Some(cycle) = self.visit(next) {
                            return Some(cycle);
                        }
                    }
                }
            }
            self.path.pop();
            self.marks.insert(nt, Mark::Done);
            None
        })
    }
}
