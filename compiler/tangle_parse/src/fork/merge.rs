//! Merging realigned candidates.
//!
//! Two realigned stacks differ in one child slot. The two subtrees in that
//! slot are walked down together while they share a production and differ
//! in a single child; the readings are combined where they actually part,
//! and the shared spine above is rebuilt around the result. An ambiguity
//! nested inside each candidate of an outer one is thus packed at its own
//! nonterminal, not multiplied out at the outer node.

use smallvec::SmallVec;
use tangle_ir::stack::ensure_sufficient_stack;
use tangle_ir::{Name, NodeId, SyntaxNode};
use tracing::trace;

use super::step::StepLog;
use super::{ForkId, ForkManager};
use crate::stack::{Branch, Difference, ParseStack};

/// Lineages of the two stacks being merged.
struct Readings<'a> {
    keep: &'a [Branch],
    other: &'a [Branch],
    /// Branches at the first fork where the lineages part.
    divergence: Option<(Branch, Branch)>,
}

/// How two subtrees over the same range line up.
enum Alignment {
    Same,
    /// Same production; only this child differs.
    Child(usize),
    Apart,
}

impl ForkManager<'_> {
    /// Fold together every pair of stacks that differ in at most one child
    /// slot. The lower-ranked stack of a pair survives.
    pub(super) fn merge(&mut self, stacks: &mut Vec<ParseStack>, log: &mut StepLog) {
        if stacks.len() < 2 {
            return;
        }
        stacks.sort_by(ParseStack::rank_cmp);
        let mut i = 0;
        while i < stacks.len() {
            let mut j = i + 1;
            while j < stacks.len() {
                match stacks[i].difference(&stacks[j]) {
                    Difference::Many => j += 1,
                    difference => {
                        let other = stacks.remove(j);
                        self.absorb(&mut stacks[i], &other, difference, log);
                    }
                }
            }
            i += 1;
        }
    }

    fn absorb(
        &mut self,
        keep: &mut ParseStack,
        other: &ParseStack,
        difference: Difference,
        log: &mut StepLog,
    ) {
        log.merged(other.origin, keep.id);
        self.stats.merges += 1;
        self.fold_lineage(keep, other);
        let readings = Readings {
            keep: &keep.lineage,
            other: &other.lineage,
            divergence: keep.divergence(other),
        };

        match difference {
            Difference::Slot { frame, child } => {
                let kept = keep.frames[frame].children[child];
                let theirs = other.frames[frame].children[child];
                let joined = self.join(kept, theirs, &readings);
                keep.frames[frame].children[child] = joined;
            }
            Difference::Identical | Difference::Many => {
                if let Some((ours, _)) = readings.divergence {
                    self.prefer(ours.fork, ours.alternative);
                }
            }
        }
    }

    /// Record on each fork `other` entered that one of its descendants was
    /// folded into `keep` rather than eliminated.
    pub(super) fn fold_lineage(&mut self, keep: &ParseStack, other: &ParseStack) {
        for &branch in &other.lineage {
            if keep.branch_at(branch.fork).is_some() {
                continue;
            }
            let absorbed = &mut self.forks[branch.fork.index()].absorbed;
            if !absorbed.is_some_and(|a| a.alternative <= branch.alternative) {
                *absorbed = Some(branch);
            }
        }
    }

    /// One subtree holding the readings of both `first` and `second`.
    /// `first` comes from the lower-ranked stack.
    fn join(&mut self, first: NodeId, second: NodeId, readings: &Readings<'_>) -> NodeId {
        ensure_sufficient_stack(|| self.join_inner(first, second, readings))
    }

    fn join_inner(&mut self, first: NodeId, second: NodeId, readings: &Readings<'_>) -> NodeId {
        match (*self.arena.get(first), *self.arena.get(second)) {
            (_, SyntaxNode::Ambiguous { candidates, .. }) => {
                let theirs: SmallVec<[NodeId; 4]> = self.arena.list(candidates).into();
                let mut joined = first;
                for candidate in theirs {
                    joined = self.join(joined, candidate, readings);
                }
                joined
            }
            (
                SyntaxNode::Ambiguous {
                    nonterminal,
                    range,
                    candidates,
                },
                SyntaxNode::Internal { .. },
            ) => {
                let mut ours: SmallVec<[NodeId; 4]> = self.arena.list(candidates).into();
                let aligned = ours
                    .iter()
                    .enumerate()
                    .find_map(|(i, &c)| match self.align(c, second) {
                        Alignment::Same => Some((i, None)),
                        Alignment::Child(child) => Some((i, Some(child))),
                        Alignment::Apart => None,
                    });
                match aligned {
                    Some((_, None)) => first,
                    Some((i, Some(child))) => {
                        ours[i] = self.join_child(ours[i], second, child, readings);
                        self.arena.alloc_ambiguous(nonterminal, range, &ours)
                    }
                    None => self.combine(first, second, readings),
                }
            }
            _ => match self.align(first, second) {
                Alignment::Same => first,
                Alignment::Child(child) => self.join_child(first, second, child, readings),
                Alignment::Apart => self.combine(first, second, readings),
            },
        }
    }

    /// Rebuild `first` with its `child`-th child joined with the one of
    /// `second`.
    fn join_child(
        &mut self,
        first: NodeId,
        second: NodeId,
        child: usize,
        readings: &Readings<'_>,
    ) -> NodeId {
        let SyntaxNode::Internal {
            production,
            label,
            range,
            children,
        } = *self.arena.get(first)
        else {
            return first;
        };
        let mut ours: SmallVec<[NodeId; 4]> = self.arena.list(children).into();
        let theirs = self.arena.children(second)[child];
        ours[child] = self.join(ours[child], theirs, readings);
        self.arena.alloc_internal(production, label, range, &ours)
    }

    fn align(&self, a: NodeId, b: NodeId) -> Alignment {
        if self.same(a, b) {
            return Alignment::Same;
        }
        let (Some(pa), Some(pb)) = (self.arena.get(a).production(), self.arena.get(b).production())
        else {
            return Alignment::Apart;
        };
        let (ours, theirs) = (self.arena.children(a), self.arena.children(b));
        if pa != pb || ours.len() != theirs.len() {
            return Alignment::Apart;
        }
        let mut differing = ours
            .iter()
            .zip(theirs)
            .enumerate()
            .filter(|&(_, (&x, &y))| !self.same(x, y))
            .map(|(i, _)| i);
        match (differing.next(), differing.next()) {
            (None, _) => Alignment::Same,
            (Some(child), None) => Alignment::Child(child),
            (Some(_), Some(_)) => Alignment::Apart,
        }
    }

    /// Same node, or leaves for the same input token.
    fn same(&self, a: NodeId, b: NodeId) -> bool {
        a == b
            || matches!(
                (self.arena.get(a), self.arena.get(b)),
                (
                    SyntaxNode::Leaf { position: x, .. },
                    SyntaxNode::Leaf { position: y, .. },
                ) if x == y
            )
    }

    /// Two different readings of one range: packed when both are flagged
    /// ambiguous, otherwise `first` is kept.
    fn combine(&mut self, first: NodeId, second: NodeId, readings: &Readings<'_>) -> NodeId {
        let Some(nonterminal) = self.nonterminal_of(first) else {
            self.prefer_divergence(readings);
            return first;
        };
        let position = self.arena.range(first).start;
        let site = self.fork_at(nonterminal, position, readings);

        let same_production = matches!(
            (self.arena.get(first).production(), self.arena.get(second).production()),
            (Some(a), Some(b)) if a == b
        );
        let ambiguous = if same_production {
            readings
                .divergence
                .is_some_and(|(ours, theirs)| ours.ambiguous && theirs.ambiguous)
        } else {
            self.flagged(first) && self.flagged(second)
        };
        if !ambiguous {
            match site {
                Some(fork) => {
                    let kept = self.alternative_of(first);
                    self.prefer(fork, kept);
                }
                None => self.prefer_divergence(readings),
            }
            return first;
        }

        let mut candidates: SmallVec<[NodeId; 4]> = match *self.arena.get(first) {
            SyntaxNode::Ambiguous { candidates, .. } => self.arena.list(candidates).into(),
            SyntaxNode::Leaf { .. } | SyntaxNode::Internal { .. } => SmallVec::from_elem(first, 1),
        };
        candidates.push(second);
        let range = self.arena.range(first);
        let node = self
            .arena
            .alloc_ambiguous(nonterminal, range, &candidates);
        self.stats.packed += 1;
        if let Some(fork) = site {
            self.forks[fork.index()].packed = candidates.len();
        }
        trace!(
            fork = ?site,
            nonterminal = self.grammar.name(nonterminal),
            candidates = candidates.len(),
            "ambiguity packed"
        );
        node
    }

    /// The fork over `nonterminal` at `position` that produced the readings
    /// being combined, falling back to where the lineages part.
    fn fork_at(&self, nonterminal: Name, position: u32, readings: &Readings<'_>) -> Option<ForkId> {
        readings
            .other
            .iter()
            .chain(readings.keep)
            .map(|b| b.fork)
            .find(|fork| {
                let record = &self.forks[fork.index()];
                record.nonterminal == nonterminal && record.position == position
            })
            .or(readings.divergence.map(|(ours, _)| ours.fork))
    }

    fn nonterminal_of(&self, node: NodeId) -> Option<Name> {
        match *self.arena.get(node) {
            SyntaxNode::Leaf { .. } => None,
            SyntaxNode::Internal { production, .. } => {
                Some(self.grammar.production(production).lhs)
            }
            SyntaxNode::Ambiguous { nonterminal, .. } => Some(nonterminal),
        }
    }

    /// Whether a reading came from an alternative flagged ambiguous.
    fn flagged(&self, node: NodeId) -> bool {
        match *self.arena.get(node) {
            SyntaxNode::Leaf { .. } => false,
            SyntaxNode::Internal { production, .. } => {
                self.grammar.production(production).ambiguous
            }
            SyntaxNode::Ambiguous { .. } => true,
        }
    }

    /// Declaration index of a reading; the first candidate's for an
    /// Ambiguous node.
    fn alternative_of(&self, node: NodeId) -> u32 {
        let node = match *self.arena.get(node) {
            SyntaxNode::Ambiguous { candidates, .. } => {
                self.arena.list(candidates).first().copied().unwrap_or(node)
            }
            SyntaxNode::Leaf { .. } | SyntaxNode::Internal { .. } => node,
        };
        self.arena
            .get(node)
            .production()
            .map_or(0, |p| self.grammar.production(p).alternative)
    }

    fn prefer_divergence(&mut self, readings: &Readings<'_>) {
        if let Some((ours, _)) = readings.divergence {
            self.prefer(ours.fork, ours.alternative);
        }
    }

    fn prefer(&mut self, fork: ForkId, kept: u32) {
        self.forks[fork.index()].preferred = true;
        trace!(?fork, kept, "earlier alternative kept");
    }
}
