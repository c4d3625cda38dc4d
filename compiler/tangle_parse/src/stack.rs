//! Candidate parse stacks.
//!
//! A candidate is one interpretation of the input so far: a stack of frames,
//! one per partially matched production, with a goal frame at the bottom.
//! Frames hold the children built so far; children are arena ids, so a
//! subtree built before a fork is shared by every candidate that descends
//! from it.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;
use tangle_grammar::{GrammarTable, Symbol};
use tangle_ir::{Name, NodeId, ProductionId};

use crate::fork::ForkId;

/// Identity of a candidate stack, stable while it lives.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateId(u32);

impl CandidateId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        CandidateId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FrameRule {
    /// Bottom frame: accepts one `Name` and is then complete.
    Goal(Name),
    Production(ProductionId),
}

#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub rule: FrameRule,
    pub dot: u32,
    /// Token index where this frame began.
    pub start: u32,
    pub children: SmallVec<[NodeId; 4]>,
}

impl Frame {
    /// Symbol after the dot, `None` once the frame is complete.
    pub fn expects(&self, grammar: &GrammarTable) -> Option<Symbol> {
        match self.rule {
            FrameRule::Goal(goal) => (self.dot == 0).then_some(Symbol::Nonterminal(goal)),
            FrameRule::Production(id) => grammar.production(id).symbol_at(self.dot as usize),
        }
    }
}

/// The alternative a candidate took at one fork.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Branch {
    pub fork: ForkId,
    pub alternative: u32,
    pub ambiguous: bool,
}

/// How two candidate stacks differ.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Difference {
    Identical,
    /// Same shape, one child slot differs.
    Slot { frame: usize, child: usize },
    Many,
}

#[derive(Clone, Debug)]
pub(crate) struct ParseStack {
    pub id: CandidateId,
    /// Identity at the start of the current step, for decision reports.
    pub origin: CandidateId,
    pub frames: Vec<Frame>,
    /// Branches taken at forks that are still open. Lexicographic order on
    /// lineages is the candidate rank: lower means declared earlier.
    pub lineage: SmallVec<[Branch; 2]>,
}

impl ParseStack {
    pub fn new(id: CandidateId, goal: Name, position: u32) -> Self {
        ParseStack {
            id,
            origin: id,
            frames: vec![Frame {
                rule: FrameRule::Goal(goal),
                dot: 0,
                start: position,
                children: SmallVec::new(),
            }],
            lineage: SmallVec::new(),
        }
    }

    #[inline]
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn push(&mut self, production: ProductionId, position: u32) {
        self.frames.push(Frame {
            rule: FrameRule::Production(production),
            dot: 0,
            start: position,
            children: SmallVec::new(),
        });
    }

    /// The goal frame holds its node.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.frames.as_slice(),
            [Frame {
                rule: FrameRule::Goal(_),
                dot: 1,
                ..
            }]
        )
    }

    /// Root node of a complete stack.
    pub fn root(&self) -> Option<NodeId> {
        if !self.is_complete() {
            return None;
        }
        self.frames[0].children.first().copied()
    }

    pub fn rank_cmp(&self, other: &ParseStack) -> Ordering {
        self.lineage.cmp(&other.lineage)
    }

    /// Branches of the first fork where the two lineages part.
    pub fn divergence(&self, other: &ParseStack) -> Option<(Branch, Branch)> {
        let (&a, &b) = self
            .lineage
            .iter()
            .zip(other.lineage.iter())
            .find(|(a, b)| a != b)?;
        (a.fork == b.fork).then_some((a, b))
    }

    pub fn branch_at(&self, fork: ForkId) -> Option<Branch> {
        self.lineage.iter().copied().find(|b| b.fork == fork)
    }

    pub fn difference(&self, other: &ParseStack) -> Difference {
        if self.frames.len() != other.frames.len() {
            return Difference::Many;
        }
        let same_shape = self.frames.iter().zip(&other.frames).all(|(a, b)| {
            a.rule == b.rule
                && a.dot == b.dot
                && a.start == b.start
                && a.children.len() == b.children.len()
        });
        if !same_shape {
            return Difference::Many;
        }

        let mut found = None;
        for (frame, (a, b)) in self.frames.iter().zip(&other.frames).enumerate() {
            for (child, (x, y)) in a.children.iter().zip(&b.children).enumerate() {
                if x != y {
                    if found.is_some() {
                        return Difference::Many;
                    }
                    found = Some(Difference::Slot { frame, child });
                }
            }
        }
        found.unwrap_or(Difference::Identical)
    }
}

#[cfg(test)]
mod tests;
