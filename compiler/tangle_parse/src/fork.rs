//! Fork records and the candidate manager.
//!
//! A fork is opened wherever more than one alternative of a nonterminal is
//! viable. Each alternative continues as its own candidate stack, and all
//! candidates advance in lockstep, one token per step. After each step,
//! candidates whose stacks have realigned are merged: into an Ambiguous node
//! when both alternatives were flagged ambiguous, otherwise by keeping the
//! earlier-declared one. A fork is settled once at most one of its
//! descendants is left.
//!
//! The engine drives [`ForkManager`] through parse tasks. Callers can also
//! open a fork of their own over one nonterminal with [`ForkManager::open_fork`]
//! and feed it tokens with [`ForkManager::advance`].

mod merge;
mod step;

use std::fmt;

use smallvec::SmallVec;
use tangle_grammar::{GrammarTable, Production};
use tangle_ir::{Name, NodeArena, NodeId, ProductionId, Span, SyntaxTree, Token};

use crate::expected::Failure;
use crate::stack::{Branch, CandidateId, ParseStack};
use crate::{ForkError, ParseError, ParseOptions, ParseWarning};

/// Index of a fork record.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForkId(u32);

impl ForkId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ForkId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fork#{}", self.0)
    }
}

/// A fork opened by a caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForkHandle {
    fork: ForkId,
}

impl ForkHandle {
    pub fn id(self) -> ForkId {
        self.fork
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForkStatus {
    /// Candidates are still running.
    Open,
    /// The outcome is decided; for caller forks, a node is available.
    Settled,
    Failed,
}

/// What happened to one candidate during a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Eliminate,
    /// Realigned with `into` and folded into it.
    Merge { into: CandidateId },
    /// Forked at a nested nonterminal into these candidates.
    Split { into: Vec<CandidateId> },
}

/// Result of [`ForkManager::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkAdvance {
    pub decisions: Vec<(CandidateId, Decision)>,
    pub status: ForkStatus,
}

/// How a fork was settled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForkOutcome {
    /// Alternatives realigned and were packed into an Ambiguous node.
    Merged { candidates: usize },
    /// Every other alternative died; `kept` is the survivor's index.
    Eliminated { kept: u32 },
    /// Unflagged alternatives realigned; the earlier-declared one was kept.
    Preferred { kept: u32 },
    /// The fork stayed open past the span limit.
    Forced { kept: u32 },
    Failed,
}

/// Public view of a fork record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkReport {
    pub fork: ForkId,
    pub nonterminal: Name,
    pub position: u32,
    pub alternatives: usize,
    pub ambiguous: bool,
    pub status: ForkStatus,
    pub outcome: Option<ForkOutcome>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TaskId(u32);

impl TaskId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a task must consume all input or may stop after its goal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum GoalMode {
    #[default]
    Full,
    /// Longest match; used by caller forks and recovery units.
    Prefix,
}

#[derive(Debug)]
pub(crate) struct ForkRecord {
    nonterminal: Name,
    position: u32,
    token: Option<Token>,
    alternatives: SmallVec<[ProductionId; 4]>,
    ambiguous: bool,
    task: TaskId,
    /// Opened by a caller; settled when its task finishes.
    standalone: bool,
    status: ForkStatus,
    outcome: Option<ForkOutcome>,
    /// Candidates in the node built when the alternatives were packed.
    packed: usize,
    preferred: bool,
    forced: Option<u32>,
    /// Earliest branch of this fork folded into another candidate.
    absorbed: Option<Branch>,
    node: Option<NodeId>,
}

impl ForkRecord {
    fn report(&self, fork: ForkId) -> ForkReport {
        ForkReport {
            fork,
            nonterminal: self.nonterminal,
            position: self.position,
            alternatives: self.alternatives.len(),
            ambiguous: self.ambiguous,
            status: self.status,
            outcome: self.outcome,
        }
    }

    /// Outcome once at most one descendant (`survivor`) is left.
    ///
    /// A fork whose descendants were all folded into another candidate
    /// still settles; only a fork with no surviving reading fails.
    fn conclude(&mut self, survivor: Option<Branch>) {
        let outcome = match (survivor, self.absorbed) {
            (None, None) => ForkOutcome::Failed,
            _ if self.packed > 0 => ForkOutcome::Merged {
                candidates: self.packed,
            },
            (None, Some(absorbed)) => ForkOutcome::Preferred {
                kept: absorbed.alternative,
            },
            (Some(branch), _) => {
                if let Some(kept) = self.forced {
                    ForkOutcome::Forced { kept }
                } else if self.preferred {
                    ForkOutcome::Preferred {
                        kept: branch.alternative,
                    }
                } else {
                    ForkOutcome::Eliminated {
                        kept: branch.alternative,
                    }
                }
            }
        };
        self.status = if outcome == ForkOutcome::Failed {
            ForkStatus::Failed
        } else {
            ForkStatus::Settled
        };
        self.outcome = Some(outcome);
    }
}

/// One goal being parsed: the whole input, a recovery unit, or a caller fork.
#[derive(Debug, Default)]
pub(crate) struct Task {
    id: TaskId,
    mode: GoalMode,
    position: u32,
    stacks: Vec<ParseStack>,
    /// Longest completion so far (prefix mode).
    completion: Option<ParseStack>,
    /// Forks of this task that are still open, oldest first.
    open: Vec<ForkId>,
    farthest: Option<Failure>,
    last_span: Span,
    error: Option<ParseError>,
}

impl Task {
    /// No candidate can consume more input.
    fn is_done(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Zero-width span just past the last consumed token.
    fn eof_span(&self) -> Span {
        Span::new(self.last_span.end, self.last_span.end)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub tokens: u32,
    pub forks: usize,
    pub merges: usize,
    /// Ambiguous nodes built.
    pub packed: usize,
    pub eliminated: usize,
    pub peak_candidates: usize,
    /// Nodes built, including those of dead candidates.
    pub nodes: usize,
}

#[derive(Copy, Clone, Debug)]
struct Limits {
    lookahead: usize,
    max_fork_span: u32,
    max_candidates: usize,
}

/// Candidate stacks, fork records and the node arena of one parse.
pub struct ForkManager<'g> {
    grammar: &'g GrammarTable,
    limits: Limits,
    arena: NodeArena,
    forks: Vec<ForkRecord>,
    tasks: Vec<Task>,
    next_candidate: u32,
    /// Where the next caller fork starts.
    cursor: u32,
    warnings: Vec<ParseWarning>,
    stats: ParseStats,
}

impl<'g> ForkManager<'g> {
    pub fn new(grammar: &'g GrammarTable, options: &ParseOptions) -> Self {
        ForkManager {
            grammar,
            limits: Limits {
                lookahead: options.lookahead.max(1),
                max_fork_span: options.max_fork_span,
                max_candidates: options.max_candidates.max(1),
            },
            arena: NodeArena::new(),
            forks: Vec::new(),
            tasks: Vec::new(),
            next_candidate: 0,
            cursor: 0,
            warnings: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    pub fn grammar(&self) -> &'g GrammarTable {
        self.grammar
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// A compacted copy of the subtree at `node`.
    pub fn tree(&self, node: NodeId) -> SyntaxTree {
        SyntaxTree::compact(&self.arena, node)
    }

    pub fn reports(&self) -> Vec<ForkReport> {
        self.forks
            .iter()
            .enumerate()
            .map(|(i, record)| record.report(ForkId::new(i as u32)))
            .collect()
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> ParseStats {
        ParseStats {
            nodes: self.arena.len(),
            ..self.stats
        }
    }

    /// Start tracking `candidates` (all alternatives when empty) of
    /// `nonterminal` at the current position.
    ///
    /// The fork takes the longest match: it settles once no candidate can
    /// consume more, and [`ForkManager::close_fork`] then yields its node.
    /// Productions of other nonterminals are ignored.
    pub fn open_fork(
        &mut self,
        nonterminal: Name,
        candidates: &[ProductionId],
    ) -> Result<ForkHandle, ParseError> {
        let alternatives = self.goal_alternatives(nonterminal)?;
        let chosen: SmallVec<[&Production; 4]> = alternatives
            .iter()
            .filter(|p| candidates.is_empty() || candidates.contains(&p.id))
            .collect();

        let position = self.cursor;
        let task = TaskId(self.tasks.len() as u32);
        let fork = self.open_record(nonterminal, position, None, &chosen, task, true);
        let stacks = chosen
            .iter()
            .map(|production| {
                let mut stack = ParseStack::new(self.fresh_candidate(), nonterminal, position);
                stack.lineage.push(Branch {
                    fork,
                    alternative: production.alternative,
                    ambiguous: production.ambiguous,
                });
                stack.push(production.id, position);
                stack
            })
            .collect();
        self.tasks.push(Task {
            id: task,
            mode: GoalMode::Prefix,
            position,
            stacks,
            ..Task::default()
        });
        Ok(ForkHandle { fork })
    }

    /// Feed `window[0]` to the fork's candidates, with the rest of `window`
    /// as lookahead. An empty window is the end of input.
    pub fn advance(
        &mut self,
        handle: ForkHandle,
        window: &[Token],
    ) -> Result<ForkAdvance, ForkError> {
        let record = self.caller_fork(handle)?;
        if record.status != ForkStatus::Open {
            return Ok(ForkAdvance {
                decisions: Vec::new(),
                status: record.status,
            });
        }
        let task = record.task;
        let token = window.first().copied();
        let record = &mut self.forks[handle.fork.index()];
        if record.token.is_none() {
            record.token = token;
        }

        let mut kinds: SmallVec<[Option<Name>; 4]> = window
            .iter()
            .take(self.limits.lookahead)
            .map(|t| Some(t.kind))
            .collect();
        if kinds.is_empty() {
            kinds.push(None);
        }

        let before = self.candidates(handle);
        let decisions = match self.step(task, token, &kinds, true) {
            Ok(decisions) => decisions,
            Err(error) => {
                self.tasks[task.index()].error = Some(error);
                before.into_iter().map(|c| (c, Decision::Eliminate)).collect()
            }
        };
        let status = self.settle_caller_fork(handle.fork, token.is_none());
        Ok(ForkAdvance { decisions, status })
    }

    /// The fork's node: Internal when one candidate survived, Ambiguous
    /// when several were packed.
    pub fn close_fork(&mut self, handle: ForkHandle) -> Result<NodeId, ForkError> {
        let record = self.caller_fork(handle)?;
        let nonterminal = self.grammar.name(record.nonterminal).to_string();
        let position = record.position;
        match (record.status, record.node) {
            (ForkStatus::Open, _) => Err(ForkError::StillOpen {
                nonterminal,
                position,
            }),
            (ForkStatus::Settled, Some(node)) => {
                self.cursor = self.cursor.max(self.arena.range(node).end);
                Ok(node)
            }
            (ForkStatus::Failed | ForkStatus::Settled, _) => Err(ForkError::Failed {
                nonterminal,
                position,
            }),
        }
    }

    pub fn status(&self, handle: ForkHandle) -> Result<ForkStatus, ForkError> {
        Ok(self.caller_fork(handle)?.status)
    }

    /// Live candidates of a caller fork, in rank order.
    pub fn candidates(&self, handle: ForkHandle) -> Vec<CandidateId> {
        let Ok(record) = self.caller_fork(handle) else {
            return Vec::new();
        };
        let mut stacks: Vec<&ParseStack> = self.tasks[record.task.index()].stacks.iter().collect();
        stacks.sort_by(|a, b| a.rank_cmp(b));
        stacks.iter().map(|s| s.id).collect()
    }

    /// Why a caller fork failed, if it did.
    pub fn failure(&self, handle: ForkHandle) -> Option<&ParseError> {
        let record = self.caller_fork(handle).ok()?;
        self.tasks[record.task.index()].error.as_ref()
    }

    fn caller_fork(&self, handle: ForkHandle) -> Result<&ForkRecord, ForkError> {
        self.forks
            .get(handle.fork.index())
            .filter(|record| record.standalone)
            .ok_or(ForkError::UnknownFork { fork: handle.fork })
    }

    fn settle_caller_fork(&mut self, fork: ForkId, at_end: bool) -> ForkStatus {
        let record = &self.forks[fork.index()];
        let task = &self.tasks[record.task.index()];
        if !task.is_done() && !at_end {
            return ForkStatus::Open;
        }
        let completion = task.completion.as_ref();
        let node = completion.and_then(ParseStack::root);
        let survivor = completion.and_then(|stack| stack.branch_at(fork));
        let record = &mut self.forks[fork.index()];
        record.node = node;
        if node.is_none() {
            record.absorbed = None;
        }
        record.conclude(survivor.filter(|_| node.is_some()));
        record.status
    }

    /// Alternatives of a nonterminal that may be a parse goal.
    pub(crate) fn goal_alternatives(&self, goal: Name) -> Result<&'g [Production], ParseError> {
        let grammar = self.grammar;
        match grammar.alternatives(goal) {
            Some(alternatives) if !grammar.is_hidden(goal) => Ok(alternatives),
            _ => Err(ParseError::UnknownNonterminal {
                name: grammar.name(goal).to_string(),
            }),
        }
    }

    /// Start parsing `goal` at `position`.
    pub(crate) fn begin(
        &mut self,
        goal: Name,
        mode: GoalMode,
        position: u32,
    ) -> Result<TaskId, ParseError> {
        self.goal_alternatives(goal)?;
        let id = TaskId(self.tasks.len() as u32);
        let stack = ParseStack::new(self.fresh_candidate(), goal, position);
        self.tasks.push(Task {
            id,
            mode,
            position,
            stacks: vec![stack],
            ..Task::default()
        });
        Ok(id)
    }

    pub(crate) fn is_done(&self, task: TaskId) -> bool {
        self.tasks[task.index()].is_done()
    }

    /// Root of the longest completion of a prefix task.
    pub(crate) fn completion(&self, task: TaskId) -> Option<NodeId> {
        self.tasks[task.index()]
            .completion
            .as_ref()
            .and_then(ParseStack::root)
    }

    /// Whether any candidate of `task` has died so far.
    pub(crate) fn has_failure(&self, task: TaskId) -> bool {
        self.tasks[task.index()].farthest.is_some()
    }

    fn fresh_candidate(&mut self) -> CandidateId {
        let id = CandidateId::new(self.next_candidate);
        self.next_candidate += 1;
        id
    }

    fn open_record(
        &mut self,
        nonterminal: Name,
        position: u32,
        token: Option<Token>,
        alternatives: &[&Production],
        task: TaskId,
        standalone: bool,
    ) -> ForkId {
        let fork = ForkId::new(self.forks.len() as u32);
        self.forks.push(ForkRecord {
            nonterminal,
            position,
            token,
            alternatives: alternatives.iter().map(|p| p.id).collect(),
            ambiguous: alternatives.iter().filter(|p| p.ambiguous).count() > 1,
            task,
            standalone,
            status: ForkStatus::Open,
            outcome: None,
            packed: 0,
            preferred: false,
            forced: None,
            absorbed: None,
            node: None,
        });
        self.stats.forks += 1;
        fork
    }
}
