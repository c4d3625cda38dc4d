//! One lockstep step of a task: closure, merge, shift.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tangle_grammar::{Production, Symbol};
use tangle_ir::{Name, NodeId, Token, TokenRange};
use tracing::{trace, warn};

use super::{Decision, ForkId, ForkManager, ForkStatus, GoalMode, Task, TaskId};
use crate::error::{found_name, AmbiguityContext};
use crate::expected::{Expected, Failure};
use crate::lookahead;
use crate::stack::{Branch, CandidateId, FrameRule, ParseStack};
use crate::{ParseError, ParseWarning, SyntaxError};

type Lineage = SmallVec<[Branch; 2]>;

/// Bookkeeping for per-candidate decisions.
#[derive(Default)]
pub(super) struct StepLog {
    track: bool,
    split: FxHashSet<CandidateId>,
    merged: FxHashMap<CandidateId, CandidateId>,
}

impl StepLog {
    pub(super) fn merged(&mut self, origin: CandidateId, into: CandidateId) {
        if self.track {
            self.merged.entry(origin).or_insert(into);
        }
    }

    fn split(&mut self, origin: CandidateId) {
        if self.track {
            self.split.insert(origin);
        }
    }

    fn decisions(&self, before: &[CandidateId], task: &Task) -> Vec<(CandidateId, Decision)> {
        before
            .iter()
            .map(|&origin| {
                let live: Vec<CandidateId> = task
                    .stacks
                    .iter()
                    .chain(task.completion.iter())
                    .filter(|s| s.origin == origin)
                    .map(|s| s.id)
                    .collect();
                let decision = if !self.split.contains(&origin) && live == [origin] {
                    Decision::Continue
                } else if !live.is_empty() {
                    Decision::Split { into: live }
                } else if let Some(&into) = self.merged.get(&origin) {
                    Decision::Merge { into }
                } else {
                    Decision::Eliminate
                };
                (origin, decision)
            })
            .collect()
    }
}

/// Stacks produced by closing every candidate of a step.
#[derive(Default)]
struct Closure {
    ready: Vec<ParseStack>,
    completed: Vec<ParseStack>,
    dying: Vec<Lineage>,
    log: StepLog,
}

impl<'g> ForkManager<'g> {
    /// Advance `task` by one token (`None` = end of input). `window` holds
    /// the kinds of the token and of the lookahead behind it.
    pub(crate) fn step(
        &mut self,
        task: TaskId,
        token: Option<Token>,
        window: &[Option<Name>],
        track: bool,
    ) -> Result<Vec<(CandidateId, Decision)>, ParseError> {
        let mut state = std::mem::take(&mut self.tasks[task.index()]);
        let result = self.step_task(&mut state, token, window, track);
        if result.is_err() {
            state.stacks.clear();
        }
        self.tasks[task.index()] = state;
        result
    }

    fn step_task(
        &mut self,
        task: &mut Task,
        token: Option<Token>,
        window: &[Option<Name>],
        track: bool,
    ) -> Result<Vec<(CandidateId, Decision)>, ParseError> {
        let position = task.position;
        let before: Vec<CandidateId> = if track {
            task.stacks.iter().map(|s| s.id).collect()
        } else {
            Vec::new()
        };
        let mut closure = Closure {
            log: StepLog {
                track,
                ..StepLog::default()
            },
            ..Closure::default()
        };

        for mut stack in std::mem::take(&mut task.stacks) {
            stack.origin = stack.id;
            self.close(task, stack, token, window, &mut closure);
        }

        let live = closure.ready.len() + closure.completed.len();
        self.stats.peak_candidates = self.stats.peak_candidates.max(live);
        if live > self.limits.max_candidates {
            return Err(ParseError::CandidateLimit {
                limit: self.limits.max_candidates,
                position,
            });
        }

        let Closure {
            mut ready,
            mut completed,
            mut dying,
            mut log,
        } = closure;
        self.merge(&mut ready, &mut log);
        self.merge(&mut completed, &mut log);
        self.force_long_forks(task, &mut ready);

        let mut survivors = Vec::with_capacity(ready.len());
        for mut stack in ready {
            let expected = stack.top().and_then(|frame| frame.expects(self.grammar));
            match (token, expected) {
                (Some(token), Some(Symbol::Terminal(kind))) if kind == token.kind => {
                    let leaf = self.arena.alloc_leaf(token, position);
                    if let Some(top) = stack.frames.last_mut() {
                        top.children.push(leaf);
                        top.dot += 1;
                    }
                    survivors.push(stack);
                }
                (None, _) if stack.is_complete() => survivors.push(stack),
                (_, expected) => {
                    let expected = match expected {
                        Some(symbol) => Expected::Symbol(symbol.name()),
                        None => Expected::End,
                    };
                    self.die(task, stack, token, [expected], &mut dying);
                }
            }
        }
        if let Some(token) = token.filter(|_| !survivors.is_empty()) {
            task.position += 1;
            task.last_span = token.span;
            self.stats.tokens = self.stats.tokens.max(task.position);
        }

        if !completed.is_empty() {
            completed.sort_by(ParseStack::rank_cmp);
            let rest = completed.split_off(1);
            for extra in &rest {
                log.merged(extra.origin, completed[0].id);
                self.fold_lineage(&completed[0], extra);
            }
            task.completion = completed.pop();
        }
        task.stacks = survivors;

        let error = (task.stacks.is_empty() && task.completion.is_none())
            .then(|| self.all_died(task, &dying));
        self.settle(task);
        if let Some(error) = error {
            return Err(error);
        }
        Ok(if track {
            log.decisions(&before, task)
        } else {
            Vec::new()
        })
    }

    /// Expand and reduce `stack` until it waits for a terminal, completes
    /// its goal or dies. Forks push one stack per viable alternative.
    fn close(
        &mut self,
        task: &mut Task,
        stack: ParseStack,
        token: Option<Token>,
        window: &[Option<Name>],
        out: &mut Closure,
    ) {
        let grammar = self.grammar;
        let lookahead = token.map(|t| t.kind);
        let mut work = vec![stack];

        'stacks: while let Some(mut stack) = work.pop() {
            loop {
                let Some(frame) = stack.top() else {
                    continue 'stacks;
                };
                match frame.expects(grammar) {
                    None if stack.frames.len() == 1 => {
                        match task.mode {
                            GoalMode::Full => out.ready.push(stack),
                            GoalMode::Prefix => out.completed.push(stack),
                        }
                        continue 'stacks;
                    }
                    None => self.reduce(&mut stack, task.position),
                    Some(Symbol::Terminal(_)) => {
                        out.ready.push(stack);
                        continue 'stacks;
                    }
                    Some(Symbol::Nonterminal(nt)) => {
                        let viable = self.predict(&stack, nt, lookahead, window, task.mode);
                        match viable.as_slice() {
                            [] => {
                                let expected = grammar
                                    .leading_symbols(nt)
                                    .into_iter()
                                    .map(Expected::Symbol);
                                self.die(task, stack, token, expected, &mut out.dying);
                                continue 'stacks;
                            }
                            [only] => stack.push(only.id, task.position),
                            several => {
                                let fork = self.open_record(
                                    nt,
                                    task.position,
                                    token,
                                    several,
                                    task.id,
                                    false,
                                );
                                task.open.push(fork);
                                trace!(
                                    ?fork,
                                    nonterminal = grammar.name(nt),
                                    position = task.position,
                                    alternatives = several.len(),
                                    "fork opened"
                                );
                                out.log.split(stack.origin);
                                for production in several.iter().rev() {
                                    let mut child = stack.clone();
                                    child.id = self.fresh_candidate();
                                    child.lineage.push(Branch {
                                        fork,
                                        alternative: production.alternative,
                                        ambiguous: production.ambiguous,
                                    });
                                    child.push(production.id, task.position);
                                    work.push(child);
                                }
                                continue 'stacks;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Alternatives of `nt` worth trying at this token.
    fn predict(
        &self,
        stack: &ParseStack,
        nt: Name,
        lookahead: Option<Name>,
        window: &[Option<Name>],
        mode: GoalMode,
    ) -> SmallVec<[&'g Production; 4]> {
        let grammar = self.grammar;
        let alternatives = grammar.alternatives(nt).unwrap_or(&[]);
        let viable: SmallVec<[&Production; 4]> = alternatives
            .iter()
            .filter(|p| grammar.predicts(p.id, lookahead))
            .collect();
        let may_stop = mode == GoalMode::Prefix || lookahead.is_none();
        if viable.is_empty() && may_stop && self.can_stop_after(stack) {
            // FOLLOW sets only know the end of input after the start symbol;
            // other goals may end here too.
            return alternatives
                .iter()
                .find(|p| grammar.is_production_nullable(p.id))
                .into_iter()
                .collect();
        }
        if viable.len() < 2 || window.len() < 2 {
            return viable;
        }
        let prefix = mode == GoalMode::Prefix;
        let pruned: SmallVec<[&Production; 4]> = viable
            .iter()
            .copied()
            .filter(|p| lookahead::survives(grammar, stack, p.id, window, prefix))
            .collect();
        // If nothing survives, let the real parse find where it breaks.
        if pruned.is_empty() {
            viable
        } else {
            pruned
        }
    }

    /// Whether every frame of `stack` can complete without more input once
    /// the nonterminal at the top frame's dot derives nothing.
    fn can_stop_after(&self, stack: &ParseStack) -> bool {
        let grammar = self.grammar;
        stack.frames.iter().all(|frame| match frame.rule {
            FrameRule::Goal(_) => true,
            FrameRule::Production(id) => grammar.production(id).rhs[frame.dot as usize + 1..]
                .iter()
                .all(|symbol| match *symbol {
                    Symbol::Terminal(_) => false,
                    Symbol::Nonterminal(nt) => grammar.is_nullable(nt),
                }),
        })
    }

    /// Pop a completed production frame into its parent.
    fn reduce(&mut self, stack: &mut ParseStack, position: u32) {
        let Some(frame) = stack.frames.pop() else {
            return;
        };
        let FrameRule::Production(id) = frame.rule else {
            return;
        };
        let production = self.grammar.production(id);
        let child = if self.grammar.is_hidden(production.lhs) {
            None
        } else {
            Some(self.arena.alloc_internal(
                id,
                production.label,
                TokenRange::new(frame.start, position),
                &frame.children,
            ))
        };
        let Some(parent) = stack.frames.last_mut() else {
            return;
        };
        match child {
            Some(node) => parent.children.push(node),
            None => parent.children.extend(frame.children),
        }
        parent.dot += 1;
    }

    fn die(
        &mut self,
        task: &mut Task,
        stack: ParseStack,
        token: Option<Token>,
        expected: impl IntoIterator<Item = Expected>,
        dying: &mut Vec<Lineage>,
    ) {
        trace!(candidate = ?stack.id, position = task.position, "candidate eliminated");
        Failure::record(&mut task.farthest, task.position, token, expected);
        dying.push(stack.lineage);
        self.stats.eliminated += 1;
    }

    /// Keep only the lowest-ranked descendant of forks open for too long.
    fn force_long_forks(&mut self, task: &Task, ready: &mut Vec<ParseStack>) {
        for &fork in &task.open {
            let record = &self.forks[fork.index()];
            if task.position.saturating_sub(record.position) <= self.limits.max_fork_span
                || record.forced.is_some()
            {
                continue;
            }
            let Some(best) = ready
                .iter()
                .filter(|s| s.branch_at(fork).is_some())
                .min_by(|a, b| a.rank_cmp(b))
                .map(|s| s.id)
            else {
                continue;
            };
            let before = ready.len();
            ready.retain(|s| s.id == best || s.branch_at(fork).is_none());
            let dropped = before - ready.len();
            if dropped == 0 {
                continue;
            }
            let kept = ready
                .iter()
                .find(|s| s.id == best)
                .and_then(|s| s.branch_at(fork))
                .map_or(0, |b| b.alternative);
            let nonterminal = self.grammar.name(record.nonterminal);
            let position = record.position;
            warn!(
                nonterminal,
                position, kept, dropped, "fork exceeded its span; keeping earliest alternative"
            );
            self.warnings.push(ParseWarning::ForcedResolution {
                nonterminal: nonterminal.to_string(),
                position,
                kept,
                dropped,
            });
            self.forks[fork.index()].forced = Some(kept);
            self.stats.eliminated += dropped;
        }
    }

    /// Conclude forks with at most one live descendant and drop them from
    /// every lineage; the remaining lineages rank candidates by open forks only.
    fn settle(&mut self, task: &mut Task) {
        if task.open.is_empty() {
            return;
        }
        let mut live: FxHashMap<ForkId, (usize, Branch)> = FxHashMap::default();
        for stack in task.stacks.iter().chain(task.completion.iter()) {
            for &branch in &stack.lineage {
                live.entry(branch.fork).or_insert((0, branch)).0 += 1;
            }
        }

        let mut settled: SmallVec<[ForkId; 4]> = SmallVec::new();
        task.open.retain(|&fork| {
            let (count, branch) = live.get(&fork).copied().unzip();
            if count.unwrap_or(0) > 1 {
                return true;
            }
            let record = &mut self.forks[fork.index()];
            record.conclude(branch);
            trace!(?fork, outcome = ?record.outcome, "fork settled");
            settled.push(fork);
            false
        });
        if settled.is_empty() {
            return;
        }
        for stack in task.stacks.iter_mut().chain(task.completion.iter_mut()) {
            stack.lineage.retain(|b| !settled.contains(&b.fork));
        }
    }

    /// The error for a step that left no candidate.
    fn all_died(&self, task: &Task, dying: &[Lineage]) -> ParseError {
        let eof = task.eof_span();
        let Some(farthest) = task.farthest.as_ref() else {
            return SyntaxError {
                position: task.position,
                expected: Vec::new(),
                found: "<eof>".to_string(),
                found_token: None,
                span: eof,
                ambiguity: None,
            }
            .into();
        };
        let fallback = SyntaxError::from_failure(self.grammar, farthest, eof);
        let Some(fork) = self.shared_ambiguous_fork(dying) else {
            return fallback.into();
        };

        let record = &self.forks[fork.index()];
        let nonterminal = self.grammar.name(record.nonterminal).to_string();
        SyntaxError {
            position: record.position,
            expected: vec![nonterminal.clone()],
            found: found_name(self.grammar, record.token),
            found_token: record.token,
            span: record.token.map_or(eof, |t| t.span),
            ambiguity: Some(AmbiguityContext {
                fork,
                nonterminal,
                alternatives: record.alternatives.len(),
                farthest_position: fallback.position,
                farthest_expected: fallback.expected,
                farthest_found: fallback.found,
                farthest_span: fallback.span,
            }),
        }
        .into()
    }

    /// Innermost open fork that every dying candidate entered through an
    /// ambiguous alternative.
    fn shared_ambiguous_fork(&self, dying: &[Lineage]) -> Option<ForkId> {
        let (first, rest) = dying.split_first()?;
        first
            .iter()
            .rev()
            .filter(|b| b.ambiguous && self.forks[b.fork.index()].status == ForkStatus::Open)
            .find(|b| {
                rest.iter()
                    .all(|lineage| lineage.iter().any(|o| o.fork == b.fork && o.ambiguous))
            })
            .map(|b| b.fork)
    }

    /// The error of a task that finished without a usable result.
    pub(crate) fn stalled(&self, task: TaskId) -> ParseError {
        let state = &self.tasks[task.index()];
        state.error.clone().unwrap_or_else(|| self.all_died(state, &[]))
    }

    /// Accept the end of input for a full task and return its root.
    pub(crate) fn accept(&mut self, task: TaskId) -> Result<NodeId, ParseError> {
        self.step(task, None, &[None], false)?;
        let state = &self.tasks[task.index()];
        state
            .stacks
            .iter()
            .min_by(|a, b| a.rank_cmp(b))
            .and_then(ParseStack::root)
            .ok_or_else(|| self.all_died(state, &[]))
    }
}
