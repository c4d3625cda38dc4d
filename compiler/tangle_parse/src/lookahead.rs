//! Bounded speculative lookahead.
//!
//! Before opening a fork the engine asks, for each predicted alternative,
//! whether the candidate could consume the next few tokens at all. The
//! simulation only tracks `(rule, dot)` pairs: it builds no nodes, opens no
//! forks, and copies frames of the real stack lazily as it reduces into them.

use smallvec::{smallvec, SmallVec};
use tangle_grammar::{GrammarTable, Symbol};
use tangle_ir::{Name, ProductionId};

use crate::stack::{Frame, FrameRule, ParseStack};

/// Steps one speculation may take before it gives up and answers "maybe".
const BUDGET: u32 = 256;

#[derive(Clone)]
struct Sim<'s> {
    base: &'s [Frame],
    /// Frames of `base` not yet copied or popped.
    below: usize,
    frames: SmallVec<[(FrameRule, u32); 8]>,
}

impl Sim<'_> {
    fn top(&self) -> Option<(FrameRule, u32)> {
        if let Some(&top) = self.frames.last() {
            return Some(top);
        }
        let frame = &self.base[self.below.checked_sub(1)?];
        Some((frame.rule, frame.dot))
    }

    fn pop(&mut self) {
        if self.frames.pop().is_none() {
            self.below = self.below.saturating_sub(1);
        }
    }

    fn advance(&mut self) {
        if self.frames.is_empty() {
            let Some(top) = self.top() else { return };
            self.below -= 1;
            self.frames.push(top);
        }
        if let Some(top) = self.frames.last_mut() {
            top.1 += 1;
        }
    }
}

struct Speculation<'g> {
    grammar: &'g GrammarTable,
    prefix: bool,
    budget: u32,
}

/// Whether `stack`, having just predicted `production`, can consume every
/// kind in `window` (`None` = end of input). A prefix-mode stack may also
/// finish early.
pub(crate) fn survives(
    grammar: &GrammarTable,
    stack: &ParseStack,
    production: ProductionId,
    window: &[Option<Name>],
    prefix: bool,
) -> bool {
    let sim = Sim {
        base: &stack.frames,
        below: stack.frames.len(),
        frames: smallvec![(FrameRule::Production(production), 0)],
    };
    let mut speculation = Speculation {
        grammar,
        prefix,
        budget: BUDGET,
    };
    speculation.run(sim, window)
}

impl Speculation<'_> {
    fn run(&mut self, mut sim: Sim<'_>, mut window: &[Option<Name>]) -> bool {
        loop {
            let Some(&lookahead) = window.first() else {
                return true;
            };
            if self.budget == 0 {
                return true;
            }
            self.budget -= 1;

            let Some((rule, dot)) = sim.top() else {
                return false;
            };
            let expected = match rule {
                FrameRule::Goal(goal) if dot == 0 => Some(Symbol::Nonterminal(goal)),
                FrameRule::Goal(_) => return self.prefix || lookahead.is_none(),
                FrameRule::Production(id) => self.grammar.production(id).symbol_at(dot as usize),
            };

            match expected {
                None => {
                    sim.pop();
                    sim.advance();
                }
                Some(Symbol::Terminal(kind)) => {
                    if lookahead != Some(kind) {
                        return false;
                    }
                    sim.advance();
                    window = &window[1..];
                }
                Some(Symbol::Nonterminal(nt)) => {
                    let grammar = self.grammar;
                    let viable: SmallVec<[ProductionId; 4]> = grammar
                        .alternatives(nt)
                        .unwrap_or(&[])
                        .iter()
                        .filter(|p| grammar.predicts(p.id, lookahead))
                        .map(|p| p.id)
                        .collect();
                    match viable.as_slice() {
                        [] => return false,
                        [only] => sim.frames.push((FrameRule::Production(*only), 0)),
                        several => {
                            return several.iter().any(|&id| {
                                let mut branch = sim.clone();
                                branch.frames.push((FrameRule::Production(id), 0));
                                self.run(branch, window)
                            });
                        }
                    }
                }
            }
        }
    }
}
