//! Push-mode parsing.

use std::collections::VecDeque;

use smallvec::SmallVec;
use tangle_grammar::GrammarTable;
use tangle_ir::{Name, SyntaxNode, SyntaxTree, Token};
use tracing::debug;

use crate::fork::{GoalMode, TaskId};
use crate::{ForkManager, ForkReport, ParseError, ParseOptions, ParseStats, ParseWarning};

/// Everything a successful parse produces.
#[derive(Clone, Debug)]
pub struct ParseOutput {
    pub tree: SyntaxTree,
    pub forks: Vec<ForkReport>,
    pub warnings: Vec<ParseWarning>,
    pub stats: ParseStats,
}

/// A parse fed one token at a time.
///
/// The host may stop between tokens for as long as it likes; all state
/// lives here. Tokens are held back until the lookahead window behind them
/// is known, so `feed` may report an error for an earlier token. After an
/// error every call returns that error again.
pub struct ParseSession<'g> {
    manager: ForkManager<'g>,
    task: TaskId,
    pending: VecDeque<Token>,
    lookahead: usize,
    options: ParseOptions,
    fed: u32,
    error: Option<ParseError>,
}

impl<'g> ParseSession<'g> {
    /// Parse the grammar's start symbol.
    pub fn new(grammar: &'g GrammarTable, options: ParseOptions) -> Result<Self, ParseError> {
        Self::with_start(grammar, options, grammar.start())
    }

    pub fn with_start(
        grammar: &'g GrammarTable,
        options: ParseOptions,
        start: Name,
    ) -> Result<Self, ParseError> {
        let mut manager = ForkManager::new(grammar, &options);
        let task = manager.begin(start, GoalMode::Full, 0)?;
        Ok(ParseSession {
            manager,
            task,
            pending: VecDeque::with_capacity(options.lookahead),
            lookahead: options.lookahead.max(1),
            options,
            fed: 0,
            error: None,
        })
    }

    /// Tokens fed so far.
    pub fn position(&self) -> u32 {
        self.fed
    }

    pub fn feed(&mut self, token: Token) -> Result<(), ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.options.is_cancelled() {
            return Err(self.fail(ParseError::Cancelled));
        }
        self.fed += 1;
        self.pending.push_back(token);
        if self.pending.len() >= self.lookahead {
            self.step(false)?;
        }
        Ok(())
    }

    /// Signal the end of input and build the tree.
    pub fn finish(mut self) -> Result<ParseOutput, ParseError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        while !self.pending.is_empty() {
            self.step(true)?;
        }
        let root = self.manager.accept(self.task)?;
        let tree = self.manager.tree(root);
        let mut warnings = self.manager.warnings().to_vec();
        warnings.extend(unresolved(&tree, self.manager.grammar()));
        let stats = self.manager.stats();
        debug!(
            tokens = stats.tokens,
            forks = stats.forks,
            merges = stats.merges,
            packed = stats.packed,
            nodes = stats.nodes,
            "parse finished"
        );
        Ok(ParseOutput {
            tree,
            forks: self.manager.reports(),
            warnings,
            stats,
        })
    }

    fn step(&mut self, at_end: bool) -> Result<(), ParseError> {
        let mut window: SmallVec<[Option<Name>; 4]> = self
            .pending
            .iter()
            .take(self.lookahead)
            .map(|t| Some(t.kind))
            .collect();
        if at_end && window.len() < self.lookahead {
            window.push(None);
        }
        let Some(token) = self.pending.pop_front() else {
            return Ok(());
        };
        match self.manager.step(self.task, Some(token), &window, false) {
            Ok(_) => Ok(()),
            Err(error) => Err(self.fail(error)),
        }
    }

    fn fail(&mut self, error: ParseError) -> ParseError {
        self.error = Some(error.clone());
        error
    }
}

/// One warning per Ambiguous node left in `tree`.
pub(crate) fn unresolved<'a>(
    tree: &'a SyntaxTree,
    grammar: &'a GrammarTable,
) -> impl Iterator<Item = ParseWarning> + 'a {
    tree.ambiguities().into_iter().filter_map(move |id| match *tree.node(id) {
        SyntaxNode::Ambiguous {
            nonterminal, range, ..
        } => Some(ParseWarning::UnresolvedAmbiguity {
            nonterminal: grammar.name(nonterminal).to_string(),
            range,
            candidates: tree.children(id).len(),
        }),
        SyntaxNode::Leaf { .. } | SyntaxNode::Internal { .. } => None,
    })
}

#[cfg(test)]
mod tests;
