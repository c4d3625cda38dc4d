//! Parsing a sequence of units, skipping past the broken ones.
//!
//! Each unit is parsed as a longest match starting where the previous one
//! ended. When a unit fails, the error is kept and tokens are skipped from
//! the point of failure up to the next synchronization token; parsing then
//! resumes with a fresh unit.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tangle_grammar::GrammarTable;
use tangle_ir::{Name, NodeId, Span, SyntaxTree, Token};
use tracing::debug;

use crate::error::found_name;
use crate::fork::GoalMode;
use crate::session::unresolved;
use crate::{
    ForkManager, ParseError, ParseOptions, ParseWarning, Parser, SyntaxError, TokenSource,
};

/// Where to resume after a broken unit.
#[derive(Clone, Debug)]
pub struct RecoveryPolicy {
    pub unit: Name,
    /// Token kinds that may end a broken unit.
    pub sync: FxHashSet<Name>,
    /// Skip the synchronization token itself before the next unit.
    pub consume_sync: bool,
    /// Errors after which the rest of the input is abandoned.
    pub max_errors: usize,
}

impl RecoveryPolicy {
    pub fn new(unit: Name) -> Self {
        RecoveryPolicy {
            unit,
            sync: FxHashSet::default(),
            consume_sync: true,
            max_errors: 100,
        }
    }

    #[must_use]
    pub fn with_sync(mut self, kinds: impl IntoIterator<Item = Name>) -> Self {
        self.sync.extend(kinds);
        self
    }

    #[must_use]
    pub fn with_consume_sync(mut self, consume: bool) -> Self {
        self.consume_sync = consume;
        self
    }

    #[must_use]
    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = max.max(1);
        self
    }
}

/// The units that parsed and the errors of those that did not.
#[derive(Clone, Debug, Default)]
pub struct RecoveredParse {
    pub units: Vec<SyntaxTree>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
}

impl RecoveredParse {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Tokens pulled from a source on demand and kept for re-reading.
struct Buffer<'p, S> {
    source: S,
    tokens: Vec<Token>,
    exhausted: bool,
    options: &'p ParseOptions,
}

impl<S: TokenSource> Buffer<'_, S> {
    fn get(&mut self, index: u32) -> Result<Option<Token>, ParseError> {
        let index = index as usize;
        while self.tokens.len() <= index && !self.exhausted {
            if self.options.is_cancelled() {
                return Err(ParseError::Cancelled);
            }
            match self.source.next_token()? {
                Some(token) => self.tokens.push(token),
                None => self.exhausted = true,
            }
        }
        Ok(self.tokens.get(index).copied())
    }
}

impl Parser<'_> {
    /// Parse `source` as a sequence of `policy.unit`s.
    ///
    /// Syntax errors and candidate-limit errors are collected and parsing
    /// resumes after the next synchronization token. Source errors,
    /// cancellation and an unknown unit end the parse with `Err`.
    #[tracing::instrument(level = "debug", skip_all, fields(unit = self.grammar().name(policy.unit)))]
    pub fn parse_recovering<S: TokenSource>(
        &self,
        source: S,
        policy: &RecoveryPolicy,
    ) -> Result<RecoveredParse, ParseError> {
        let grammar = self.grammar();
        let mut manager = ForkManager::new(grammar, self.options());
        manager.goal_alternatives(policy.unit)?;
        let mut buffer = Buffer {
            source,
            tokens: Vec::new(),
            exhausted: false,
            options: self.options(),
        };
        let mut result = RecoveredParse::default();
        let mut at = 0;

        while buffer.get(at)?.is_some() {
            match self.parse_unit(&mut manager, &mut buffer, policy.unit, at) {
                Ok(node) => {
                    let tree = manager.tree(node);
                    at = manager.arena().range(node).end;
                    result.warnings.extend(unresolved(&tree, grammar));
                    result.units.push(tree);
                }
                Err(error) if error.is_recoverable() => {
                    let from = error.as_syntax().map_or(at, |e| e.farthest_position());
                    let resume = resync(&mut buffer, policy, at, from)?;
                    debug!(%error, at, resume, "unit failed; skipping ahead");
                    result.errors.push(error);
                    if result.errors.len() >= policy.max_errors {
                        break;
                    }
                    at = resume;
                }
                Err(error) => return Err(error),
            }
        }

        let mut warnings = manager.warnings().to_vec();
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        debug!(
            units = result.units.len(),
            errors = result.errors.len(),
            "recovering parse finished"
        );
        Ok(result)
    }

    /// Longest non-empty match of `unit` starting at token `at`.
    fn parse_unit<S: TokenSource>(
        &self,
        manager: &mut ForkManager<'_>,
        buffer: &mut Buffer<'_, S>,
        unit: Name,
        at: u32,
    ) -> Result<NodeId, ParseError> {
        let lookahead = self.options().lookahead.max(1) as u32;
        let task = manager.begin(unit, GoalMode::Prefix, at)?;
        let mut index = at;
        while !manager.is_done(task) {
            let token = buffer.get(index)?;
            let mut window: SmallVec<[Option<Name>; 4]> = SmallVec::new();
            for offset in 0..lookahead {
                let next = buffer.get(index + offset)?;
                window.push(next.map(|t| t.kind));
                if next.is_none() {
                    break;
                }
            }
            manager.step(task, token, &window, false)?;
            if token.is_none() {
                break;
            }
            index += 1;
        }
        match manager.completion(task) {
            Some(node) if !manager.arena().range(node).is_empty() => Ok(node),
            Some(_) if !manager.has_failure(task) => {
                Err(empty_unit(manager.grammar(), unit, at, buffer.get(at)?))
            }
            _ => Err(manager.stalled(task)),
        }
    }
}

/// A unit that matched no tokens at all.
fn empty_unit(grammar: &GrammarTable, unit: Name, at: u32, found: Option<Token>) -> ParseError {
    SyntaxError {
        position: at,
        expected: grammar
            .leading_symbols(unit)
            .iter()
            .map(|&name| grammar.name(name).to_string())
            .collect(),
        found: found_name(grammar, found),
        found_token: found,
        span: found.map_or(Span::DUMMY, |t| t.span),
        ambiguity: None,
    }
    .into()
}

/// First position after `at` to try the next unit from: just past (or at)
/// the first synchronization token at or after `from`. Without a sync set,
/// the token at `from` is skipped.
fn resync<S: TokenSource>(
    buffer: &mut Buffer<'_, S>,
    policy: &RecoveryPolicy,
    at: u32,
    from: u32,
) -> Result<u32, ParseError> {
    let mut index = from.max(at);
    if policy.sync.is_empty() {
        return Ok(index + 1);
    }
    while let Some(token) = buffer.get(index)? {
        if policy.sync.contains(&token.kind) {
            let next = if policy.consume_sync { index + 1 } else { index };
            if next > at {
                return Ok(next);
            }
        }
        index += 1;
    }
    Ok(index)
}
