//! Parse configuration.

use crate::CancelToken;

/// Knobs for one parse.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Tokens inspected (current one included) before opening a fork.
    /// `1` disables speculation.
    pub lookahead: usize,
    /// Tokens a fork may stay open before the earliest-declared candidate
    /// is kept and the rest dropped.
    pub max_fork_span: u32,
    /// Live candidate stacks allowed after any step.
    pub max_candidates: usize,
    pub cancel: Option<CancelToken>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            lookahead: 2,
            max_fork_span: 512,
            max_candidates: 256,
            cancel: None,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead.max(1);
        self
    }

    #[must_use]
    pub fn with_max_fork_span(mut self, span: u32) -> Self {
        self.max_fork_span = span;
        self
    }

    #[must_use]
    pub fn with_max_candidates(mut self, limit: usize) -> Self {
        self.max_candidates = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
