//! Token sources and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tangle_diagnostic::{Diagnostic, ErrorCode};
use tangle_ir::{Span, Token};
use thiserror::Error;

/// Pull-based token input.
///
/// `Ok(None)` marks the end of input; a source is not polled again after it.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, SourceError>;
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    #[inline]
    fn next_token(&mut self) -> Result<Option<Token>, SourceError> {
        (**self).next_token()
    }
}

/// Failure reported by a token source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("unrecognized input `{text}`")]
    Unrecognized { text: String, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("{message}")]
    Failed { message: String },
}

impl SourceError {
    pub fn failed(message: impl Into<String>) -> Self {
        SourceError::Failed {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match *self {
            SourceError::Unrecognized { span, .. } | SourceError::UnterminatedString { span } => {
                Some(span)
            }
            SourceError::Failed { .. } => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SourceError::Failed { .. } => ErrorCode::E0001,
            SourceError::Unrecognized { .. } => ErrorCode::E0002,
            SourceError::UnterminatedString { .. } => ErrorCode::E0003,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match self.span() {
            Some(span) => diag.with_label(span, "not a token"),
            None => diag,
        }
    }
}

/// Tokens from a slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        SliceSource { tokens, pos: 0 }
    }
}

impl TokenSource for SliceSource<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, SourceError> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        Ok(token)
    }
}

/// Tokens from an iterator of results, e.g. a lexer.
#[derive(Clone, Debug)]
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<Token, SourceError>>,
{
    pub fn new(iter: I) -> Self {
        IterSource { iter }
    }
}

impl<I> TokenSource for IterSource<I>
where
    I: Iterator<Item = Result<Token, SourceError>>,
{
    fn next_token(&mut self) -> Result<Option<Token>, SourceError> {
        self.iter.next().transpose()
    }
}

/// Shared cancellation flag, checked between token pulls.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
