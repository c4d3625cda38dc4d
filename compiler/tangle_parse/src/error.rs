//! Parse, fork and resolution errors, and parse warnings.

use std::fmt;

use tangle_diagnostic::{format_expected, Diagnostic, ErrorCode};
use tangle_grammar::GrammarTable;
use tangle_ir::{Span, Token, TokenRange};
use thiserror::Error;

use crate::expected::Failure;
use crate::fork::ForkId;
use crate::source::SourceError;

/// A parse that produced no tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The goal is not a (visible) nonterminal of the grammar.
    #[error("unknown nonterminal `{name}`")]
    UnknownNonterminal { name: String },

    #[error(transparent)]
    Syntax(Box<SyntaxError>),

    #[error("parse cancelled")]
    Cancelled,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("more than {limit} live candidates at token {}", .position + 1)]
    CandidateLimit { limit: usize, position: u32 },
}

impl From<SyntaxError> for ParseError {
    fn from(error: SyntaxError) -> Self {
        ParseError::Syntax(Box::new(error))
    }
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::UnknownNonterminal { .. } => ErrorCode::E1004,
            ParseError::Syntax(error) => error.code(),
            ParseError::Cancelled => ErrorCode::E1006,
            ParseError::Source(error) => error.code(),
            ParseError::CandidateLimit { .. } => ErrorCode::E1005,
        }
    }

    /// The syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            ParseError::Syntax(error) => Some(&**error),
            _ => None,
        }
    }

    /// Whether a recovering parse may skip ahead and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::Syntax(_) | ParseError::CandidateLimit { .. }
        )
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::Syntax(error) => error.to_diagnostic(),
            ParseError::Source(error) => error.to_diagnostic(),
            ParseError::UnknownNonterminal { name } => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_suggestion(format!("`{name}` must be defined and must not start with `_`")),
            ParseError::CandidateLimit { .. } => Diagnostic::error(self.code())
                .with_message(self.to_string())
                .with_note("the grammar allows too many interpretations of this input at once")
                .with_suggestion("flag the overlapping alternatives with `?=`, or raise the candidate limit"),
            ParseError::Cancelled => Diagnostic::error(self.code()).with_message(self.to_string()),
        }
    }
}

/// No candidate could continue.
///
/// `position` is the 0-based index of the offending token; messages use
/// the 1-based ordinal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub position: u32,
    pub expected: Vec<String>,
    /// Kind of the offending token, `<eof>` at end of input.
    pub found: String,
    pub found_token: Option<Token>,
    pub span: Span,
    /// Set when every alternative of an open ambiguous fork failed; the
    /// error is then reported at the fork.
    pub ambiguity: Option<AmbiguityContext>,
}

/// The fork an error is anchored at, and how far its best candidate got.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmbiguityContext {
    pub fork: ForkId,
    pub nonterminal: String,
    pub alternatives: usize,
    pub farthest_position: u32,
    pub farthest_expected: Vec<String>,
    pub farthest_found: String,
    pub farthest_span: Span,
}

impl SyntaxError {
    pub(crate) fn from_failure(grammar: &GrammarTable, failure: &Failure, eof: Span) -> Self {
        SyntaxError {
            position: failure.position,
            expected: failure.expected.render(grammar),
            found: found_name(grammar, failure.found),
            found_token: failure.found,
            span: failure.found.map_or(eof, |t| t.span),
            ambiguity: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        if self.ambiguity.is_some() {
            ErrorCode::E1003
        } else if self.found_token.is_none() {
            ErrorCode::E1002
        } else {
            ErrorCode::E1001
        }
    }

    /// Where the parse really stopped: the farthest failure inside an
    /// ambiguous fork, otherwise `position`.
    pub fn farthest_position(&self) -> u32 {
        self.ambiguity
            .as_ref()
            .map_or(self.position, |a| a.farthest_position.max(self.position))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match &self.ambiguity {
            None => {
                let diag = diag.with_label(
                    self.span,
                    format!("expected {}", format_expected(&self.expected)),
                );
                if self.found_token.is_none() {
                    diag.with_note("the input ended before the construct was complete")
                } else {
                    diag
                }
            }
            Some(ambiguity) => diag
                .with_label(self.span, format!("`{}` starts here", ambiguity.nonterminal))
                .with_secondary_label(
                    ambiguity.farthest_span,
                    format!(
                        "best alternative expected {}",
                        format_expected(&ambiguity.farthest_expected)
                    ),
                )
                .with_note(format!(
                    "all {} alternatives of `{}` failed; the farthest reached {} and found `{}`",
                    ambiguity.alternatives,
                    ambiguity.nonterminal,
                    TokenRange::single(ambiguity.farthest_position),
                    ambiguity.farthest_found,
                )),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = TokenRange::single(self.position);
        if let Some(ambiguity) = &self.ambiguity {
            return write!(f, "no alternative of `{}` matches at {at}", ambiguity.nonterminal);
        }
        match self.found_token {
            Some(_) => write!(f, "unexpected `{}` at {at}", self.found)?,
            None => write!(f, "unexpected end of input at {at}")?,
        }
        write!(f, ", expected {}", format_expected(&self.expected))
    }
}

impl std::error::Error for SyntaxError {}

pub(crate) fn found_name(grammar: &GrammarTable, found: Option<Token>) -> String {
    found.map_or("<eof>", |t| grammar.name(t.kind)).to_string()
}

/// Misuse of a caller-driven fork.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ForkError {
    #[error("fork over `{nonterminal}` at token {} is still open", .position + 1)]
    StillOpen { nonterminal: String, position: u32 },

    #[error("no alternative of `{nonterminal}` matched at token {}", .position + 1)]
    Failed { nonterminal: String, position: u32 },

    #[error("unknown fork {fork:?}")]
    UnknownFork { fork: ForkId },
}

impl ForkError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ForkError::StillOpen { .. } => ErrorCode::E3002,
            ForkError::Failed { .. } => ErrorCode::E3003,
            ForkError::UnknownFork { .. } => ErrorCode::E3004,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match self {
            ForkError::StillOpen { .. } => {
                diag.with_suggestion("advance the fork until its status is `Settled`")
            }
            ForkError::Failed { .. } | ForkError::UnknownFork { .. } => diag,
        }
    }
}

/// A predicate could not pick exactly one candidate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cannot resolve ambiguity at {range}: {accepted} of {candidates} candidates accepted")]
    UnresolvableAmbiguity {
        range: TokenRange,
        accepted: usize,
        candidates: usize,
    },
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::UnresolvableAmbiguity { .. } => ErrorCode::E3001,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let ResolveError::UnresolvableAmbiguity { accepted, .. } = self;
        let note = if *accepted == 0 {
            "the predicate rejected every candidate"
        } else {
            "the predicate accepted more than one candidate"
        };
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_note(note)
    }
}

/// Something worth reporting about a parse that still succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseWarning {
    /// A fork stayed open past the fork span limit; the earliest-declared
    /// live candidate was kept.
    ForcedResolution {
        nonterminal: String,
        position: u32,
        kept: u32,
        dropped: usize,
    },
    /// The tree still holds an Ambiguous node.
    UnresolvedAmbiguity {
        nonterminal: String,
        range: TokenRange,
        candidates: usize,
    },
}

impl ParseWarning {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseWarning::ForcedResolution { .. } => ErrorCode::W1001,
            ParseWarning::UnresolvedAmbiguity { .. } => ErrorCode::W1002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::warning(self.code()).with_message(self.to_string());
        match self {
            ParseWarning::ForcedResolution { .. } => {
                diag.with_suggestion("raise the fork span limit to keep every candidate")
            }
            ParseWarning::UnresolvedAmbiguity { .. } => {
                diag.with_note("downstream passes must choose one candidate")
            }
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::ForcedResolution {
                nonterminal,
                position,
                kept,
                dropped,
            } => write!(
                f,
                "fork over `{nonterminal}` at {} stayed open too long; kept alternative {kept}, dropped {dropped}",
                TokenRange::single(*position)
            ),
            ParseWarning::UnresolvedAmbiguity {
                nonterminal,
                range,
                candidates,
            } => write!(
                f,
                "`{nonterminal}` is ambiguous over {range} ({candidates} candidates)"
            ),
        }
    }
}
