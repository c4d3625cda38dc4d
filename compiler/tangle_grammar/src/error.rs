//! Grammar construction errors.

use tangle_diagnostic::{Diagnostic, ErrorCode};
use tangle_ir::Span;
use thiserror::Error;

/// Error building, loading or querying a grammar.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("unknown nonterminal `{name}`")]
    UnknownNonterminal { name: String },

    #[error("left recursion: {}", cycle.join(" -> "))]
    LeftRecursion {
        /// Nonterminals on the cycle, first and last equal.
        cycle: Vec<String>,
    },

    #[error("start symbol `{name}` is hidden")]
    HiddenStart { name: String },

    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("literal \"{literal}\" is declared as both `{first}` and `{second}`")]
    DuplicateLiteral {
        literal: String,
        first: String,
        second: String,
    },

    #[error("{line}:{column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        span: Span,
        message: String,
    },
}

impl GrammarError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GrammarError::Syntax { .. } => ErrorCode::E2001,
            GrammarError::UnknownNonterminal { .. } => ErrorCode::E2002,
            GrammarError::LeftRecursion { .. } => ErrorCode::E2003,
            GrammarError::HiddenStart { .. } => ErrorCode::E2004,
            GrammarError::EmptyGrammar => ErrorCode::E2005,
            GrammarError::DuplicateLiteral { .. } => ErrorCode::E2006,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code());
        match self {
            GrammarError::Syntax { span, message, .. } => diag
                .with_message("malformed grammar")
                .with_label(*span, message.clone()),
            GrammarError::UnknownNonterminal { name } => diag
                .with_message(self.to_string())
                .with_suggestion(format!(
                    "define `{name} := ...`, or declare it with `%terminal {name}`"
                )),
            GrammarError::LeftRecursion { cycle } => diag
                .with_message(self.to_string())
                .with_note("the parser is predictive and cannot expand a left-recursive rule")
                .with_suggestion(format!(
                    "rewrite `{}` with repetition: `sum := sum op term` becomes `sum := term tail*` and `tail := op term`",
                    cycle.first().map_or("", String::as_str)
                )),
            GrammarError::HiddenStart { name } => diag
                .with_message(self.to_string())
                .with_note("rules starting with `_` build no node and cannot be the root")
                .with_suggestion(format!("rename `{name}` or choose another `%start`")),
            GrammarError::EmptyGrammar | GrammarError::DuplicateLiteral { .. } => {
                diag.with_message(self.to_string())
            }
        }
    }
}
