//! Input tokens.

use crate::{Name, Span};

/// One lexical token as delivered by a token source.
///
/// `kind` is the terminal kind name (e.g. `number`, or a literal such as `+`
/// for punctuation), `text` is the interned source text. Both are interned
/// in the grammar's interner so the parser only compares integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: Name,
    pub text: Name,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: Name, text: Name, span: Span) -> Self {
        Token { kind, text, span }
    }

    /// A token with no source location.
    #[inline]
    pub const fn synthetic(kind: Name, text: Name) -> Self {
        Token {
            kind,
            text,
            span: Span::DUMMY,
        }
    }
}
