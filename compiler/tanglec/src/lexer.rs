//! Token source for plain input text.
//!
//! Words are classified against the grammar's literals first, so keywords
//! and punctuation get the kinds the grammar declares for them. Anything
//! else falls into one of three generic terminals: [`NAME`], [`NUMBER`] and
//! [`STRING`]. Punctuation is matched greedily against the grammar's
//! multi-character literals (`::` before `:`).

use logos::Logos;
use tangle_grammar::GrammarTable;
use tangle_ir::{Name, Span, Token};
use tangle_parse::{SourceError, TokenSource};

/// Terminal kind of identifiers that are not grammar literals.
pub const NAME: &str = "name";
/// Terminal kind of numeric literals.
pub const NUMBER: &str = "number";
/// Terminal kind of double-quoted strings.
pub const STRING: &str = "string";

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,

    #[regex(r"[!#-/:-@\[-\^`{-~]")]
    Punct,
}

/// Lazily lexes `text` into grammar tokens.
pub struct TextSource<'a> {
    lexer: logos::Lexer<'a, RawToken>,
    grammar: &'a GrammarTable,
    /// Punctuation literals of the grammar, longest first.
    punctuation: Vec<(&'static str, Name)>,
    generic: [Name; 3],
}

impl<'a> TextSource<'a> {
    pub fn new(grammar: &'a GrammarTable, text: &'a str) -> Self {
        let mut punctuation: Vec<_> = grammar
            .literals()
            .into_iter()
            .filter(|(text, _)| text.starts_with(|c: char| c.is_ascii_punctuation()))
            .collect();
        punctuation.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        let interner = grammar.interner();
        TextSource {
            lexer: RawToken::lexer(text),
            grammar,
            punctuation,
            generic: [
                interner.intern(NAME),
                interner.intern(NUMBER),
                interner.intern(STRING),
            ],
        }
    }

    fn span(&self) -> Result<Span, SourceError> {
        Span::try_from_range(self.lexer.span()).map_err(|e| SourceError::failed(e.to_string()))
    }

    /// Extend a punctuation token to the longest grammar literal at its start.
    fn punctuation(&mut self) -> Option<Name> {
        let start = self.lexer.span().start;
        let rest = &self.lexer.source()[start..];
        let &(text, kind) = self
            .punctuation
            .iter()
            .find(|(text, _)| rest.starts_with(text))?;
        self.lexer.bump(text.len() - 1);
        Some(kind)
    }

    fn kind(&self, raw: RawToken, text: &str) -> Option<Name> {
        if let Some(kind) = self.grammar.literal_kind(text) {
            return Some(kind);
        }
        match raw {
            RawToken::Ident => Some(self.generic[0]),
            RawToken::Number => Some(self.generic[1]),
            RawToken::String => Some(self.generic[2]),
            RawToken::UnterminatedString | RawToken::Punct => None,
        }
    }
}

impl TokenSource for TextSource<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, SourceError> {
        let Some(raw) = self.lexer.next() else {
            return Ok(None);
        };
        let kind = match raw {
            Ok(RawToken::UnterminatedString) => {
                return Err(SourceError::UnterminatedString { span: self.span()? })
            }
            Ok(RawToken::Punct) => self.punctuation(),
            Ok(raw) => self.kind(raw, self.lexer.slice()),
            Err(()) => None,
        };
        let span = self.span()?;
        let text = self.lexer.slice();
        let Some(kind) = kind else {
            return Err(SourceError::Unrecognized {
                text: text.to_string(),
                span,
            });
        };
        Ok(Some(Token::new(kind, self.grammar.interner().intern(text), span)))
    }
}

/// Lex all of `text`, stopping at the first error.
pub fn tokenize(grammar: &GrammarTable, text: &str) -> Result<Vec<Token>, SourceError> {
    let mut source = TextSource::new(grammar, text);
    let mut tokens = Vec::new();
    while let Some(token) = source.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
