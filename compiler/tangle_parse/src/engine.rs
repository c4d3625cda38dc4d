//! Pull-mode parsing over a [`TokenSource`].

use tangle_grammar::GrammarTable;
use tangle_ir::{Name, SyntaxTree, Token};
use tracing::debug;

use crate::{ParseError, ParseOptions, ParseOutput, ParseSession, SliceSource, TokenSource};

/// A grammar together with the options every parse through it uses.
///
/// Parsers borrow the grammar and hold no parse state, so one grammar can
/// serve any number of parses, concurrently or not.
#[derive(Clone, Debug)]
pub struct Parser<'g> {
    grammar: &'g GrammarTable,
    options: ParseOptions,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g GrammarTable, options: ParseOptions) -> Self {
        Parser { grammar, options }
    }

    pub fn grammar(&self) -> &'g GrammarTable {
        self.grammar
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse all of `source` as the grammar's start symbol.
    pub fn parse<S: TokenSource>(&self, source: S) -> Result<ParseOutput, ParseError> {
        self.parse_from(self.grammar.start(), source)
    }

    /// Parse all of `source` as `start`.
    ///
    /// Stops at the first source error, syntax error or cancellation.
    #[tracing::instrument(level = "debug", skip_all, fields(start = self.grammar.name(start)))]
    pub fn parse_from<S: TokenSource>(
        &self,
        start: Name,
        mut source: S,
    ) -> Result<ParseOutput, ParseError> {
        let mut session = ParseSession::with_start(self.grammar, self.options.clone(), start)?;
        while let Some(token) = source.next_token()? {
            session.feed(token)?;
        }
        if self.options.is_cancelled() {
            return Err(ParseError::Cancelled);
        }
        let output = session.finish()?;
        debug!(
            nodes = output.tree.len(),
            forks = output.forks.len(),
            warnings = output.warnings.len(),
            "tree built"
        );
        Ok(output)
    }
}

/// Parse `tokens` as the grammar's start symbol with default options.
pub fn parse(grammar: &GrammarTable, tokens: &[Token]) -> Result<SyntaxTree, ParseError> {
    Parser::new(grammar, ParseOptions::default())
        .parse(SliceSource::new(tokens))
        .map(|output| output.tree)
}

#[cfg(test)]
mod tests;
