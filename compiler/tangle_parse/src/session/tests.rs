#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use tangle_grammar::load_grammar;
use tangle_ir::StringInterner;

use crate::CancelToken;

const BINARY: &str = r#"
expr := name "+" name @binary
      | name
"#;

fn grammar() -> GrammarTable {
    load_grammar(BINARY, &StringInterner::shared()).unwrap()
}

fn tokens(g: &GrammarTable, text: &str) -> Vec<Token> {
    let interner = g.interner();
    text.split_whitespace()
        .map(|word| {
            let kind = g
                .literal_kind(word)
                .unwrap_or_else(|| interner.intern("name"));
            Token::synthetic(kind, interner.intern(word))
        })
        .collect()
}

#[test]
fn test_feed_then_finish() {
    let g = grammar();
    let mut session = ParseSession::new(&g, ParseOptions::default()).unwrap();
    for token in tokens(&g, "a + b") {
        session.feed(token).unwrap();
    }
    assert_eq!(session.position(), 3);

    let output = session.finish().unwrap();
    assert_eq!(
        output.tree.display(g.interner()).to_string(),
        "(binary name:a + name:b)"
    );
    assert_eq!(output.stats.tokens, 3);
}

#[test]
fn test_error_poisons_the_session() {
    let g = grammar();
    let mut session = ParseSession::new(&g, ParseOptions::default()).unwrap();
    let input = tokens(&g, "a b c d");

    session.feed(input[0]).unwrap();
    session.feed(input[1]).unwrap();
    // `b` is only stepped once `c` arrives as its lookahead
    let err = session.feed(input[2]).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position, 1);
    assert_eq!(syntax.expected, vec!["+", "<eof>"]);
    assert_eq!(syntax.found, "name");

    assert_eq!(session.feed(input[3]).unwrap_err(), err);
    assert_eq!(session.finish().unwrap_err(), err);
}

#[test]
fn test_cancel_between_tokens() {
    let g = grammar();
    let cancel = CancelToken::new();
    let options = ParseOptions::default().with_cancel(cancel.clone());
    let mut session = ParseSession::new(&g, options).unwrap();
    let input = tokens(&g, "a + b");

    session.feed(input[0]).unwrap();
    cancel.cancel();
    assert_eq!(session.feed(input[1]), Err(ParseError::Cancelled));
    assert_eq!(session.finish().unwrap_err(), ParseError::Cancelled);
}

#[test]
fn test_unknown_start() {
    let g = grammar();
    let missing = g.interner().intern("stmt");
    let err = ParseSession::with_start(&g, ParseOptions::default(), missing)
        .err()
        .unwrap();
    assert_eq!(
        err,
        ParseError::UnknownNonterminal {
            name: "stmt".into()
        }
    );
}
