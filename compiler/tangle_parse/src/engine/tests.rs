#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tangle_diagnostic::ErrorCode;
use tangle_grammar::load_grammar;
use tangle_ir::{Span, StringInterner, SyntaxNode};

use crate::{CancelToken, ForkOutcome, ForkStatus, IterSource, ParseWarning, SourceError};

const BINARY: &str = r#"
expr := name "+" name @binary
      | name
"#;

const JSON: &str = r#"
%start json
%token brace1 "{"
%token brace2 "}"
%token colon ":"
%token comma ","
%terminal string number

json     := brace1 _members? brace2 @object
_members := prop _more*
_more    := comma prop
prop     := string colon value
value    := string | number | json
"#;

const STATEMENT: &str = r#"
prog := stmt ";"
stmt ?= decl | expr
decl := name "*" name @decl
expr := name "*" name @mul
"#;

const NESTED: &str = r#"
prog := s ";"
s    ?= a | b
a    := t
b    := t
t    ?= name @x | name @y
"#;

const THREE_WAY: &str = r#"
prog := stmt ";"
stmt ?= name "*" name @p
      | name "*" name @q
      | name "*" name @r
"#;

const ITEMS: &str = r#"
prog  := item*
item  := name | number | group
group := "(" prog ")"
"#;

fn grammar(text: &str) -> GrammarTable {
    load_grammar(text, &StringInterner::shared()).unwrap()
}

/// Whitespace-separated words: grammar literals, quoted strings, numbers
/// and names.
fn lex(g: &GrammarTable, text: &str) -> Vec<Token> {
    let interner = g.interner();
    text.split_whitespace()
        .map(|word| {
            let kind = if let Some(kind) = g.literal_kind(word) {
                kind
            } else if word.starts_with('"') {
                interner.intern("string")
            } else if word.chars().all(|c| c.is_ascii_digit()) {
                interner.intern("number")
            } else {
                interner.intern("name")
            };
            Token::synthetic(kind, interner.intern(word))
        })
        .collect()
}

fn render(g: &GrammarTable, tree: &SyntaxTree) -> String {
    tree.display(g.interner()).to_string()
}

fn label(g: &GrammarTable, tree: &SyntaxTree, id: tangle_ir::NodeId) -> &'static str {
    match *tree.node(id) {
        SyntaxNode::Internal { label, .. } => g.name(label),
        SyntaxNode::Leaf { .. } | SyntaxNode::Ambiguous { .. } => "",
    }
}

#[test]
fn test_binary_expression() {
    let g = grammar(BINARY);
    let tokens = lex(&g, "a + b");
    let tree = parse(&g, &tokens).unwrap();
    let root = tree.root();

    assert_eq!(label(&g, &tree, root), "binary");
    let children = tree.children(root);
    assert_eq!(children.len(), 3);
    assert!(children
        .iter()
        .all(|&c| matches!(tree.node(c), SyntaxNode::Leaf { .. })));
    assert_eq!(render(&g, &tree), "(binary name:a + name:b)");
    assert_eq!(tree.leaves(), tokens);
}

#[test]
fn test_lookahead_picks_the_short_alternative() {
    let g = grammar(BINARY);
    let tree = parse(&g, &lex(&g, "a")).unwrap();
    assert_eq!(render(&g, &tree), "(expr name:a)");
}

#[test]
fn test_json_object() {
    let g = grammar(JSON);
    let tree = parse(&g, &lex(&g, r#"{ "a" : 1 }"#)).unwrap();
    let root = tree.root();

    assert_eq!(label(&g, &tree, root), "object");
    let props: Vec<_> = tree
        .children(root)
        .iter()
        .filter(|&&c| label(&g, &tree, c) == "prop")
        .collect();
    assert_eq!(props.len(), 1);
    assert_eq!(
        render(&g, &tree),
        r#"(object brace1:{ (prop string:"a" colon:: (value number:1)) brace2:})"#
    );
}

#[test]
fn test_json_nested_and_empty() {
    let g = grammar(JSON);
    let tree = parse(&g, &lex(&g, r#"{ "a" : { } , "b" : "c" }"#)).unwrap();
    assert_eq!(
        render(&g, &tree),
        concat!(
            r#"(object brace1:{ (prop string:"a" colon:: (value (object brace1:{ brace2:}))) "#,
            r#"comma:, (prop string:"b" colon:: (value string:"c")) brace2:})"#,
        )
    );
}

#[test]
fn test_json_missing_value() {
    let g = grammar(JSON);
    let err = parse(&g, &lex(&g, r#"{ "a" : }"#)).unwrap_err();
    let syntax = err.as_syntax().unwrap();

    assert_eq!(syntax.position, 3);
    assert_eq!(syntax.expected, vec!["string", "number", "json"]);
    assert_eq!(syntax.found, "brace2");
    assert!(syntax.ambiguity.is_none());
    assert_eq!(err.code(), ErrorCode::E1001);
    assert_eq!(
        err.to_string(),
        "unexpected `brace2` at token 4, expected `string`, `number` or `json`"
    );
}

#[test]
fn test_unexpected_end_of_input() {
    let g = grammar(JSON);
    let err = parse(&g, &lex(&g, r#"{ "a" :"#)).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position, 3);
    assert_eq!(syntax.found, "<eof>");
    assert_eq!(err.code(), ErrorCode::E1002);
}

#[test]
fn test_trailing_input_is_an_error() {
    let g = grammar(JSON);
    let err = parse(&g, &lex(&g, "{ } }")).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    assert_eq!(syntax.position, 2);
    assert_eq!(syntax.expected, vec!["<eof>"]);
}

#[test]
fn test_flagged_overlap_becomes_ambiguous_node() {
    let g = grammar(STATEMENT);
    let output = Parser::new(&g, ParseOptions::default())
        .parse(SliceSource::new(&lex(&g, "a * b ;")))
        .unwrap();

    assert_eq!(
        render(&g, &output.tree),
        "(prog (? (stmt (decl name:a * name:b)) (stmt (mul name:a * name:b))) ;)"
    );
    assert!(output.tree.has_unresolved_ambiguity());
    assert_eq!(output.forks.len(), 1);
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Merged { candidates: 2 })
    );
    assert_eq!(
        output.warnings,
        vec![ParseWarning::UnresolvedAmbiguity {
            nonterminal: "stmt".into(),
            range: tangle_ir::TokenRange::new(0, 3),
            candidates: 2,
        }]
    );
    assert_eq!(output.stats.tokens, 4);
}

#[test]
fn test_unflagged_overlap_keeps_first_alternative() {
    let g = grammar(&STATEMENT.replace("?=", ":="));
    let output = Parser::new(&g, ParseOptions::default())
        .parse(SliceSource::new(&lex(&g, "a * b ;")))
        .unwrap();

    assert_eq!(
        render(&g, &output.tree),
        "(prog (stmt (decl name:a * name:b)) ;)"
    );
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Preferred { kept: 0 })
    );
    assert!(output.warnings.is_empty());
}

#[test]
fn test_nested_ambiguity_is_packed_at_its_own_level() {
    let g = grammar(NESTED);
    let output = Parser::new(&g, ParseOptions::default())
        .parse(SliceSource::new(&lex(&g, "q ;")))
        .unwrap();

    assert_eq!(
        render(&g, &output.tree),
        concat!(
            "(prog (? ",
            "(s (a (? (x name:q) (y name:q)))) ",
            "(s (b (? (x name:q) (y name:q))))) ;)"
        )
    );
    let outer = output.tree.ambiguities()[0];
    assert_eq!(output.tree.children(outer).len(), 2);
    assert_eq!(output.tree.ambiguities().len(), 3);
    assert_eq!(output.stats.packed, 3);
    assert_eq!(
        output
            .warnings
            .iter()
            .map(|w| match w {
                ParseWarning::UnresolvedAmbiguity {
                    nonterminal,
                    candidates,
                    ..
                } => (nonterminal.as_str(), *candidates),
                other => panic!("unexpected warning {other:?}"),
            })
            .collect::<Vec<_>>(),
        vec![("s", 2), ("t", 2), ("t", 2)]
    );
}

#[test]
fn test_fork_folded_into_another_candidate_is_settled() {
    let g = grammar(NESTED);
    let output = Parser::new(&g, ParseOptions::default())
        .parse(SliceSource::new(&lex(&g, "q ;")))
        .unwrap();

    assert_eq!(output.forks.len(), 3);
    for fork in &output.forks {
        assert_eq!(fork.status, ForkStatus::Settled, "{:?}", fork.fork);
        assert_eq!(fork.outcome, Some(ForkOutcome::Merged { candidates: 2 }));
    }
    assert_eq!(g.name(output.forks[2].nonterminal), "t");
}

#[test]
fn test_three_flagged_alternatives_keep_declaration_order() {
    let g = grammar(THREE_WAY);
    let output = Parser::new(&g, ParseOptions::default())
        .parse(SliceSource::new(&lex(&g, "a * b ;")))
        .unwrap();

    assert_eq!(
        render(&g, &output.tree),
        concat!(
            "(prog (? (p name:a * name:b) ",
            "(q name:a * name:b) ",
            "(r name:a * name:b)) ;)"
        )
    );
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Merged { candidates: 3 })
    );
    assert!(matches!(
        output.warnings[..],
        [ParseWarning::UnresolvedAmbiguity { candidates: 3, .. }]
    ));
}

#[test]
fn test_error_inside_ambiguous_fork_is_anchored_at_the_fork() {
    let g = grammar(STATEMENT);
    let err = parse(&g, &lex(&g, "a * ;")).unwrap_err();
    let syntax = err.as_syntax().unwrap();
    let ambiguity = syntax.ambiguity.as_ref().unwrap();

    assert_eq!(syntax.position, 0);
    assert_eq!(syntax.expected, vec!["stmt"]);
    assert_eq!(syntax.found, "name");
    assert_eq!(ambiguity.alternatives, 2);
    assert_eq!(ambiguity.farthest_position, 2);
    assert_eq!(ambiguity.farthest_expected, vec!["name"]);
    assert_eq!(ambiguity.farthest_found, ";");
    assert_eq!(err.code(), ErrorCode::E1003);
}

#[test]
fn test_long_fork_is_forced() {
    let g = grammar(STATEMENT);
    let options = ParseOptions::default().with_max_fork_span(1);
    let output = Parser::new(&g, options)
        .parse(SliceSource::new(&lex(&g, "a * b ;")))
        .unwrap();

    assert!(!output.tree.has_unresolved_ambiguity());
    assert_eq!(
        render(&g, &output.tree),
        "(prog (stmt (decl name:a * name:b)) ;)"
    );
    assert_eq!(
        output.warnings,
        vec![ParseWarning::ForcedResolution {
            nonterminal: "stmt".into(),
            position: 0,
            kept: 0,
            dropped: 1,
        }]
    );
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Forced { kept: 0 })
    );
}

#[test]
fn test_candidate_limit() {
    let g = grammar(STATEMENT);
    let options = ParseOptions::default().with_max_candidates(1);
    let err = Parser::new(&g, options)
        .parse(SliceSource::new(&lex(&g, "a * b ;")))
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::CandidateLimit {
            limit: 1,
            position: 0
        }
    );
}

#[test]
fn test_parse_from_another_nonterminal() {
    let g = grammar(JSON);
    let parser = Parser::new(&g, ParseOptions::default());
    let prop = g.interner().intern("prop");
    let output = parser
        .parse_from(prop, SliceSource::new(&lex(&g, r#""k" : 2"#)))
        .unwrap();
    assert_eq!(
        render(&g, &output.tree),
        r#"(prop string:"k" colon:: (value number:2))"#
    );

    let hidden = g.interner().intern("_members");
    let err = parser.parse_from(hidden, SliceSource::new(&[])).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnknownNonterminal {
            name: "_members".into()
        }
    );
}

#[test]
fn test_empty_input() {
    let g = grammar(ITEMS);
    let tree = parse(&g, &[]).unwrap();
    assert_eq!(render(&g, &tree), "(prog)");
    assert!(tree.leaves().is_empty());
}

#[test]
fn test_source_failure_is_an_error() {
    let g = grammar(BINARY);
    let tokens = lex(&g, "a +");
    let items = vec![
        Ok(tokens[0]),
        Err(SourceError::Unrecognized {
            text: "$".into(),
            span: Span::new(2, 3),
        }),
    ];
    let err = Parser::new(&g, ParseOptions::default())
        .parse(IterSource::new(items.into_iter()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0002);
}

#[test]
fn test_cancelled_parse_returns_no_tree() {
    let g = grammar(BINARY);
    let cancel = CancelToken::new();
    let parser = Parser::new(&g, ParseOptions::default().with_cancel(cancel.clone()));
    cancel.cancel();

    let tokens = lex(&g, "a + b");
    assert_eq!(
        parser.parse(SliceSource::new(&tokens)).unwrap_err(),
        ParseError::Cancelled
    );
    assert_eq!(
        parser.parse(SliceSource::new(&[])).unwrap_err(),
        ParseError::Cancelled
    );
}

#[test]
fn test_lookahead_one_still_parses() {
    let g = grammar(BINARY);
    let options = ParseOptions::default().with_lookahead(1);
    let output = Parser::new(&g, options)
        .parse(SliceSource::new(&lex(&g, "a + b")))
        .unwrap();
    assert_eq!(render(&g, &output.tree), "(binary name:a + name:b)");
    assert_eq!(output.forks.len(), 1);
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Eliminated { kept: 0 })
    );
}

fn item_words() -> impl Strategy<Value = Vec<String>> {
    let atom = prop_oneof![
        "[a-z]{1,3}".prop_map(String::from),
        "[0-9]{1,3}".prop_map(String::from),
    ];
    prop::collection::vec(atom, 0..12).prop_flat_map(|words| {
        let len = words.len();
        (Just(words), 0..=len, 0..=len).prop_map(|(words, a, b)| {
            // wrap one slice in parentheses
            let (start, end) = (a.min(b), a.max(b));
            let mut out = words[..start].to_vec();
            out.push("(".into());
            out.extend_from_slice(&words[start..end]);
            out.push(")".into());
            out.extend_from_slice(&words[end..]);
            out
        })
    })
}

proptest! {
    #[test]
    fn prop_leaves_reproduce_the_input(words in item_words()) {
        let g = grammar(ITEMS);
        let tokens = lex(&g, &words.join(" "));
        let tree = parse(&g, &tokens).unwrap();
        prop_assert_eq!(tree.leaves(), tokens);
        prop_assert!(!tree.has_unresolved_ambiguity());
    }

    #[test]
    fn prop_parses_are_deterministic(stmts in prop::collection::vec("[a-z]{1,2}", 1..6)) {
        let g = grammar(&STATEMENT.replace("prog := stmt \";\"", "prog := stmt \";\" prog | stmt \";\""));
        let text: Vec<String> = stmts.iter().map(|s| format!("{s} * {s} ;")).collect();
        let tokens = lex(&g, &text.join(" "));

        let first = parse(&g, &tokens).unwrap();
        let second = parse(&g, &tokens).unwrap();
        prop_assert_eq!(render(&g, &first), render(&g, &second));
        prop_assert_eq!(first.ambiguities().len(), stmts.len());
        prop_assert_eq!(first.leaves(), tokens);
    }
}
