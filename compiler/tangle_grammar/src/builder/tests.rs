#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use tangle_ir::StringInterner;

fn builder() -> GrammarBuilder {
    GrammarBuilder::new(StringInterner::shared())
}

#[test]
fn test_empty_grammar() {
    assert_eq!(builder().build().unwrap_err(), GrammarError::EmptyGrammar);
}

#[test]
fn test_unknown_start() {
    let mut b = builder();
    b.rule("a", &["x"]);
    b.start("missing");
    assert_eq!(
        b.build().unwrap_err(),
        GrammarError::UnknownNonterminal {
            name: "missing".into()
        }
    );
}

#[test]
fn test_hidden_start() {
    let mut b = builder();
    b.rule("_a", &["x"]);
    assert_eq!(
        b.build().unwrap_err(),
        GrammarError::HiddenStart { name: "_a".into() }
    );
}

#[test]
fn test_alternatives_are_grouped_in_declaration_order() {
    let mut b = builder();
    b.rule("a", &["x"]);
    b.rule("b", &["y"]);
    b.rule("a", &["z"]);
    let g = b.build().unwrap();
    let a = g.interner().intern("a");
    let alts = g.lookup(a).unwrap();

    assert_eq!(alts.len(), 2);
    assert_eq!(alts[0].alternative, 0);
    assert_eq!(alts[1].alternative, 1);
    assert_eq!(g.name(alts[1].rhs[0].name()), "z");
    assert_eq!(alts[0].id.raw() + 1, alts[1].id.raw());
}

#[test]
fn test_label_defaults_to_lhs() {
    let mut b = builder();
    b.rule("sum", &["name", "plus", "name"]).label("binary");
    b.rule("sum", &["name"]);
    let g = b.build().unwrap();
    let sum = g.interner().intern("sum");
    let alts = g.lookup(sum).unwrap();

    assert_eq!(g.name(alts[0].label), "binary");
    assert_eq!(alts[1].label, sum);
}

#[test]
fn test_ambiguous_flag() {
    let mut b = builder();
    b.ambiguous("stmt", &["decl"]);
    b.ambiguous("stmt", &["expr"]).label("expr_stmt");
    b.rule("decl", &["name"]);
    b.rule("expr", &["name"]);
    let g = b.build().unwrap();
    let stmt = g.interner().intern("stmt");

    assert!(g.lookup(stmt).unwrap().iter().all(|p| p.ambiguous));
    assert_eq!(g.ambiguous_count(), 2);
}

#[test]
fn test_names_resolve_to_rules_or_terminals() {
    let mut b = builder();
    b.rule("s", &["item", "semi"]);
    b.rule("item", &["name"]);
    let g = b.build().unwrap();
    let s = g.interner().intern("s");
    let rhs = &g.lookup(s).unwrap()[0].rhs;

    assert!(matches!(rhs[0], Symbol::Nonterminal(_)));
    assert!(matches!(rhs[1], Symbol::Terminal(_)));
    assert!(g.is_terminal(g.interner().intern("semi")));
    assert!(g.is_terminal(g.interner().intern("name")));
}

#[test]
fn test_strict_terminals() {
    let mut b = builder();
    b.terminal("name");
    b.rule("s", &["name", "typo"]);
    assert_eq!(
        b.build().unwrap_err(),
        GrammarError::UnknownNonterminal {
            name: "typo".into()
        }
    );

    let mut b = builder();
    b.terminal("name");
    b.token("semi", ";");
    b.rule("s", &["name", "semi"]);
    assert!(b.build().is_ok());
}

#[test]
fn test_duplicate_literal() {
    let mut b = builder();
    b.token("plus", "+");
    b.token("add", "+");
    b.rule("s", &["plus"]);
    assert_eq!(
        b.build().unwrap_err(),
        GrammarError::DuplicateLiteral {
            literal: "+".into(),
            first: "plus".into(),
            second: "add".into(),
        }
    );
}

#[test]
fn test_repeated_identical_literal_is_fine() {
    let mut b = builder();
    b.token("plus", "+");
    b.token("plus", "+");
    b.rule("s", &["plus"]);
    let g = b.build().unwrap();
    assert_eq!(g.literal_kind("+"), Some(g.interner().intern("plus")));
}
