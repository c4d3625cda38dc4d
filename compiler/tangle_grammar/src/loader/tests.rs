#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::Symbol;
use pretty_assertions::assert_eq;
use tangle_ir::StringInterner;

fn load(text: &str) -> Result<GrammarTable, GrammarError> {
    load_grammar(text, &StringInterner::shared())
}

fn syntax_position(err: GrammarError) -> (u32, u32, String) {
    match err {
        GrammarError::Syntax {
            line,
            column,
            message,
            ..
        } => (line, column, message),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

fn rhs_names(g: &GrammarTable, rule: &str, alt: usize) -> Vec<&'static str> {
    let nt = g.interner().intern(rule);
    g.lookup(nt).unwrap()[alt]
        .rhs
        .iter()
        .map(|s| g.name(s.name()))
        .collect()
}

#[test]
fn test_alternatives_labels_and_comments() {
    let g = load(
        "# arithmetic, right-recursive\n\
         sum  := name \"+\" name @binary   # labeled\n\
              | name\n\
         name := ident\n",
    )
    .unwrap();
    let sum = g.interner().intern("sum");
    let alts = g.lookup(sum).unwrap();

    assert_eq!(alts.len(), 2);
    assert_eq!(g.name(alts[0].label), "binary");
    assert_eq!(alts[1].label, sum);
    assert_eq!(rhs_names(&g, "sum", 0), vec!["name", "+", "name"]);
    assert!(matches!(alts[0].rhs[1], Symbol::Terminal(_)));
    assert_eq!(g.literal_kind("+"), Some(g.interner().intern("+")));
}

#[test]
fn test_ambiguous_rules() {
    let g = load(
        "stmt ?= decl | expr\n\
         decl := name name\n\
         expr := name\n",
    )
    .unwrap();
    let stmt = g.interner().intern("stmt");
    let decl = g.interner().intern("decl");
    assert!(g.lookup(stmt).unwrap().iter().all(|p| p.ambiguous));
    assert!(!g.lookup(decl).unwrap()[0].ambiguous);
}

#[test]
fn test_quoted_literal_uses_declared_kind() {
    let g = load(
        "sum := num \"+\" num\n\
         %token plus \"+\"\n",
    )
    .unwrap();
    assert_eq!(rhs_names(&g, "sum", 0), vec!["num", "plus", "num"]);
    assert_eq!(g.literal_kind("+"), Some(g.interner().intern("plus")));
}

#[test]
fn test_postfix_operators_desugar_into_hidden_rules() {
    let g = load("list := open item* close\nopts := a? b+\n").unwrap();

    // list := open _list_1 close, _list_1 := item _list_1 | %empty
    assert_eq!(rhs_names(&g, "list", 0), vec!["open", "_list_1", "close"]);
    assert_eq!(rhs_names(&g, "_list_1", 0), vec!["item", "_list_1"]);
    assert_eq!(rhs_names(&g, "_list_1", 1), Vec::<&str>::new());

    // opts := _opts_1 _opts_3, _opts_3 := b _opts_2
    assert_eq!(rhs_names(&g, "opts", 0), vec!["_opts_1", "_opts_3"]);
    assert_eq!(rhs_names(&g, "_opts_1", 0), vec!["a"]);
    assert_eq!(rhs_names(&g, "_opts_3", 0), vec!["b", "_opts_2"]);
    assert_eq!(rhs_names(&g, "_opts_2", 0), vec!["b", "_opts_2"]);

    // default start is the first rule written, not a hidden helper
    assert_eq!(g.name(g.start()), "list");
}

#[test]
fn test_repetition_rules_are_shared() {
    let g = load("a := x* y\nb := x* z\n").unwrap();
    assert_eq!(rhs_names(&g, "a", 0)[0], rhs_names(&g, "b", 0)[0]);
}

#[test]
fn test_empty_alternative() {
    let g = load("opt := x | %empty\n").unwrap();
    let opt = g.interner().intern("opt");
    assert!(g.lookup(opt).unwrap()[1].is_empty());
    assert!(g.is_nullable(opt));
}

#[test]
fn test_start_and_terminal_directives() {
    let g = load(
        "%terminal a b\n\
         %start second\n\
         first := a\n\
         second := first b\n",
    )
    .unwrap();
    assert_eq!(g.name(g.start()), "second");

    let err = load("%terminal a\ns := a c\n").unwrap_err();
    assert_eq!(err, GrammarError::UnknownNonterminal { name: "c".into() });
}

#[test]
fn test_unknown_character() {
    let (line, column, message) = syntax_position(load("a := b\nc = d\n").unwrap_err());
    assert_eq!((line, column), (2, 3));
    assert_eq!(message, "unexpected `=`");
}

#[test]
fn test_missing_define() {
    let (line, column, message) = syntax_position(load("a b\n").unwrap_err());
    assert_eq!((line, column), (1, 3));
    assert_eq!(message, "expected `:=` or `?=`");
}

#[test]
fn test_empty_alternative_requires_marker() {
    let (line, column, _) = syntax_position(load("a := x |\n").unwrap_err());
    assert_eq!((line, column), (1, 9));
}

#[test]
fn test_empty_marker_must_stand_alone() {
    let (_, _, message) = syntax_position(load("a := x %empty\n").unwrap_err());
    assert_eq!(message, "`%empty` must be the only item");
}

#[test]
fn test_dangling_repetition() {
    let (line, column, message) = syntax_position(load("a := * x\n").unwrap_err());
    assert_eq!((line, column), (1, 6));
    assert_eq!(message, "repetition must follow a symbol");
}

#[test]
fn test_left_recursion_in_text() {
    let err = load("expr := expr \"+\" term | term\nterm := num\n").unwrap_err();
    assert_eq!(
        err,
        GrammarError::LeftRecursion {
            cycle: vec!["expr".into(), "expr".into()]
        }
    );
}

#[test]
fn test_load_builder_allows_extension() {
    let mut b = load_builder("s := item\n", &StringInterner::shared()).unwrap();
    b.rule("item", &["x"]);
    let g = b.build().unwrap();
    let item = g.interner().intern("item");
    assert!(g.is_nonterminal(item));
}
