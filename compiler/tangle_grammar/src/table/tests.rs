#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{load_grammar, GrammarError, GrammarTable};
use pretty_assertions::assert_eq;
use tangle_ir::{Name, StringInterner};

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

fn json() -> GrammarTable {
    load_grammar(JSON, &StringInterner::shared()).unwrap()
}

fn names(g: &GrammarTable, names: &[Name]) -> Vec<&'static str> {
    names.iter().map(|&n| g.name(n)).collect()
}

#[test]
fn test_lookup_unknown_nonterminal() {
    let g = json();
    let missing = g.interner().intern("array");
    assert_eq!(
        g.lookup(missing).unwrap_err(),
        GrammarError::UnknownNonterminal {
            name: "array".into()
        }
    );
}

#[test]
fn test_leading_symbols() {
    let g = json();
    let value = g.interner().intern("value");
    assert_eq!(
        names(&g, &g.leading_symbols(value)),
        vec!["string", "number", "json"]
    );
}

#[test]
fn test_leading_symbols_flatten_hidden_rules() {
    let g = json();
    // `_json_1 := _members | %empty`, and `_members` starts with `prop`
    let hidden = g
        .nonterminals()
        .iter()
        .copied()
        .find(|&nt| g.name(nt) == "_json_1")
        .unwrap();
    assert_eq!(names(&g, &g.leading_symbols(hidden)), vec!["prop"]);
}

#[test]
fn test_predicts_uses_first_and_follow() {
    let g = json();
    let i = |s: &str| g.interner().intern(s);
    let hidden = g.lookup(i("_json_1")).unwrap();
    let (members, empty) = (hidden[0].id, hidden[1].id);

    assert!(g.predicts(members, Some(i("string"))));
    assert!(!g.predicts(members, Some(i("brace2"))));
    assert!(g.predicts(empty, Some(i("brace2"))));
    assert!(!g.predicts(empty, Some(i("string"))));
    assert!(!g.predicts(empty, None));
}

#[test]
fn test_literal_kind() {
    let g = json();
    assert_eq!(g.literal_kind("{"), Some(g.interner().intern("brace1")));
    assert_eq!(g.literal_kind(":"), Some(g.interner().intern("colon")));
    assert_eq!(g.literal_kind("["), None);
    assert_eq!(g.literals().len(), 4);
}

#[test]
fn test_hidden_and_terminal_queries() {
    let g = json();
    let i = |s: &str| g.interner().intern(s);
    assert!(g.is_hidden(i("_members")));
    assert!(!g.is_hidden(i("prop")));
    assert!(g.is_terminal(i("comma")));
    assert!(!g.is_terminal(i("prop")));
    assert!(g.is_nonterminal(i("prop")));
    assert_eq!(g.start(), i("json"));
}

#[test]
fn test_describe() {
    let g = json();
    let json = g.interner().intern("json");
    let value = g.interner().intern("value");
    assert_eq!(
        g.describe(g.lookup(json).unwrap()[0].id),
        "json := brace1 _json_1 brace2 @object"
    );
    assert_eq!(g.describe(g.lookup(value).unwrap()[2].id), "value := json");
    let hidden = g.interner().intern("_json_1");
    assert_eq!(
        g.describe(g.lookup(hidden).unwrap()[1].id),
        "_json_1 := %empty"
    );
}

#[test]
fn test_table_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GrammarTable>();
}
