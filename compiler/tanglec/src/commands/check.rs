//! The `check` command: validate a grammar file and summarize it.

use std::fmt::Write as _;

use tangle_diagnostic::emitter::ColorMode;
use tangle_grammar::GrammarTable;

use super::load_grammar_file;

/// Load a grammar and print its summary; exits with an error if it is invalid.
pub fn check_grammar(path: &str, color: ColorMode, list: bool) {
    let grammar = load_grammar_file(path, color);
    print!("{}", describe_grammar(path, &grammar, list));
}

/// `OK: path (...)`, followed by every production when `list` is set.
pub fn describe_grammar(path: &str, grammar: &GrammarTable, list: bool) -> String {
    let visible = grammar
        .nonterminals()
        .iter()
        .filter(|&&nt| !grammar.is_hidden(nt))
        .count();
    let mut out = format!(
        "OK: {path} ({visible} rules, {} productions, {} terminals, {} ambiguous), start `{}`\n",
        grammar.productions().len(),
        grammar.terminals().len(),
        grammar.ambiguous_count(),
        grammar.name(grammar.start()),
    );
    if list {
        for production in grammar.productions() {
            let _ = writeln!(out, "  {}", grammar.describe(production.id));
        }
    }
    out
}
