//! The `tokens` command: show how an input file is tokenized for a grammar.

use tangle_diagnostic::emitter::{ColorMode, DiagnosticEmitter};

use super::{load_grammar_file, read_file, stderr_emitter};
use crate::lexer::tokenize;

pub fn print_tokens(grammar_path: &str, path: &str, color: ColorMode) {
    let grammar = load_grammar_file(grammar_path, color);
    let text = read_file(path);
    match tokenize(&grammar, &text) {
        Ok(tokens) => {
            println!("Tokens for '{path}' ({} tokens):", tokens.len());
            for (index, token) in tokens.iter().enumerate() {
                println!(
                    "  {index:>4}  {:<12} {:?} @ {:?}",
                    grammar.name(token.kind),
                    grammar.name(token.text),
                    token.span
                );
            }
        }
        Err(error) => {
            let mut emitter = stderr_emitter(color).with_source(path, &text);
            emitter.emit(&error.to_diagnostic());
            emitter.emit_summary(1, 0);
            emitter.flush();
            std::process::exit(1);
        }
    }
}
