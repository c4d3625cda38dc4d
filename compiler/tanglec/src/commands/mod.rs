//! Command handlers for the `tangle` CLI.
//!
//! Each submodule implements one command. Reading files and loading the
//! grammar are shared and live here.

use std::io::IsTerminal;

use tangle_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use tangle_grammar::{load_grammar, GrammarTable};
use tangle_ir::StringInterner;

mod check;
mod explain;
mod parse;
mod tokens;

pub use check::{check_grammar, describe_grammar};
pub use explain::explain_error;
pub use parse::{parse_file, parse_files, parse_text, render_report, run_parse, FileReport, Outcome};
pub use tokens::print_tokens;

/// Read a file, exiting with a message if it cannot be read.
pub(crate) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}

/// Load a grammar file, reporting its errors and exiting if it is invalid.
pub(crate) fn load_grammar_file(path: &str, color: ColorMode) -> GrammarTable {
    let text = read_file(path);
    match load_grammar(&text, &StringInterner::shared()) {
        Ok(grammar) => grammar,
        Err(error) => {
            let mut emitter = stderr_emitter(color).with_source(path, &text);
            emitter.emit(&error.to_diagnostic());
            emitter.emit_summary(1, 0);
            emitter.flush();
            std::process::exit(1);
        }
    }
}

pub(crate) fn stderr_emitter<'src>(color: ColorMode) -> TerminalEmitter<'src, std::io::Stderr> {
    TerminalEmitter::stderr(color, std::io::stderr().is_terminal())
}
