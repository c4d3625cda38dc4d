//! The `parse` command: parse input files against a grammar.
//!
//! Files are parsed in parallel on a scoped rayon pool. The grammar table
//! is shared read-only; every file gets its own parser state. Reports are
//! printed in command line order once all files are done.

use std::fmt::Write as _;

use rayon::prelude::*;
use tangle_diagnostic::emitter::DiagnosticEmitter;
use tangle_diagnostic::Diagnostic;
use tangle_grammar::GrammarTable;
use tangle_ir::SyntaxTree;
use tangle_parse::{ParseError, ParseOutput, ParseWarning, Parser, RecoveredParse};
use tracing::debug;

use super::{load_grammar_file, stderr_emitter};
use crate::args::{ParseArgs, ParseMode};
use crate::lexer::TextSource;

/// Result of parsing one file.
#[derive(Debug)]
pub enum Outcome {
    Parsed(ParseOutput),
    Recovered(RecoveredParse),
    Failed(ParseError),
    /// The file could not be read.
    Unreadable(String),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: String,
    pub text: String,
    pub outcome: Outcome,
}

impl FileReport {
    pub fn trees(&self) -> Vec<&SyntaxTree> {
        match &self.outcome {
            Outcome::Parsed(output) => vec![&output.tree],
            Outcome::Recovered(recovered) => recovered.units.iter().collect(),
            Outcome::Failed(_) | Outcome::Unreadable(_) => Vec::new(),
        }
    }

    /// Errors first, then warnings.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match &self.outcome {
            Outcome::Parsed(output) => output
                .warnings
                .iter()
                .map(ParseWarning::to_diagnostic)
                .collect(),
            Outcome::Recovered(recovered) => recovered
                .errors
                .iter()
                .map(ParseError::to_diagnostic)
                .chain(recovered.warnings.iter().map(ParseWarning::to_diagnostic))
                .collect(),
            Outcome::Failed(error) => vec![error.to_diagnostic()],
            Outcome::Unreadable(_) => Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        match &self.outcome {
            Outcome::Parsed(_) => 0,
            Outcome::Recovered(recovered) => recovered.errors.len(),
            Outcome::Failed(_) | Outcome::Unreadable(_) => 1,
        }
    }
}

/// Parse `text` as configured by `args`.
pub fn parse_text(grammar: &GrammarTable, text: &str, args: &ParseArgs) -> Outcome {
    let parser = Parser::new(grammar, args.options());
    let source = TextSource::new(grammar, text);
    let result = match (&args.mode, args.policy(grammar)) {
        (_, Some(policy)) => parser
            .parse_recovering(source, &policy)
            .map(Outcome::Recovered),
        (ParseMode::Whole { start: Some(start) }, None) => parser
            .parse_from(grammar.interner().intern(start), source)
            .map(Outcome::Parsed),
        (_, None) => parser.parse(source).map(Outcome::Parsed),
    };
    result.unwrap_or_else(Outcome::Failed)
}

pub fn parse_file(grammar: &GrammarTable, path: &str, args: &ParseArgs) -> FileReport {
    let (text, outcome) = match std::fs::read_to_string(path) {
        Ok(text) => {
            let outcome = parse_text(grammar, &text, args);
            (text, outcome)
        }
        Err(e) => (String::new(), Outcome::Unreadable(format!("error reading '{path}': {e}"))),
    };
    FileReport {
        path: path.to_string(),
        text,
        outcome,
    }
}

/// Parse every file, in parallel when there is more than one.
pub fn parse_files(grammar: &GrammarTable, args: &ParseArgs) -> Vec<FileReport> {
    let files = &args.files;
    if files.len() < 2 {
        return files.iter().map(|p| parse_file(grammar, p, args)).collect();
    }
    // A scoped pool is torn down before returning, unlike the global one.
    rayon::ThreadPoolBuilder::new()
        .build_scoped(rayon::ThreadBuilder::run, |pool| {
            pool.install(|| {
                files
                    .par_iter()
                    .map(|p| parse_file(grammar, p, args))
                    .collect::<Vec<_>>()
            })
        })
        .unwrap_or_else(|e| {
            tracing::warn!("failed to create thread pool ({e}), parsing sequentially");
            files.iter().map(|p| parse_file(grammar, p, args)).collect()
        })
}

/// Standard output for one file: its trees and, with `stats`, the fork
/// statistics.
pub fn render_report(grammar: &GrammarTable, report: &FileReport, stats: bool) -> String {
    let names = grammar.interner();
    let mut out = String::new();
    for tree in report.trees() {
        let _ = writeln!(out, "{}", tree.display(names));
    }
    if let (Outcome::Parsed(output), true) = (&report.outcome, stats) {
        let s = &output.stats;
        let _ = writeln!(
            out,
            "stats: {} tokens, {} forks, {} merges, {} packed, {} eliminated, peak {} candidates, {} nodes",
            s.tokens, s.forks, s.merges, s.packed, s.eliminated, s.peak_candidates, s.nodes
        );
        for fork in &output.forks {
            let _ = writeln!(
                out,
                "  {:?} `{}` at token {}: {} alternatives, {:?}",
                fork.fork,
                grammar.name(fork.nonterminal),
                fork.position + 1,
                fork.alternatives,
                fork.outcome,
            );
        }
    }
    out
}

/// Run `tangle parse`; exits with status 1 if any file had an error.
pub fn run_parse(args: &ParseArgs) {
    let grammar = load_grammar_file(&args.grammar, args.color);
    let reports = parse_files(&grammar, args);
    debug!(files = reports.len(), "parsed all files");

    let (mut errors, mut warnings) = (0, 0);
    let mut emitter = stderr_emitter(args.color);
    for report in &reports {
        if reports.len() > 1 {
            println!("== {} ==", report.path);
        }
        print!("{}", render_report(&grammar, report, args.stats));

        if let Outcome::Unreadable(message) = &report.outcome {
            eprintln!("{message}");
        }
        let diagnostics = report.diagnostics();
        let mut file_emitter = stderr_emitter(args.color).with_source(&report.path, &report.text);
        file_emitter.emit_all(&diagnostics);
        file_emitter.flush();
        errors += report.error_count();
        warnings += diagnostics.iter().filter(|d| !d.is_error()).count();
    }
    emitter.emit_summary(errors, warnings);
    emitter.flush();
    if errors > 0 {
        std::process::exit(1);
    }
}
