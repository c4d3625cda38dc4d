// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests: grammar files and input files from `tests/fixtures`,
//! tokenized by the CLI lexer and parsed the way `tangle parse` does.
//!
//! ```bash
//! cargo test -p tanglec --test cli
//! ```

use pretty_assertions::assert_eq;
use tangle_diagnostic::ErrorCode;
use tangle_grammar::{load_grammar, GrammarTable};
use tangle_ir::StringInterner;
use tangle_parse::{ForkOutcome, ParseWarning};
use tanglec::commands::{describe_grammar, parse_files, parse_text, render_report, Outcome};
use tanglec::ParseArgs;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn grammar(name: &str) -> GrammarTable {
    let text = std::fs::read_to_string(fixture(name)).unwrap();
    load_grammar(&text, &StringInterner::shared()).unwrap()
}

fn args(line: &str) -> ParseArgs {
    let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    ParseArgs::parse(&words).unwrap()
}

#[test]
fn json_object_parses_to_one_tree() {
    let g = grammar("json.tg");
    let text = std::fs::read_to_string(fixture("object.json")).unwrap();
    let Outcome::Parsed(output) = parse_text(&g, &text, &args("json.tg object.json")) else {
        panic!("expected a tree");
    };
    assert_eq!(
        output.tree.display(g.interner()).to_string(),
        concat!(
            "(object brace1:{ ",
            "(prop string:\"a\" colon:: (value number:1)) comma:, ",
            "(prop string:\"b\" colon:: (value (object brace1:{ ",
            "(prop string:\"c\" colon:: (value string:\"d\")) brace2:}))) ",
            "brace2:})"
        )
    );
    assert!(output.warnings.is_empty());
    assert_eq!(output.stats.tokens, 13);
}

#[test]
fn missing_value_reports_the_offending_token() {
    let g = grammar("json.tg");
    let text = std::fs::read_to_string(fixture("broken.json")).unwrap();
    let Outcome::Failed(error) = parse_text(&g, &text, &args("json.tg broken.json")) else {
        panic!("expected an error");
    };
    let syntax = error.as_syntax().unwrap();
    assert_eq!(syntax.position, 3);
    assert_eq!(syntax.expected, vec!["string", "number", "json"]);
    assert_eq!(syntax.found, "brace2");
    assert_eq!(&text[syntax.span.to_range()], "}");
    assert_eq!(error.code(), ErrorCode::E1001);
}

#[test]
fn files_are_reported_in_command_line_order() {
    let g = grammar("json.tg");
    let line = format!(
        "json.tg {} {} {}",
        fixture("object.json"),
        fixture("broken.json"),
        fixture("missing.json")
    );
    let reports = parse_files(&g, &args(&line));

    assert_eq!(reports.len(), 3);
    assert!(reports[0].path.ends_with("object.json"));
    assert!(matches!(reports[0].outcome, Outcome::Parsed(_)));
    assert_eq!(reports[0].error_count(), 0);
    assert!(matches!(reports[1].outcome, Outcome::Failed(_)));
    assert_eq!(reports[1].diagnostics()[0].code, ErrorCode::E1001);
    assert!(matches!(reports[2].outcome, Outcome::Unreadable(_)));
    assert_eq!(reports[2].error_count(), 1);
}

#[test]
fn start_rule_override() {
    let g = grammar("json.tg");
    let Outcome::Parsed(output) = parse_text(&g, "\"k\" : 7", &args("json.tg in --start prop")) else {
        panic!("expected a tree");
    };
    assert_eq!(
        output.tree.display(g.interner()).to_string(),
        "(prop string:\"k\" colon:: (value number:7))"
    );

    let Outcome::Failed(error) = parse_text(&g, "\"k\" : 7", &args("json.tg in --start nope")) else {
        panic!("expected an error");
    };
    assert_eq!(error.code(), ErrorCode::E1004);
}

#[test]
fn ambiguous_statement_keeps_both_readings() {
    let g = grammar("stmt.tg");
    let report_args = args("stmt.tg in --stats");
    let Outcome::Parsed(output) = parse_text(&g, "c * d;", &report_args) else {
        panic!("expected a tree");
    };
    assert!(output.tree.has_unresolved_ambiguity());
    assert_eq!(
        output.tree.display(g.interner()).to_string(),
        "(? (stmt (decl name:c star:* name:d) semi:;) (stmt (mul name:c star:* name:d) semi:;))"
    );
    assert_eq!(
        output.forks[0].outcome,
        Some(ForkOutcome::Merged { candidates: 2 })
    );
    assert!(matches!(
        output.warnings[..],
        [ParseWarning::UnresolvedAmbiguity { candidates: 2, .. }]
    ));
}

#[test]
fn assignment_needs_no_fork() {
    let g = grammar("stmt.tg");
    let Outcome::Parsed(output) = parse_text(&g, "x = 4;", &args("stmt.tg in")) else {
        panic!("expected a tree");
    };
    assert_eq!(
        output.tree.display(g.interner()).to_string(),
        "(stmt (assign name:x = (value number:4)) semi:;)"
    );
    assert!(output.warnings.is_empty());
}

#[test]
fn recovery_skips_the_broken_statement() {
    let g = grammar("stmt.tg");
    let text = std::fs::read_to_string(fixture("program.txt")).unwrap();
    let Outcome::Recovered(result) =
        parse_text(&g, &text, &args("stmt.tg in --recover stmt --sync semi"))
    else {
        panic!("expected recovered units");
    };

    assert_eq!(result.units.len(), 2);
    assert_eq!(
        result.units[0].display(g.interner()).to_string(),
        "(stmt (assign name:a = (value number:1)) semi:;)"
    );
    assert!(result.units[1].has_unresolved_ambiguity());

    assert_eq!(result.errors.len(), 1);
    let syntax = result.errors[0].as_syntax().unwrap();
    assert_eq!(syntax.farthest_position(), 6);
    assert_eq!(syntax.found, "=");
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn unrecognized_input_is_a_source_error() {
    let g = grammar("stmt.tg");
    let Outcome::Failed(error) = parse_text(&g, "a = 1 # 2;", &args("stmt.tg in")) else {
        panic!("expected an error");
    };
    assert_eq!(error.code(), ErrorCode::E0002);
    assert_eq!(error.to_string(), "unrecognized input `#`");
}

#[test]
fn render_report_with_stats() {
    let g = grammar("stmt.tg");
    let parse_args = args("stmt.tg in --stats");
    let report = tanglec::commands::FileReport {
        path: "in".into(),
        text: "c * d;".into(),
        outcome: parse_text(&g, "c * d;", &parse_args),
    };
    let rendered = render_report(&g, &report, true);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("(? "));
    assert!(lines[1].starts_with("stats: 4 tokens, 1 forks"));
    assert_eq!(
        lines[2],
        "  fork#0 `stmt` at token 1: 2 alternatives, Some(Merged { candidates: 2 })"
    );
}

#[test]
fn check_summarizes_the_grammar() {
    let g = grammar("stmt.tg");
    let summary = describe_grammar("stmt.tg", &g, true);
    let mut lines = summary.lines();
    assert_eq!(
        lines.next().unwrap(),
        "OK: stmt.tg (4 rules, 7 productions, 5 terminals, 2 ambiguous), start `stmt`"
    );
    assert_eq!(lines.next().unwrap(), "  stmt ?= decl semi");
    assert_eq!(lines.count(), 6);
}
