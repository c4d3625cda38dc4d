#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use tangle_grammar::load_grammar;
use tangle_ir::StringInterner;

fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[test]
fn test_defaults() {
    let parsed = ParseArgs::parse(&args("json.tg a.json b.json")).unwrap();
    assert_eq!(
        parsed,
        ParseArgs {
            grammar: "json.tg".into(),
            files: vec!["a.json".into(), "b.json".into()],
            mode: ParseMode::Whole { start: None },
            lookahead: None,
            max_fork_span: None,
            max_candidates: None,
            color: ColorMode::Auto,
            stats: false,
        }
    );
    let (options, defaults) = (parsed.options(), ParseOptions::default());
    assert_eq!(options.lookahead, defaults.lookahead);
    assert_eq!(options.max_fork_span, defaults.max_fork_span);
    assert_eq!(options.max_candidates, defaults.max_candidates);
    assert!(parsed.policy(&load_grammar("a := b\n", &StringInterner::shared()).unwrap()).is_none());
}

#[test]
fn test_flags_with_separate_and_inline_values() {
    let parsed = ParseArgs::parse(&args(
        "g.tg --start value --lookahead=2 in.txt --max-fork-span 16 --color never --stats",
    ))
    .unwrap();
    assert_eq!(
        parsed.mode,
        ParseMode::Whole {
            start: Some("value".into())
        }
    );
    assert_eq!(parsed.files, vec!["in.txt".to_string()]);
    assert_eq!(parsed.color, ColorMode::Never);
    assert!(parsed.stats);

    let options = parsed.options();
    assert_eq!(options.lookahead, 2);
    assert_eq!(options.max_fork_span, 16);
}

#[test]
fn test_recover_mode() {
    let parsed = ParseArgs::parse(&args("g.tg in.txt --recover stmt --sync ;,}")).unwrap();
    assert_eq!(
        parsed.mode,
        ParseMode::Recover {
            unit: "stmt".into(),
            sync: vec![";".into(), "}".into()],
        }
    );

    let grammar = load_grammar("stmt := name \";\"\n", &StringInterner::shared()).unwrap();
    let policy = parsed.policy(&grammar).unwrap();
    let interner = grammar.interner();
    assert_eq!(policy.unit, interner.intern("stmt"));
    assert!(policy.sync.contains(&interner.intern(";")));
    assert!(policy.sync.contains(&interner.intern("}")));
}

#[test]
fn test_rejected_command_lines() {
    let cases = [
        ("", "missing grammar file"),
        ("g.tg", "missing input file"),
        ("g.tg in --lookahead", "missing value for `--lookahead`"),
        ("g.tg in --lookahead two", "invalid value `two` for `--lookahead`"),
        ("g.tg in --verbose=1", "unknown option `--verbose`"),
        ("g.tg in --sync ;", "`--sync` only applies with `--recover`"),
        (
            "g.tg in --recover a --start b",
            "`--start` and `--recover` cannot be combined",
        ),
        (
            "g.tg in --color blue",
            "invalid color mode `blue` (expected auto, always or never)",
        ),
    ];
    for (line, message) in cases {
        assert_eq!(ParseArgs::parse(&args(line)).unwrap_err(), message, "{line}");
    }
}
