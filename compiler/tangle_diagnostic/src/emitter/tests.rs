#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;
use tangle_ir::Span;

fn sample_diagnostic() -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message("unexpected `}`")
        .with_label(Span::new(11, 12), "expected `string`, `number` or `json`")
        .with_note("farthest failure at token 5")
        .with_suggestion("remove the trailing `:`")
}

fn render(emitter_setup: impl FnOnce(Vec<u8>) -> Vec<u8>) -> String {
    String::from_utf8(emitter_setup(Vec::new())).unwrap()
}

#[test]
fn test_line_col() {
    let text = "{\n  \"a\" : }\n";
    assert_eq!(line_col(text, 0), (1, 1));
    assert_eq!(line_col(text, 2), (2, 1));
    assert_eq!(line_col(text, 10), (2, 9));
    assert_eq!(line_col(text, 1000), (3, 1));
}

#[test]
fn test_terminal_emitter_no_color() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, true);
        emitter.emit(&sample_diagnostic());
        emitter.flush();
        emitter.into_inner()
    });
    assert_eq!(
        text,
        "error[E1001]: unexpected `}`\n\
         \x20 --> 11..12: expected `string`, `number` or `json`\n\
         \x20 = note: farthest failure at token 5\n\
         \x20 = help: remove the trailing `:`\n\n"
    );
}

#[test]
fn test_terminal_emitter_resolves_source_locations() {
    let source = "{\n  \"a\" : }";
    let text = render(|out| {
        let mut emitter =
            TerminalEmitter::with_color_mode(out, ColorMode::Never, false).with_source("x.json", source);
        emitter.emit(&sample_diagnostic());
        emitter.into_inner()
    });
    assert!(text.contains("--> x.json:2:10: expected"));
}

#[test]
fn test_terminal_emitter_colors() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Auto, true);
        emitter.emit(&sample_diagnostic());
        emitter.into_inner()
    });
    assert!(text.contains("\x1b[1;31merror\x1b[0m"));
}

#[test]
fn test_summary() {
    let text = render(|out| {
        let mut emitter = TerminalEmitter::with_color_mode(out, ColorMode::Never, false);
        emitter.emit_summary(2, 1);
        emitter.emit_summary(0, 3);
        emitter.emit_summary(0, 0);
        emitter.into_inner()
    });
    assert_eq!(
        text,
        "error: aborting due to 2 previous errors; 1 warning emitted\n\
         warning: 3 warnings emitted\n"
    );
}

#[test]
fn test_color_mode_from_str() {
    assert_eq!("never".parse::<ColorMode>(), Ok(ColorMode::Never));
    assert!("sometimes".parse::<ColorMode>().is_err());
    assert!(!ColorMode::Auto.should_use_colors(false));
    assert!(ColorMode::Always.should_use_colors(false));
}
