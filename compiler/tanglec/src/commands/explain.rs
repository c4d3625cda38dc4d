//! `tangle help <code>`: describe a diagnostic code.

use tangle_diagnostic::ErrorCode;

/// Print the description of an error code, or exit if it is unknown.
pub fn explain_error(code_str: &str) {
    let Ok(code) = code_str.parse::<ErrorCode>() else {
        eprintln!("Unknown error code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format EXXXX (errors) or WXXXX (warnings) where X is a digit.");
        eprintln!("Examples: E0002, E1001, E2003, W1002");
        std::process::exit(1);
    };
    let phase = if code.is_source_error() {
        "token source"
    } else if code.is_parser_error() {
        "parser"
    } else if code.is_grammar_error() {
        "grammar"
    } else if code.is_resolution_error() {
        "ambiguity resolution"
    } else {
        "warning"
    };
    println!("{code}: {} ({phase})", code.description());
}
