//! Tangle command line driver.
//!
//! ```text
//! grammar file ──► load_grammar() ──► GrammarTable
//!                                        │
//! input file ──► TextSource (logos) ──► Parser ──► SyntaxTree + warnings
//! ```
//!
//! Several input files are parsed in parallel against one shared grammar
//! table; each file owns its parser state.

pub mod args;
pub mod commands;
pub mod lexer;

pub use args::{ParseArgs, ParseMode};
pub use lexer::{tokenize, TextSource};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Nothing is installed unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=tangle_parse=trace`. With `TANGLE_LOG_TREE` also set, spans are
/// rendered as an indented tree instead of flat lines. Safe to call more
/// than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var_os("TANGLE_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
