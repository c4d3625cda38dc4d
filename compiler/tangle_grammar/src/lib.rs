//! Grammar tables for the Tangle parser.
//!
//! A grammar is a list of productions grouped by nonterminal, in
//! declaration order. [`GrammarBuilder`] (or [`load_grammar`] for the text
//! format) validates the productions and computes nullable, FIRST and FOLLOW
//! sets once; the resulting [`GrammarTable`] is read-only and shared by every
//! parse.
//!
//! Productions flagged *ambiguous* mark places where several alternatives
//! may legitimately cover the same tokens. The parser keeps all of them and
//! defers the choice; unflagged overlaps are settled by declaration order.

mod analysis;
mod builder;
mod error;
mod loader;
mod production;
mod symbol;
mod table;

pub use analysis::TerminalSet;
pub use builder::{AltHandle, GrammarBuilder};
pub use error::GrammarError;
pub use loader::{load_builder, load_grammar};
pub use production::Production;
pub use symbol::Symbol;
pub use table::GrammarTable;
