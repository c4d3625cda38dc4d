//! The Tangle parse engine.
//!
//! Parsing is predictive: each nonterminal is expanded by the alternatives
//! whose FIRST sets admit the current token, filtered by a short bounded
//! lookahead. Where several alternatives remain, the engine forks instead
//! of backtracking. Every candidate keeps its own stack, all candidates
//! consume the same token each step, and candidates whose stacks line up
//! again are merged. Alternatives the grammar flags as ambiguous are packed
//! into an Ambiguous node; other overlaps keep the earlier-declared
//! alternative.
//!
//! # Entry points
//!
//! - [`parse`] for a token slice with default options
//! - [`Parser`] for a [`TokenSource`] with [`ParseOptions`], a chosen start
//!   nonterminal, or error recovery ([`Parser::parse_recovering`])
//! - [`ParseSession`] when the host pushes tokens as they arrive
//! - [`ForkManager`] to run a fork over one nonterminal directly and to
//!   resolve ambiguities after parsing

mod engine;
mod error;
mod expected;
mod fork;
mod lookahead;
mod options;
mod recovery;
mod resolve;
mod session;
mod source;
mod stack;

pub use engine::{parse, Parser};
pub use error::{
    AmbiguityContext, ForkError, ParseError, ParseWarning, ResolveError, SyntaxError,
};
pub use expected::{Expected, ExpectedSet, Failure};
pub use fork::{
    Decision, ForkAdvance, ForkHandle, ForkId, ForkManager, ForkOutcome, ForkReport, ForkStatus,
    ParseStats,
};
pub use options::ParseOptions;
pub use recovery::{RecoveredParse, RecoveryPolicy};
pub use session::{ParseOutput, ParseSession};
pub use source::{CancelToken, IterSource, SliceSource, SourceError, TokenSource};
pub use stack::CandidateId;
