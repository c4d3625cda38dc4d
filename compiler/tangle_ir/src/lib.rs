//! Tangle IR - shared data model for the Tangle parser.
//!
//! This crate contains the types every other Tangle crate speaks:
//! - Names for interned terminal kinds, nonterminal names and token texts
//! - Spans (byte offsets) and token ranges (token indices)
//! - Tokens as produced by a token source
//! - The syntax tree: leaf, internal and ambiguous nodes in a flat arena
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: token kinds and texts are `Name(u32)`, so a
//!   token is `Copy` and kind checks are integer comparisons.
//! - **Flatten Everything**: nodes live in an arena and refer to each other
//!   through `NodeId(u32)`; child lists are ranges into one shared pool.
//! - **Closed variants**: `SyntaxNode` is a sum type and every consumer
//!   matches it exhaustively.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod span;
pub mod stack;
mod token;
pub mod tree;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError, TokenRange};
pub use token::Token;
pub use tree::{
    NodeArena, NodeId, NodeList, Preorder, ProductionId, SyntaxNode, SyntaxTree, TreeDisplay,
};

static_assert_size!(Token, 16);
static_assert_size!(TokenRange, 8);
