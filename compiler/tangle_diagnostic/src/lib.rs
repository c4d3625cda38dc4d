//! Diagnostics for the Tangle parser.
//!
//! - Error codes for searchability (`E1001`, `tangle help E1001`)
//! - A message saying what went wrong
//! - A primary label saying where
//! - Notes and suggestions saying why, and how to fix it

mod diagnostic;
pub mod emitter;
mod error_code;

pub use diagnostic::{format_expected, Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
