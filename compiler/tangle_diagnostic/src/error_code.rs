//! Error codes for all Tangle diagnostics.
//!
//! Each code is a unique identifier (e.g. `E1001`) whose first digit names
//! the phase that reported it.

use std::fmt;

/// Error codes for all Tangle diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: token source errors
/// - E1xxx: parse errors
/// - E2xxx: grammar errors
/// - E3xxx: ambiguity resolution errors
/// - Wxxxx: warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Token source errors (E0xxx)
    /// Token source failed to produce the next token
    E0001,
    /// Unrecognized character in input text
    E0002,
    /// Unterminated string literal in input text
    E0003,

    // Parse errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Unexpected end of input
    E1002,
    /// No alternative of an ambiguous construct matched
    E1003,
    /// Parse requested for an undefined nonterminal
    E1004,
    /// Too many live parse candidates
    E1005,
    /// Parse cancelled
    E1006,

    // Grammar errors (E2xxx)
    /// Malformed grammar definition text
    E2001,
    /// Reference to an undefined nonterminal
    E2002,
    /// Left-recursive grammar
    E2003,
    /// Hidden start symbol
    E2004,
    /// Grammar without rules
    E2005,
    /// Literal text mapped to two terminal kinds
    E2006,

    // Resolution errors (E3xxx)
    /// Ambiguity cannot be resolved to exactly one candidate
    E3001,
    /// Fork is still open
    E3002,
    /// Fork has no surviving candidate
    E3003,
    /// Unknown fork handle
    E3004,

    // Warnings
    /// Ambiguity forced to the earliest alternative
    W1001,
    /// Parse tree contains unresolved ambiguity
    W1002,
}

impl ErrorCode {
    /// All error codes, for exhaustive iteration and lookup.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E0001,
        ErrorCode::E0002,
        ErrorCode::E0003,
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::W1001,
        ErrorCode::W1002,
    ];

    /// The code as a string (e.g. "E1001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W1002 => "W1002",
        }
    }

    /// Short description, used by `tangle help <code>`.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "token source failed",
            ErrorCode::E0002 => "unrecognized character",
            ErrorCode::E0003 => "unterminated string literal",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "unexpected end of input",
            ErrorCode::E1003 => "no alternative of an ambiguous construct matched",
            ErrorCode::E1004 => "unknown nonterminal",
            ErrorCode::E1005 => "too many parse candidates",
            ErrorCode::E1006 => "parse cancelled",
            ErrorCode::E2001 => "malformed grammar",
            ErrorCode::E2002 => "undefined nonterminal",
            ErrorCode::E2003 => "left-recursive grammar",
            ErrorCode::E2004 => "hidden start symbol",
            ErrorCode::E2005 => "empty grammar",
            ErrorCode::E2006 => "conflicting literal",
            ErrorCode::E3001 => "unresolvable ambiguity",
            ErrorCode::E3002 => "fork still open",
            ErrorCode::E3003 => "fork failed",
            ErrorCode::E3004 => "unknown fork",
            ErrorCode::W1001 => "forced ambiguity resolution",
            ErrorCode::W1002 => "unresolved ambiguity",
        }
    }

    /// Token source error (E0xxx range).
    pub fn is_source_error(&self) -> bool {
        matches!(self, ErrorCode::E0001 | ErrorCode::E0002 | ErrorCode::E0003)
    }

    /// Parse error (E1xxx range).
    pub fn is_parser_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E1002
                | ErrorCode::E1003
                | ErrorCode::E1004
                | ErrorCode::E1005
                | ErrorCode::E1006
        )
    }

    /// Grammar error (E2xxx range).
    pub fn is_grammar_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001
                | ErrorCode::E2002
                | ErrorCode::E2003
                | ErrorCode::E2004
                | ErrorCode::E2005
                | ErrorCode::E2006
        )
    }

    /// Ambiguity resolution error (E3xxx range).
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E3001 | ErrorCode::E3002 | ErrorCode::E3003 | ErrorCode::E3004
        )
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W1001 | ErrorCode::W1002)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an error code string like `"E2001"`, case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
