//! Options of the `parse` command.

use tangle_diagnostic::emitter::ColorMode;
use tangle_grammar::GrammarTable;
use tangle_parse::{ParseOptions, RecoveryPolicy};

/// How each input file is parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// One tree for the whole file, rooted at `start` (or the grammar's
    /// start symbol).
    Whole { start: Option<String> },
    /// A sequence of `unit`s, skipping broken ones up to a `sync` token.
    Recover { unit: String, sync: Vec<String> },
}

/// Parsed command line of `tangle parse`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseArgs {
    pub grammar: String,
    pub files: Vec<String>,
    pub mode: ParseMode,
    pub lookahead: Option<usize>,
    pub max_fork_span: Option<u32>,
    pub max_candidates: Option<usize>,
    pub color: ColorMode,
    /// Print statistics after each tree.
    pub stats: bool,
}

impl ParseArgs {
    /// Parse the arguments following `parse`.
    ///
    /// Flags take their value either as the next argument or after `=`
    /// (`--lookahead 2`, `--lookahead=2`).
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut start = None;
        let mut recover = None;
        let mut sync = Vec::new();
        let mut lookahead = None;
        let mut max_fork_span = None;
        let mut max_candidates = None;
        let mut color = ColorMode::Auto;
        let mut stats = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if !arg.starts_with("--") {
                positional.push(arg.clone());
                continue;
            }
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            if flag == "--stats" {
                stats = true;
                continue;
            }
            let value = match inline {
                Some(value) => value,
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| format!("missing value for `{flag}`"))?,
            };
            match flag {
                "--start" => start = Some(value),
                "--recover" => recover = Some(value),
                "--sync" => sync.extend(
                    value
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                "--lookahead" => lookahead = Some(number(flag, &value)?),
                "--max-fork-span" => max_fork_span = Some(number(flag, &value)?),
                "--max-candidates" => max_candidates = Some(number(flag, &value)?),
                "--color" => color = value.parse()?,
                _ => return Err(format!("unknown option `{flag}`")),
            }
        }

        let mut positional = positional.into_iter();
        let grammar = positional
            .next()
            .ok_or_else(|| "missing grammar file".to_string())?;
        let files: Vec<String> = positional.collect();
        if files.is_empty() {
            return Err("missing input file".to_string());
        }

        let mode = match recover {
            Some(unit) if start.is_none() => ParseMode::Recover { unit, sync },
            Some(_) => return Err("`--start` and `--recover` cannot be combined".to_string()),
            None if !sync.is_empty() => {
                return Err("`--sync` only applies with `--recover`".to_string())
            }
            None => ParseMode::Whole { start },
        };

        Ok(ParseArgs {
            grammar,
            files,
            mode,
            lookahead,
            max_fork_span,
            max_candidates,
            color,
            stats,
        })
    }

    /// Parser configuration with the command line overrides applied.
    pub fn options(&self) -> ParseOptions {
        let mut options = ParseOptions::default();
        if let Some(lookahead) = self.lookahead {
            options = options.with_lookahead(lookahead);
        }
        if let Some(span) = self.max_fork_span {
            options = options.with_max_fork_span(span);
        }
        if let Some(limit) = self.max_candidates {
            options = options.with_max_candidates(limit);
        }
        options
    }

    /// Recovery policy for [`ParseMode::Recover`], interned in `grammar`.
    pub fn policy(&self, grammar: &GrammarTable) -> Option<RecoveryPolicy> {
        let ParseMode::Recover { unit, sync } = &self.mode else {
            return None;
        };
        let interner = grammar.interner();
        let sync = sync.iter().map(|kind| interner.intern(kind));
        Some(RecoveryPolicy::new(interner.intern(unit)).with_sync(sync))
    }
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid value `{value}` for `{flag}`"))
}

#[cfg(test)]
mod tests;
