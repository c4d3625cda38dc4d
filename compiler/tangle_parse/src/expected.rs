//! Expected-symbol sets and the farthest failure of a parse.

use smallvec::SmallVec;
use tangle_grammar::GrammarTable;
use tangle_ir::{Name, Token};

/// Something a dying candidate could have accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expected {
    Symbol(Name),
    End,
}

impl Expected {
    pub fn render(self, grammar: &GrammarTable) -> &'static str {
        match self {
            Expected::Symbol(name) => grammar.name(name),
            Expected::End => "<eof>",
        }
    }
}

/// Insertion-ordered set of expectations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpectedSet(SmallVec<[Expected; 4]>);

impl ExpectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, expected: Expected) {
        if !self.0.contains(&expected) {
            self.0.push(expected);
        }
    }

    pub fn extend(&mut self, other: &ExpectedSet) {
        for &expected in &other.0 {
            self.insert(expected);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Expected> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn render(&self, grammar: &GrammarTable) -> Vec<String> {
        self.iter().map(|e| e.render(grammar).to_string()).collect()
    }
}

impl FromIterator<Expected> for ExpectedSet {
    fn from_iter<T: IntoIterator<Item = Expected>>(iter: T) -> Self {
        let mut set = ExpectedSet::new();
        for expected in iter {
            set.insert(expected);
        }
        set
    }
}

/// Where a candidate died, and what it wanted there.
///
/// Candidates advance in lockstep, so the failures of one step all share a
/// position; keeping only the farthest one and unioning its expectations
/// gives the classic "farthest failure" report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub position: u32,
    pub expected: ExpectedSet,
    /// `None` at end of input.
    pub found: Option<Token>,
}

impl Failure {
    pub(crate) fn record(
        slot: &mut Option<Failure>,
        position: u32,
        found: Option<Token>,
        expected: impl IntoIterator<Item = Expected>,
    ) {
        match slot {
            Some(failure) if failure.position > position => {}
            Some(failure) if failure.position == position => {
                for e in expected {
                    failure.expected.insert(e);
                }
            }
            _ => {
                *slot = Some(Failure {
                    position,
                    expected: expected.into_iter().collect(),
                    found,
                });
            }
        }
    }
}
