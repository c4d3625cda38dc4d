//! Programmatic grammar construction.
//!
//! ```text
//! let mut b = GrammarBuilder::new(interner);
//! b.rule("sum", &["name", "+", "name"]).label("binary");
//! b.ambiguous("stmt", &["decl"]);
//! b.ambiguous("stmt", &["expr"]);
//! let grammar = b.build()?;
//! ```
//!
//! Symbol names are resolved when [`GrammarBuilder::build`] runs: a name
//! defined as a rule is a nonterminal, anything else is a terminal kind.
//! Declaring a terminal with [`GrammarBuilder::terminal`] makes resolution
//! strict: from then on an undeclared, undefined name is an error.

use rustc_hash::{FxHashMap, FxHashSet};
use tangle_ir::{Name, ProductionId, SharedInterner};
use tracing::debug;

use crate::analysis::{find_left_recursion, left_corners, Analysis};
use crate::table::TableParts;
use crate::{GrammarError, GrammarTable, Production, Symbol};

#[derive(Clone, Debug)]
struct AltDef {
    rhs: Vec<String>,
    label: Option<String>,
    ambiguous: bool,
}

#[derive(Clone, Debug)]
struct RuleDef {
    name: String,
    alts: Vec<AltDef>,
}

/// Collects rules, then validates and analyses them in one step.
#[derive(Debug)]
pub struct GrammarBuilder {
    interner: SharedInterner,
    start: Option<String>,
    rules: Vec<RuleDef>,
    rule_index: FxHashMap<String, usize>,
    /// `(text, kind)` in declaration order.
    literals: Vec<(String, String)>,
    declared_terminals: Vec<String>,
    strict: bool,
}

/// Handle to the alternative just added, for setting its label.
pub struct AltHandle<'b> {
    alt: &'b mut AltDef,
}

impl AltHandle<'_> {
    /// Name the node built for this alternative.
    pub fn label(self, label: &str) -> Self {
        self.alt.label = Some(label.to_string());
        self
    }

    /// Flag this alternative as ambiguous.
    pub fn ambiguous(self) -> Self {
        self.alt.ambiguous = true;
        self
    }
}

impl GrammarBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        GrammarBuilder {
            interner,
            start: None,
            rules: Vec::new(),
            rule_index: FxHashMap::default(),
            literals: Vec::new(),
            declared_terminals: Vec::new(),
            strict: false,
        }
    }

    /// Set the start symbol. Defaults to the first rule defined.
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.to_string());
        self
    }

    /// Declare that token text `literal` lexes as terminal kind `kind`.
    pub fn token(&mut self, kind: &str, literal: &str) -> &mut Self {
        self.literals.push((literal.to_string(), kind.to_string()));
        self
    }

    /// Declare a terminal kind and switch to strict name resolution.
    pub fn terminal(&mut self, kind: &str) -> &mut Self {
        self.declared_terminals.push(kind.to_string());
        self.strict = true;
        self
    }

    /// Whether `name` has at least one alternative.
    pub fn has_rule(&self, name: &str) -> bool {
        self.rule_index.contains_key(name)
    }

    /// Add an alternative `lhs := rhs...`. An empty `rhs` is the empty
    /// alternative.
    pub fn rule(&mut self, lhs: &str, rhs: &[&str]) -> AltHandle<'_> {
        self.push_alt(
            lhs,
            AltDef {
                rhs: rhs.iter().map(|s| (*s).to_string()).collect(),
                label: None,
                ambiguous: false,
            },
        )
    }

    /// Add an alternative flagged ambiguous.
    pub fn ambiguous(&mut self, lhs: &str, rhs: &[&str]) -> AltHandle<'_> {
        self.rule(lhs, rhs).ambiguous()
    }

    fn push_alt(&mut self, lhs: &str, alt: AltDef) -> AltHandle<'_> {
        let rule = match self.rule_index.get(lhs) {
            Some(&index) => index,
            None => {
                self.rules.push(RuleDef {
                    name: lhs.to_string(),
                    alts: Vec::new(),
                });
                let index = self.rules.len() - 1;
                self.rule_index.insert(lhs.to_string(), index);
                index
            }
        };
        let alts = &mut self.rules[rule].alts;
        alts.push(alt);
        let index = alts.len() - 1;
        AltHandle {
            alt: &mut alts[index],
        }
    }

    /// Validate the rules and compute the grammar analysis.
    pub fn build(&self) -> Result<GrammarTable, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }
        let interner = &self.interner;

        let start_text = self
            .start
            .as_deref()
            .unwrap_or(self.rules[0].name.as_str());
        if !self.rule_index.contains_key(start_text) {
            return Err(GrammarError::UnknownNonterminal {
                name: start_text.to_string(),
            });
        }
        if start_text.starts_with('_') {
            return Err(GrammarError::HiddenStart {
                name: start_text.to_string(),
            });
        }

        let literals = self.resolve_literals()?;

        let declared: FxHashSet<&str> = self
            .declared_terminals
            .iter()
            .map(String::as_str)
            .chain(self.literals.iter().map(|(_, kind)| kind.as_str()))
            .collect();

        let mut terminals: Vec<Name> = Vec::new();
        let mut terminal_seen: FxHashSet<Name> = FxHashSet::default();
        let mut note_terminal = |name: Name| {
            if terminal_seen.insert(name) {
                terminals.push(name);
            }
        };
        for kind in &self.declared_terminals {
            note_terminal(interner.intern(kind));
        }
        for (_, kind) in &self.literals {
            note_terminal(interner.intern(kind));
        }

        let mut productions = Vec::new();
        let mut nonterminals = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let lhs = interner.intern(&rule.name);
            nonterminals.push(lhs);
            for (alternative, alt) in rule.alts.iter().enumerate() {
                let mut rhs = Vec::with_capacity(alt.rhs.len());
                for item in &alt.rhs {
                    let name = interner.intern(item);
                    if self.rule_index.contains_key(item.as_str()) {
                        rhs.push(Symbol::Nonterminal(name));
                    } else if self.strict && !declared.contains(item.as_str()) {
                        return Err(GrammarError::UnknownNonterminal { name: item.clone() });
                    } else {
                        note_terminal(name);
                        rhs.push(Symbol::Terminal(name));
                    }
                }
                let label = alt.label.as_deref().map_or(lhs, |l| interner.intern(l));
                productions.push(Production {
                    id: ProductionId::new(productions.len() as u32),
                    lhs,
                    alternative: alternative as u32,
                    label,
                    rhs: rhs.into_boxed_slice(),
                    ambiguous: alt.ambiguous,
                });
            }
        }

        let start = interner.intern(start_text);
        let analysis = Analysis::compute(&productions, &nonterminals, start);
        let edges = left_corners(&productions, &analysis.nullable);
        if let Some(cycle) = find_left_recursion(&nonterminals, &edges) {
            return Err(GrammarError::LeftRecursion {
                cycle: cycle
                    .into_iter()
                    .map(|nt| interner.lookup(nt).to_string())
                    .collect(),
            });
        }

        debug!(
            nonterminals = nonterminals.len(),
            productions = productions.len(),
            terminals = terminals.len(),
            start = start_text,
            "grammar built"
        );

        Ok(GrammarTable::from_parts(TableParts {
            interner: SharedInterner::clone(interner),
            start,
            productions,
            nonterminals,
            terminals,
            literals,
            analysis,
        }))
    }

    fn resolve_literals(&self) -> Result<FxHashMap<Name, Name>, GrammarError> {
        let mut by_text: FxHashMap<&str, &str> = FxHashMap::default();
        let mut literals = FxHashMap::default();
        for (text, kind) in &self.literals {
            match by_text.get(text.as_str()) {
                Some(&existing) if existing != kind => {
                    return Err(GrammarError::DuplicateLiteral {
                        literal: text.clone(),
                        first: existing.to_string(),
                        second: kind.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    by_text.insert(text, kind);
                    literals.insert(self.interner.intern(text), self.interner.intern(kind));
                }
            }
        }
        Ok(literals)
    }
}

#[cfg(test)]
mod tests;
