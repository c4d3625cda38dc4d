//! Grammar definition text format.
//!
//! ```text
//! # comment
//! %start json
//! %token brace1 "{"
//! %terminal string number
//! json   := object | array
//! object := brace1 members? brace2
//! expr  ?= call | cast
//! sum    := name "+" name @binary
//! empty  := %empty
//! ```
//!
//! A statement starts at the beginning of a line. A rule's alternatives may
//! continue on following lines as long as each continuation line starts
//! with `|`. Postfix `?`, `*` and `+` apply to a single symbol and are
//! rewritten into hidden rules (`_name_N`) so they build no node.

use logos::Logos;
use rustc_hash::FxHashMap;
use tangle_ir::{SharedInterner, Span};

use crate::{GrammarBuilder, GrammarError, GrammarTable};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
enum GrammarToken {
    #[regex(r"#[^\n]*")]
    Comment,

    #[token("\n")]
    Newline,

    #[token(":=")]
    Define,
    #[token("?=")]
    DefineAmbiguous,
    #[token("|")]
    Bar,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,

    #[token("%start")]
    StartDirective,
    #[token("%token")]
    TokenDirective,
    #[token("%terminal")]
    TerminalDirective,
    #[token("%empty")]
    Empty,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Label,

    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    Literal,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

#[derive(Copy, Clone, Debug)]
struct Lexeme<'t> {
    token: GrammarToken,
    text: &'t str,
    span: Span,
}

/// One right-hand-side item before desugaring.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Item {
    Name(String),
    Literal(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Repeat {
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Clone, Debug)]
struct AltSyntax {
    items: Vec<(Item, Option<Repeat>)>,
    label: Option<String>,
}

#[derive(Clone, Debug)]
enum Statement {
    Start(String),
    Token { kind: String, literal: String },
    Terminals(Vec<String>),
    Rule {
        name: String,
        ambiguous: bool,
        alts: Vec<AltSyntax>,
    },
}

/// Parse grammar text and build the table.
pub fn load_grammar(text: &str, interner: &SharedInterner) -> Result<GrammarTable, GrammarError> {
    let statements = GrammarParser::new(text)?.parse()?;
    lower(&statements, interner).build()
}

/// Parse grammar text into a builder, for callers that add rules of their own.
pub fn load_builder(text: &str, interner: &SharedInterner) -> Result<GrammarBuilder, GrammarError> {
    let statements = GrammarParser::new(text)?.parse()?;
    Ok(lower(&statements, interner))
}

struct GrammarParser<'t> {
    source: &'t str,
    lexemes: Vec<Lexeme<'t>>,
    pos: usize,
}

impl<'t> GrammarParser<'t> {
    fn new(source: &'t str) -> Result<Self, GrammarError> {
        let mut lexemes = Vec::new();
        let mut lexer = GrammarToken::lexer(source);
        while let Some(result) = lexer.next() {
            let span = Span::try_from_range(lexer.span()).map_err(|e| GrammarError::Syntax {
                line: 0,
                column: 0,
                span: Span::DUMMY,
                message: e.to_string(),
            })?;
            match result {
                Ok(GrammarToken::Comment) => {}
                Ok(token) => lexemes.push(Lexeme {
                    token,
                    text: lexer.slice(),
                    span,
                }),
                Err(()) => {
                    return Err(syntax_error(
                        source,
                        span,
                        format!("unexpected `{}`", lexer.slice()),
                    ))
                }
            }
        }
        Ok(GrammarParser {
            source,
            lexemes,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<Lexeme<'t>> {
        self.lexemes.get(self.pos).copied()
    }

    fn peek_token(&self) -> Option<GrammarToken> {
        self.peek().map(|l| l.token)
    }

    fn skip_newlines(&mut self) {
        while self.peek_token() == Some(GrammarToken::Newline) {
            self.pos += 1;
        }
    }

    /// Whether the next non-newline token is `|`, continuing the rule.
    fn continues_rule(&self) -> bool {
        self.lexemes[self.pos..]
            .iter()
            .find(|l| l.token != GrammarToken::Newline)
            .is_some_and(|l| l.token == GrammarToken::Bar)
    }

    fn error_here(&self, message: impl Into<String>) -> GrammarError {
        let span = self.peek().map_or_else(
            || {
                let end = self.source.len() as u32;
                Span::new(end, end)
            },
            |l| l.span,
        );
        syntax_error(self.source, span, message.into())
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, GrammarError> {
        match self.peek() {
            Some(l) if l.token == GrammarToken::Ident => {
                self.pos += 1;
                Ok(l.text.to_string())
            }
            _ => Err(self.error_here(format!("expected {what}"))),
        }
    }

    fn expect_end_of_statement(&mut self) -> Result<(), GrammarError> {
        match self.peek_token() {
            None => Ok(()),
            Some(GrammarToken::Newline) => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error_here("expected end of line")),
        }
    }

    fn parse(mut self) -> Result<Vec<Statement>, GrammarError> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            let Some(lexeme) = self.peek() else {
                break;
            };
            let statement = match lexeme.token {
                GrammarToken::StartDirective => {
                    self.pos += 1;
                    Statement::Start(self.expect_ident("a rule name after `%start`")?)
                }
                GrammarToken::TokenDirective => {
                    self.pos += 1;
                    let kind = self.expect_ident("a terminal kind after `%token`")?;
                    let literal = match self.peek() {
                        Some(l) if l.token == GrammarToken::Literal => {
                            self.pos += 1;
                            unquote(l.text)
                        }
                        _ => return Err(self.error_here("expected a quoted literal")),
                    };
                    Statement::Token { kind, literal }
                }
                GrammarToken::TerminalDirective => {
                    self.pos += 1;
                    let mut kinds = vec![self.expect_ident("a terminal kind after `%terminal`")?];
                    while self.peek_token() == Some(GrammarToken::Ident) {
                        kinds.push(self.expect_ident("a terminal kind")?);
                    }
                    Statement::Terminals(kinds)
                }
                GrammarToken::Ident => self.parse_rule()?,
                _ => return Err(self.error_here("expected a rule or a directive")),
            };
            statements.push(statement);
            self.expect_end_of_statement()?;
        }
        Ok(statements)
    }

    fn parse_rule(&mut self) -> Result<Statement, GrammarError> {
        let name = self.expect_ident("a rule name")?;
        let ambiguous = match self.peek_token() {
            Some(GrammarToken::Define) => false,
            Some(GrammarToken::DefineAmbiguous) => true,
            _ => return Err(self.error_here("expected `:=` or `?=`")),
        };
        self.pos += 1;

        let mut alts = vec![self.parse_alternative()?];
        while self.continues_rule() {
            self.skip_newlines();
            self.pos += 1; // `|`
            alts.push(self.parse_alternative()?);
        }
        Ok(Statement::Rule {
            name,
            ambiguous,
            alts,
        })
    }

    fn parse_alternative(&mut self) -> Result<AltSyntax, GrammarError> {
        let mut items = Vec::new();
        let mut empty = false;
        let mut label = None;
        loop {
            let Some(lexeme) = self.peek() else {
                break;
            };
            match lexeme.token {
                GrammarToken::Ident | GrammarToken::Literal => {
                    if empty {
                        return Err(self.error_here("`%empty` must be the only item"));
                    }
                    self.pos += 1;
                    let item = if lexeme.token == GrammarToken::Ident {
                        Item::Name(lexeme.text.to_string())
                    } else {
                        Item::Literal(unquote(lexeme.text))
                    };
                    let repeat = match self.peek_token() {
                        Some(GrammarToken::Question) => Some(Repeat::Optional),
                        Some(GrammarToken::Star) => Some(Repeat::ZeroOrMore),
                        Some(GrammarToken::Plus) => Some(Repeat::OneOrMore),
                        _ => None,
                    };
                    if repeat.is_some() {
                        self.pos += 1;
                    }
                    items.push((item, repeat));
                }
                GrammarToken::Empty => {
                    if empty || !items.is_empty() {
                        return Err(self.error_here("`%empty` must be the only item"));
                    }
                    self.pos += 1;
                    empty = true;
                }
                GrammarToken::Label => {
                    self.pos += 1;
                    label = Some(lexeme.text[1..].to_string());
                    break;
                }
                GrammarToken::Bar | GrammarToken::Newline => break,
                GrammarToken::Question | GrammarToken::Star | GrammarToken::Plus => {
                    return Err(self.error_here("repetition must follow a symbol"));
                }
                _ => return Err(self.error_here("unexpected token in alternative")),
            }
        }
        if items.is_empty() && !empty {
            return Err(self.error_here("empty alternative; write `%empty`"));
        }
        Ok(AltSyntax { items, label })
    }
}

fn syntax_error(source: &str, span: Span, message: String) -> GrammarError {
    let offset = (span.start as usize).min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |i| i + 1) + 1;
    GrammarError::Syntax {
        line: line as u32,
        column: column as u32,
        span,
        message,
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Turns parsed statements into builder calls, desugaring repetition.
struct Lowering<'s> {
    builder: GrammarBuilder,
    literal_kinds: FxHashMap<&'s str, &'s str>,
    repeats: FxHashMap<(String, Repeat), String>,
    counters: FxHashMap<String, u32>,
}

fn lower<'s>(statements: &'s [Statement], interner: &SharedInterner) -> GrammarBuilder {
    let mut lowering: Lowering<'s> = Lowering {
        builder: GrammarBuilder::new(SharedInterner::clone(interner)),
        literal_kinds: FxHashMap::default(),
        repeats: FxHashMap::default(),
        counters: FxHashMap::default(),
    };

    // Directives first: a literal may be used before its `%token` line.
    for statement in statements {
        match statement {
            Statement::Start(name) => {
                lowering.builder.start(name);
            }
            Statement::Token { kind, literal } => {
                lowering.builder.token(kind, literal);
                lowering
                    .literal_kinds
                    .entry(literal.as_str())
                    .or_insert(kind.as_str());
            }
            Statement::Terminals(kinds) => {
                for kind in kinds {
                    lowering.builder.terminal(kind);
                }
            }
            Statement::Rule { .. } => {}
        }
    }

    // Hidden rule names must not collide with rules defined later in the text.
    let user_rules: Vec<&str> = statements
        .iter()
        .filter_map(|s| match s {
            Statement::Rule { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();

    // Hidden rules are registered before the rule that uses them, so the
    // default start is pinned to the first rule written.
    let has_start = statements.iter().any(|s| matches!(s, Statement::Start(_)));
    if let (false, Some(first)) = (has_start, user_rules.first()) {
        lowering.builder.start(first);
    }

    for statement in statements {
        if let Statement::Rule {
            name,
            ambiguous,
            alts,
        } = statement
        {
            for alt in alts {
                let rhs: Vec<String> = alt
                    .items
                    .iter()
                    .map(|(item, repeat)| lowering.lower_item(name, item, *repeat, &user_rules))
                    .collect();
                let rhs_refs: Vec<&str> = rhs.iter().map(String::as_str).collect();
                let mut handle = lowering.builder.rule(name, &rhs_refs);
                if *ambiguous {
                    handle = handle.ambiguous();
                }
                if let Some(label) = &alt.label {
                    handle.label(label);
                }
            }
        }
    }
    lowering.builder
}

impl<'s> Lowering<'s> {
    fn symbol_name(&mut self, item: &'s Item) -> String {
        match item {
            Item::Name(name) => name.clone(),
            Item::Literal(text) => {
                if let Some(kind) = self.literal_kinds.get(text.as_str()) {
                    (*kind).to_string()
                } else {
                    self.builder.token(text, text);
                    self.literal_kinds.insert(text.as_str(), text.as_str());
                    text.clone()
                }
            }
        }
    }

    fn lower_item(
        &mut self,
        owner: &str,
        item: &'s Item,
        repeat: Option<Repeat>,
        user_rules: &[&str],
    ) -> String {
        let symbol = self.symbol_name(item);
        let Some(repeat) = repeat else {
            return symbol;
        };
        if let Some(hidden) = self.repeats.get(&(symbol.clone(), repeat)) {
            return hidden.clone();
        }
        let hidden = match repeat {
            Repeat::Optional => {
                let hidden = self.fresh_name(owner, user_rules);
                self.builder.rule(&hidden, &[&symbol]);
                self.builder.rule(&hidden, &[]);
                hidden
            }
            Repeat::ZeroOrMore => {
                let hidden = self.fresh_name(owner, user_rules);
                self.builder.rule(&hidden, &[&symbol, &hidden]);
                self.builder.rule(&hidden, &[]);
                hidden
            }
            Repeat::OneOrMore => {
                let rest = self.lower_item(owner, item, Some(Repeat::ZeroOrMore), user_rules);
                let hidden = self.fresh_name(owner, user_rules);
                self.builder.rule(&hidden, &[&symbol, &rest]);
                hidden
            }
        };
        self.repeats.insert((symbol, repeat), hidden.clone());
        hidden
    }

    fn fresh_name(&mut self, owner: &str, user_rules: &[&str]) -> String {
        let base = owner.trim_start_matches('_');
        loop {
            let counter = self.counters.entry(base.to_string()).or_insert(0);
            *counter += 1;
            let candidate = format!("_{base}_{counter}");
            if !user_rules.contains(&candidate.as_str()) && !self.builder.has_rule(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests;
