//! Grammar types.

use crate::{
    types::Map,
    util::{display_fn, write_spaced},
};
use std::{borrow::Cow, fmt, ops::Index};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolID {
    raw: u16,
}

impl SymbolID {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    /// The position of this symbol in its symbol set, also used as the bit index in symbol sets.
    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

/// A grammar symbol, tagged with its kind at declaration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(Cow<'static, str>),
    Nonterminal(Cow<'static, str>),
    /// The marker implicitly appended to every input.
    EndOfInput(Cow<'static, str>),
}

impl Symbol {
    pub fn terminal(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Terminal(name.into())
    }

    pub fn nonterminal(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Nonterminal(name.into())
    }

    pub fn end_of_input(name: impl Into<Cow<'static, str>>) -> Self {
        Self::EndOfInput(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Terminal(name) | Self::Nonterminal(name) | Self::EndOfInput(name) => name,
        }
    }

    /// Return whether this symbol may appear in the input, the end marker included.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(..) | Self::EndOfInput(..))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Self::Nonterminal(..))
    }

    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput(..))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of symbols declared by a grammar.
#[derive(Debug, Clone)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
    names: Map<String, SymbolID>,
    end_of_input: SymbolID,
}

impl SymbolSet {
    /// Build a symbol set, assigning IDs in declaration order.
    pub fn new<I>(symbols: I) -> Result<Self, GrammarDefError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut decls = Declarations::default();
        for symbol in symbols {
            decls.declare(symbol)?;
        }
        decls.finish()
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: SymbolID) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn end_of_input(&self) -> SymbolID {
        self.end_of_input
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolID, &Symbol)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolID::from_raw(i as u16), symbol))
    }
}

impl Index<SymbolID> for SymbolSet {
    type Output = Symbol;

    fn index(&self, id: SymbolID) -> &Symbol {
        &self.symbols[id.index()]
    }
}

/// Symbols collected so far, before the end marker has been checked.
#[derive(Debug, Default)]
struct Declarations {
    symbols: Vec<Symbol>,
    names: Map<String, SymbolID>,
    end_of_input: Option<SymbolID>,
}

impl Declarations {
    fn declare(&mut self, symbol: Symbol) -> Result<SymbolID, GrammarDefError> {
        if !verify_ident(symbol.name()) {
            return Err(GrammarDefError::InvalidName(symbol.name().to_owned()));
        }
        if self.names.contains_key(symbol.name()) {
            return Err(GrammarDefError::DuplicateSymbol(symbol.name().to_owned()));
        }
        if symbol.is_end_of_input() {
            if let Some(existing) = self.end_of_input {
                return Err(GrammarDefError::DuplicateEndOfInput {
                    existing: self.symbols[existing.index()].name().to_owned(),
                    name: symbol.name().to_owned(),
                });
            }
        }

        let raw = u16::try_from(self.symbols.len()).map_err(|_| GrammarDefError::TooManySymbols)?;
        let id = SymbolID::from_raw(raw);
        if symbol.is_end_of_input() {
            self.end_of_input = Some(id);
        }
        self.names.insert(symbol.name().to_owned(), id);
        self.symbols.push(symbol);
        Ok(id)
    }

    fn kind_of(&self, id: SymbolID) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    fn finish(self) -> Result<SymbolSet, GrammarDefError> {
        let end_of_input = self.end_of_input.ok_or(GrammarDefError::MissingEndOfInput)?;
        Ok(SymbolSet {
            symbols: self.symbols,
            names: self.names,
            end_of_input,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    /// The augmented rule `EndOfInput -> Start EndOfInput`.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

/// The type that represents a production rule in grammar.
///
/// Two rules are equal when their heads and children are, regardless of their names.
#[derive(Debug, Clone)]
pub struct Rule {
    id: RuleID,
    name: Cow<'static, str>,
    head: SymbolID,
    children: Vec<SymbolID>,
}

impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the left-hand side of this production.
    pub fn head(&self) -> SymbolID {
        self.head
    }

    /// Return the right-hand side of this production.
    pub fn children(&self) -> &[SymbolID] {
        &self.children[..]
    }

    // `"NAME: HEAD := C1 C2 C3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{}: {} :=", self.name, g.symbols[self.head])?;
            for child in &self.children {
                write!(f, " {}", g.symbols[*child])?;
            }
            Ok(())
        })
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head && self.children == other.children
    }
}

impl Eq for Rule {}

impl std::hash::Hash for Rule {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.head.hash(state);
        self.children.hash(state);
    }
}

/// Build the ordered rule collection from named `(head, children)` pairs.
///
/// Rules are numbered in the order they are given.
pub fn build_rules<'a, I, C>(symbols: &SymbolSet, rules: I) -> Result<Vec<Rule>, GrammarDefError>
where
    I: IntoIterator<Item = (&'a str, (&'a str, C))>,
    C: IntoIterator<Item = &'a str>,
{
    let lookup = |rule: &str, name: &str| {
        symbols
            .lookup(name)
            .ok_or_else(|| GrammarDefError::UndeclaredSymbol {
                rule: rule.to_owned(),
                symbol: name.to_owned(),
            })
    };

    let mut built: Vec<Rule> = vec![];
    for (name, (head, children)) in rules {
        let head = lookup(name, head)?;
        let children = children
            .into_iter()
            .map(|child| lookup(name, child))
            .collect::<Result<_, _>>()?;
        let rule = Rule {
            id: rule_id(built.len())?,
            name: name.to_owned().into(),
            head,
            children,
        };
        check_rule(&symbols.symbols, &built, &rule)?;
        built.push(rule);
    }
    Ok(built)
}

fn rule_id(position: usize) -> Result<RuleID, GrammarDefError> {
    u16::try_from(position)
        .ok()
        .and_then(|raw| raw.checked_add(RuleID::OFFSET))
        .map(RuleID::from_raw)
        .ok_or(GrammarDefError::TooManyRules)
}

fn check_rule(symbols: &[Symbol], existing: &[Rule], rule: &Rule) -> Result<(), GrammarDefError> {
    let undeclared = |id: SymbolID| GrammarDefError::UndeclaredSymbol {
        rule: rule.name().to_owned(),
        symbol: format!("{:?}", id),
    };

    match symbols.get(rule.head.index()) {
        Some(head) if head.is_nonterminal() => (),
        Some(head) => {
            return Err(GrammarDefError::HeadNotNonterminal {
                rule: rule.name().to_owned(),
                symbol: head.name().to_owned(),
            })
        }
        None => return Err(undeclared(rule.head)),
    }
    if let Some(&child) = rule.children.iter().find(|c| c.index() >= symbols.len()) {
        return Err(undeclared(child));
    }
    if let Some(&child) = rule
        .children
        .iter()
        .find(|c| symbols[c.index()].is_end_of_input())
    {
        return Err(GrammarDefError::EndOfInputInRule {
            rule: rule.name().to_owned(),
            symbol: symbols[child.index()].name().to_owned(),
        });
    }

    for other in existing {
        if other.name == rule.name {
            return Err(GrammarDefError::DuplicateRuleName(rule.name().to_owned()));
        }
        if other == rule {
            return Err(GrammarDefError::DuplicateProduction {
                rule: rule.name().to_owned(),
                existing: other.name().to_owned(),
            });
        }
    }

    Ok(())
}

/// The grammar definition used to derive the parse tables.
#[derive(Debug, Clone)]
pub struct Grammar {
    symbols: SymbolSet,
    rules: Map<RuleID, Rule>,
    start_symbol: SymbolID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        let terminals = self.symbols.iter().map(|(_, s)| s);
        write_spaced(f, terminals.filter(|s| matches!(s, Symbol::Terminal(..))))?;
        writeln!(f)?;

        writeln!(f, "\n## end of input:")?;
        writeln!(f, "{}", self.symbols[self.symbols.end_of_input()])?;

        writeln!(f, "\n## nonterminals:")?;
        for (id, symbol) in self.symbols.iter().filter(|(_, s)| s.is_nonterminal()) {
            write!(f, "{}", symbol)?;
            if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules() {
            writeln!(f, "{}", rule.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Assemble a grammar from a symbol set, the name of its start symbol and its rules.
    ///
    /// The rules are renumbered in the given order.
    pub fn new<I>(symbols: SymbolSet, start: &str, rules: I) -> Result<Self, GrammarDefError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let start_symbol = symbols
            .lookup(start)
            .ok_or_else(|| GrammarDefError::UnknownStartSymbol(start.to_owned()))?;
        Self::assemble(symbols, start_symbol, rules)
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            decls: Declarations::default(),
            rules: vec![],
            start: None,
        };
        f(&mut def)?;
        def.end()
    }

    fn assemble<I>(symbols: SymbolSet, start_symbol: SymbolID, rules: I) -> Result<Self, GrammarDefError>
    where
        I: IntoIterator<Item = Rule>,
    {
        match symbols.get(start_symbol) {
            Some(symbol) if symbol.is_nonterminal() => (),
            Some(symbol) => return Err(GrammarDefError::StartNotNonterminal(symbol.name().to_owned())),
            None => return Err(GrammarDefError::UnknownStartSymbol(format!("{:?}", start_symbol))),
        }

        let mut checked: Vec<Rule> = vec![];
        for mut rule in rules {
            rule.id = rule_id(checked.len())?;
            check_rule(&symbols.symbols, &checked, &rule)?;
            checked.push(rule);
        }

        let mut map = Map::default();
        map.insert(
            RuleID::ACCEPT,
            Rule {
                id: RuleID::ACCEPT,
                name: "$accept".into(),
                head: symbols.end_of_input(),
                children: vec![start_symbol, symbols.end_of_input()],
            },
        );
        map.extend(checked.into_iter().map(|rule| (rule.id, rule)));

        Ok(Self {
            symbols,
            rules: map,
            start_symbol,
        })
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn symbol(&self, id: SymbolID) -> &Symbol {
        &self.symbols[id]
    }

    pub fn start_symbol(&self) -> SymbolID {
        self.start_symbol
    }

    pub fn end_of_input(&self) -> SymbolID {
        self.symbols.end_of_input()
    }

    /// Iterate over the rules declared by the user, in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values().filter(|rule| rule.id != RuleID::ACCEPT)
    }

    /// Iterate over the user rules whose head is `head`.
    pub fn rules_of(&self, head: SymbolID) -> impl Iterator<Item = &Rule> + '_ {
        self.rules().filter(move |rule| rule.head == head)
    }

    /// Return the rule with the given ID, the augmented rule included.
    ///
    /// # Panics
    /// Panics if the ID does not belong to this grammar.
    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules().find(|rule| rule.name == name)
    }

    pub fn accept_rule(&self) -> &Rule {
        self.rule(RuleID::ACCEPT)
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    decls: Declarations,
    rules: Vec<Rule>,
    start: Option<SymbolID>,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        self.decls.declare(Symbol::terminal(name.to_owned()))
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        self.decls.declare(Symbol::nonterminal(name.to_owned()))
    }

    /// Declare the end-of-input marker. Exactly one must be declared.
    pub fn end_of_input(&mut self, name: &str) -> Result<SymbolID, GrammarDefError> {
        self.decls.declare(Symbol::end_of_input(name.to_owned()))
    }

    /// Specify a production rule into this grammar.
    pub fn rule<I>(&mut self, name: &str, head: SymbolID, children: I) -> Result<RuleID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let rule = Rule {
            id: rule_id(self.rules.len())?,
            name: name.to_owned().into(),
            head,
            children: children.into_iter().collect(),
        };
        check_rule(&self.decls.symbols, &self.rules, &rule)?;
        let id = rule.id;
        self.rules.push(rule);
        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: SymbolID) -> Result<(), GrammarDefError> {
        match self.decls.kind_of(symbol) {
            Some(s) if s.is_nonterminal() => {
                self.start.replace(symbol);
                Ok(())
            }
            Some(s) => Err(GrammarDefError::StartNotNonterminal(s.name().to_owned())),
            None => Err(GrammarDefError::UnknownStartSymbol(format!("{:?}", symbol))),
        }
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // Fall back to the first declared nonterminal.
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .decls
                .symbols
                .iter()
                .position(Symbol::is_nonterminal)
                .map(|i| SymbolID::from_raw(i as u16))
                .ok_or(GrammarDefError::EmptyNonterminals)?,
        };
        let symbols = self.decls.finish()?;
        Grammar::assemble(symbols, start, self.rules)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("incorrect symbol name: `{}'", _0)]
    InvalidName(String),

    #[error("the symbol `{}' has already been declared", _0)]
    DuplicateSymbol(String),

    #[error("missing end-of-input symbol")]
    MissingEndOfInput,

    #[error("the end-of-input symbol `{existing}' has already been declared (found `{name}')")]
    DuplicateEndOfInput { existing: String, name: String },

    #[error("undeclared symbol `{symbol}' in rule `{rule}'")]
    UndeclaredSymbol { rule: String, symbol: String },

    #[error("the head of rule `{rule}' is not a nonterminal: `{symbol}'")]
    HeadNotNonterminal { rule: String, symbol: String },

    /// The end marker is appended by the parser and cannot be written in a production.
    #[error("the end-of-input symbol `{symbol}' appears in the body of rule `{rule}'")]
    EndOfInputInRule { rule: String, symbol: String },

    #[error("the rule name `{}' has already been used", _0)]
    DuplicateRuleName(String),

    #[error("the rule `{rule}' duplicates the production of `{existing}'")]
    DuplicateProduction { rule: String, existing: String },

    #[error("unknown start symbol: `{}'", _0)]
    UnknownStartSymbol(String),

    #[error("the start symbol is not a nonterminal: `{}'", _0)]
    StartNotNonterminal(String),

    #[error("empty nonterminal symbols")]
    EmptyNonterminals,

    #[error("too many symbols")]
    TooManySymbols,

    #[error("too many rules")]
    TooManyRules,
}

fn verify_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        // The identifier must be started with XID-Start.
        _ => false,
    }
}
