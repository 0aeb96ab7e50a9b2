//! Compilation of the SLR(1) action table.

use crate::{
    analysis::SymbolAnalysis,
    grammar::{Grammar, RuleID, Symbol, SymbolID},
    lr0::StateGraph,
    types::Map,
    util::display_fn,
    Node, ParseError, Token,
};
use indexmap::map::Entry;
use slrgen_runtime::{ParseAction, ParseTable, StateID};
use std::fmt;

pub type Action = ParseAction<RuleID>;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The grammar is not SLR(1).
    #[error("conflict in state {state:?} on `{symbol_name}': {existing:?} vs {incoming:?}")]
    Conflict {
        state: StateID,
        symbol: SymbolID,
        symbol_name: String,
        existing: Action,
        incoming: Action,
    },

    #[error("nondeterministic transition from {state:?} on {symbol:?}: {existing:?} vs {incoming:?}")]
    NondeterministicTransition {
        state: StateID,
        symbol: SymbolID,
        existing: StateID,
        incoming: StateID,
    },

    #[error("too many states")]
    TooManyStates,
}

/// The compiled, immutable shift/reduce table of a grammar.
#[derive(Debug, Clone)]
pub struct ActionTable {
    grammar: Grammar,
    states: Map<StateID, Map<SymbolID, Action>>,
}

impl ActionTable {
    /// Analyze the grammar, build its LR(0) automaton and compile both into a table.
    pub fn compile(g: &Grammar) -> Result<Self, CompileError> {
        let span = tracing::debug_span!("compile");
        let _entered = span.enter();

        let analysis = SymbolAnalysis::compute(g);
        let graph = StateGraph::build(g)?;
        let table = Self::from_parts(g, &graph, &analysis)?;

        tracing::debug!(
            states = table.states.len(),
            actions = table.states.values().map(Map::len).sum::<usize>(),
            "compiled action table"
        );
        Ok(table)
    }

    /// Compile an already built automaton and analysis of `g`.
    pub fn from_parts(
        g: &Grammar,
        graph: &StateGraph,
        analysis: &SymbolAnalysis<'_>,
    ) -> Result<Self, CompileError> {
        let mut states = Map::default();
        for (id, state) in graph.states() {
            let mut actions = Map::default();

            // shift/accept
            for (&symbol, &next) in &state.transitions {
                insert_action(g, &mut actions, id, symbol, Action::Shift(next))?;
            }
            if state.label.iter().any(|item| {
                item.rule == RuleID::ACCEPT && item.next_symbol(g) == Some(g.end_of_input())
            }) {
                insert_action(g, &mut actions, id, g.end_of_input(), Action::Accept)?;
            }

            // reduce
            for item in state.label.iter().filter(|item| item.is_complete(g)) {
                let rule = g.rule(item.rule);
                for t in analysis.follow(rule.head()).iter() {
                    let symbol = SymbolID::from_raw(t as u16);
                    insert_action(g, &mut actions, id, symbol, Action::Reduce(rule.id()))?;
                }
            }

            states.insert(id, actions);
        }

        Ok(Self {
            grammar: g.clone(),
            states,
        })
    }

    pub fn action(&self, state: StateID, symbol: SymbolID) -> Option<Action> {
        self.states.get(&state)?.get(&symbol).copied()
    }

    /// Return all actions registered for a state.
    pub fn actions(&self, state: StateID) -> Option<&Map<SymbolID, Action>> {
        self.states.get(&state)
    }

    pub fn start_state(&self) -> StateID {
        StateID::START
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &Map<SymbolID, Action>)> + '_ {
        self.states.iter().map(|(id, actions)| (*id, actions))
    }

    /// Run this table over the tokens and build the parse tree.
    pub fn parse<'t, I>(&self, tokens: I) -> Result<Node<'t>, ParseError>
    where
        I: IntoIterator,
        I::Item: Into<Token<'t>>,
    {
        slrgen_runtime::parse(self, tokens)
    }

    /// Same as [`ActionTable::parse`], but reads from a fallible token source.
    pub fn try_parse<'t, I, E>(&self, tokens: I) -> Result<Node<'t>, ParseError<E>>
    where
        I: IntoIterator<Item = Result<Token<'t>, E>>,
        E: fmt::Display,
    {
        slrgen_runtime::try_parse(self, tokens)
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        let g = &self.grammar;
        display_fn(move |f| {
            for (i, (id, actions)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                for (symbol, action) in actions {
                    let symbol = g.symbol(*symbol);
                    match action {
                        Action::Shift(next) => writeln!(f, "- {} => shift({:?})", symbol, next)?,
                        Action::Reduce(rule) => {
                            writeln!(f, "- {} => reduce({})", symbol, g.rule(*rule).display(g))?
                        }
                        Action::Accept => writeln!(f, "- {} => accept", symbol)?,
                    }
                }
            }
            Ok(())
        })
    }

    /// Render a parse error with symbol names in place of raw IDs.
    pub fn display_error<'a, L>(&'a self, err: &'a ParseError<L>) -> impl fmt::Display + 'a
    where
        L: fmt::Display,
    {
        display_fn(move |f| match err {
            ParseError::Syntax {
                state,
                symbol,
                text,
            } => {
                match (self.grammar.symbols().get(*symbol), text) {
                    (Some(Symbol::EndOfInput(..)), None) => {
                        f.write_str("syntax error: unexpected end of input")?
                    }
                    (Some(symbol), _) => {
                        write!(f, "syntax error: unexpected `{}'", symbol.name())?
                    }
                    (None, _) => write!(f, "syntax error: unexpected {:?}", symbol)?,
                }
                if let Some(text) = text {
                    write!(f, " {:?}", text)?;
                }
                write!(f, " in state {}", state)
            }
            err => write!(f, "{}", err),
        })
    }

    /// Render a parse tree produced by this table, one node per line.
    pub fn display_node<'a>(&'a self, node: &'a Node<'_>) -> impl fmt::Display + 'a {
        display_fn(move |f| write_node(f, &self.grammar, node, 0))
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, g: &Grammar, node: &Node<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:indent$}{}", "", g.symbol(node.symbol()), indent = depth * 2)?;
    match node {
        Node::Leaf { text, .. } => writeln!(f, " {:?}", text),
        Node::Internal { children, rule, .. } => {
            writeln!(f, " ({})", g.rule(*rule).name())?;
            for child in children {
                write_node(f, g, child, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn insert_action(
    g: &Grammar,
    actions: &mut Map<SymbolID, Action>,
    state: StateID,
    symbol: SymbolID,
    action: Action,
) -> Result<(), CompileError> {
    match actions.entry(symbol) {
        Entry::Vacant(entry) => {
            entry.insert(action);
            Ok(())
        }
        Entry::Occupied(entry) => {
            tracing::debug!(?state, ?symbol, "conflicting actions");
            Err(CompileError::Conflict {
                state,
                symbol,
                symbol_name: g.symbol(symbol).name().to_owned(),
                existing: *entry.get(),
                incoming: action,
            })
        }
    }
}

impl ParseTable for ActionTable {
    type Symbol = SymbolID;
    type Rule = RuleID;

    fn initial_state(&self) -> StateID {
        self.start_state()
    }

    fn end_of_input(&self) -> SymbolID {
        self.grammar.end_of_input()
    }

    fn start_symbol(&self) -> SymbolID {
        self.grammar.start_symbol()
    }

    fn is_token(&self, symbol: SymbolID) -> bool {
        matches!(self.grammar.symbols().get(symbol), Some(Symbol::Terminal(..)))
    }

    fn action(&self, current: StateID, lookahead: SymbolID) -> Option<Action> {
        ActionTable::action(self, current, lookahead)
    }

    fn rule_head(&self, rule: RuleID) -> SymbolID {
        self.grammar.rule(rule).head()
    }

    fn rule_children(&self, rule: RuleID) -> &[SymbolID] {
        self.grammar.rule(rule).children()
    }
}
