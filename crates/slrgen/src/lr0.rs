//! Construction of the LR(0) item-set automaton.

use crate::{
    grammar::{Grammar, RuleID, SymbolID},
    table::CompileError,
    types::{Map, Set},
    util::display_fn,
};
use slrgen_runtime::StateID;
use std::{
    collections::{BTreeSet, VecDeque},
    fmt,
};

/// The LR(0) item, a production paired with the position of the parse cursor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub rule: RuleID,
    pub cursor: u16,
}

impl Item {
    pub const fn new(rule: RuleID) -> Self {
        Self { rule, cursor: 0 }
    }

    /// The symbol right after the cursor, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.rule(self.rule)
            .children()
            .get(usize::from(self.cursor))
            .copied()
    }

    pub fn advance(self) -> Self {
        Self {
            cursor: self.cursor + 1,
            ..self
        }
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.cursor) == g.rule(self.rule).children().len()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let rule = g.rule(self.rule);
            write!(f, "{} -> [", g.symbol(rule.head()))?;
            for (i, child) in rule.children().iter().enumerate() {
                if i == usize::from(self.cursor) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol(*child))?;
            }
            if self.is_complete(g) {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

/// A closure-complete item set. Two states are the same iff their labels are equal.
pub type Label = BTreeSet<Item>;

#[derive(Debug, Clone)]
pub struct State {
    pub label: Label,
    pub transitions: Map<SymbolID, StateID>,
}

impl State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            for item in &self.label {
                writeln!(f, "- {}", item.display(g))?;
            }
            if !self.transitions.is_empty() {
                writeln!(f, "## transitions:")?;
                for (symbol, next) in &self.transitions {
                    writeln!(f, "- {} => {:?}", g.symbol(*symbol), next)?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct StateGraph {
    states: Map<StateID, State>,
    labels: Map<Label, StateID>,
}

impl StateGraph {
    /// Build the automaton, starting from the closure of the augmented start item.
    pub fn build(g: &Grammar) -> Result<Self, CompileError> {
        let mut graph = Self {
            states: Map::default(),
            labels: Map::default(),
        };

        // Shifting the end marker means acceptance, so it never gets a transition.
        let alphabet: Set<SymbolID> = g
            .symbols()
            .iter()
            .map(|(id, _)| id)
            .filter(|id| *id != g.end_of_input())
            .collect();

        let start = graph.register(closure(g, [Item::new(RuleID::ACCEPT)]))?;
        let mut pending = VecDeque::from([start]);
        while let Some(current) = pending.pop_front() {
            for &symbol in &alphabet {
                let label = goto(g, &graph.states[&current].label, symbol);
                if label.is_empty() {
                    continue;
                }
                let next = match graph.labels.get(&label) {
                    Some(id) => *id,
                    None => {
                        let id = graph.register(label)?;
                        pending.push_back(id);
                        id
                    }
                };
                graph.connect(current, symbol, next)?;
            }
        }

        tracing::debug!(states = graph.states.len(), "built LR(0) automaton");
        Ok(graph)
    }

    fn register(&mut self, label: Label) -> Result<StateID, CompileError> {
        let raw = u16::try_from(self.states.len()).map_err(|_| CompileError::TooManyStates)?;
        let id = StateID::from_raw(raw);
        self.labels.insert(label.clone(), id);
        self.states.insert(
            id,
            State {
                label,
                transitions: Map::default(),
            },
        );
        Ok(id)
    }

    fn connect(&mut self, from: StateID, symbol: SymbolID, to: StateID) -> Result<(), CompileError> {
        let transitions = &mut self.states[&from].transitions;
        match transitions.get(&symbol) {
            Some(&existing) if existing != to => Err(CompileError::NondeterministicTransition {
                state: from,
                symbol,
                existing,
                incoming: to,
            }),
            Some(..) => Ok(()),
            None => {
                transitions.insert(symbol, to);
                Ok(())
            }
        }
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &State)> + '_ {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    pub fn state(&self, id: StateID) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn transition(&self, id: StateID, symbol: SymbolID) -> Option<StateID> {
        self.states.get(&id)?.transitions.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Expand the kernel with the initial items of every nonterminal that appears after a cursor.
pub fn closure<I>(g: &Grammar, kernel: I) -> Label
where
    I: IntoIterator<Item = Item>,
{
    let mut label: Label = kernel.into_iter().collect();
    let mut pending: Vec<Item> = label.iter().copied().collect();
    while let Some(item) = pending.pop() {
        let Some(next) = item.next_symbol(g) else {
            continue;
        };
        if !g.symbol(next).is_nonterminal() {
            continue;
        }
        for rule in g.rules_of(next) {
            let added = Item::new(rule.id());
            if label.insert(added) {
                pending.push(added);
            }
        }
    }
    label
}

/// Move the cursor over `symbol` in every item that allows it; empty if none does.
pub fn goto(g: &Grammar, label: &Label, symbol: SymbolID) -> Label {
    let kernel: Vec<Item> = label
        .iter()
        .filter(|item| item.next_symbol(g) == Some(symbol))
        .map(|item| item.advance())
        .collect();
    if kernel.is_empty() {
        return Label::new();
    }
    closure(g, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{build_rules, Symbol, SymbolSet};

    fn arithmetic() -> Grammar {
        let symbols = SymbolSet::new([
            Symbol::terminal("PLUS"),
            Symbol::terminal("STAR"),
            Symbol::terminal("LPAREN"),
            Symbol::terminal("RPAREN"),
            Symbol::terminal("ID"),
            Symbol::nonterminal("E"),
            Symbol::nonterminal("T"),
            Symbol::nonterminal("F"),
            Symbol::end_of_input("EOI"),
        ])
        .unwrap();
        let rules = build_rules(
            &symbols,
            [
                ("E_ADD", ("E", vec!["E", "PLUS", "T"])),
                ("E_T", ("E", vec!["T"])),
                ("T_MUL", ("T", vec!["T", "STAR", "F"])),
                ("T_F", ("T", vec!["F"])),
                ("F_PAREN", ("F", vec!["LPAREN", "E", "RPAREN"])),
                ("F_ID", ("F", vec!["ID"])),
            ],
        )
        .unwrap();
        Grammar::new(symbols, "E", rules).unwrap()
    }

    fn id(g: &Grammar, name: &str) -> SymbolID {
        g.symbols().lookup(name).unwrap()
    }

    fn rule(g: &Grammar, name: &str) -> RuleID {
        g.rule_by_name(name).unwrap().id()
    }

    #[test]
    fn closure_of_start_item() {
        let g = arithmetic();
        let label = closure(&g, [Item::new(RuleID::ACCEPT)]);
        let expected: Label = [
            Item::new(RuleID::ACCEPT),
            Item::new(rule(&g, "E_ADD")),
            Item::new(rule(&g, "E_T")),
            Item::new(rule(&g, "T_MUL")),
            Item::new(rule(&g, "T_F")),
            Item::new(rule(&g, "F_PAREN")),
            Item::new(rule(&g, "F_ID")),
        ]
        .into_iter()
        .collect();
        assert_eq!(label, expected);
    }

    #[test]
    fn goto_advances_cursor() {
        let g = arithmetic();
        let start = closure(&g, [Item::new(RuleID::ACCEPT)]);
        let after_e = goto(&g, &start, id(&g, "E"));
        let expected: Label = [
            Item::new(RuleID::ACCEPT).advance(),
            Item::new(rule(&g, "E_ADD")).advance(),
        ]
        .into_iter()
        .collect();
        assert_eq!(after_e, expected);
        assert_eq!(
            after_e
                .iter()
                .filter_map(|item| item.next_symbol(&g))
                .collect::<Vec<_>>(),
            vec![g.end_of_input(), id(&g, "PLUS")]
        );
        assert!(goto(&g, &start, id(&g, "RPAREN")).is_empty());
    }

    #[test]
    fn states_are_deduplicated() {
        let g = arithmetic();
        let graph = StateGraph::build(&g).unwrap();
        assert_eq!(graph.len(), 12);

        // `(` leads back into the same state from every state that can shift it.
        let paren = graph.transition(StateID::START, id(&g, "LPAREN")).unwrap();
        assert_eq!(graph.transition(paren, id(&g, "LPAREN")), Some(paren));
        let ident = graph.transition(StateID::START, id(&g, "ID")).unwrap();
        assert_eq!(graph.transition(paren, id(&g, "ID")), Some(ident));

        for (_, state) in graph.states() {
            assert!(!state.transitions.contains_key(&g.end_of_input()));
        }
    }

    #[test]
    fn display_marks_cursor() {
        let g = arithmetic();
        let item = Item::new(rule(&g, "E_ADD")).advance();
        assert_eq!(item.display(&g).to_string(), "E -> [ E . PLUS T ]");
        let complete = item.advance().advance();
        assert!(complete.is_complete(&g));
        assert_eq!(complete.display(&g).to_string(), "E -> [ E PLUS T . ]");
    }
}
