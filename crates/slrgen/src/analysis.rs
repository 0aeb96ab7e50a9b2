//! Calculation of nullable, first and follow sets.

use crate::{
    grammar::{Grammar, SymbolID},
    types::Map,
};
use bit_set::BitSet;

/// The per-symbol results of the analysis.
///
/// The sets are indexed by [`SymbolID::index`].
#[derive(Debug, Clone, Default)]
pub struct SymbolData {
    pub nullable: bool,
    pub first: BitSet,
    pub follow: BitSet,
}

#[derive(Debug)]
pub struct SymbolAnalysis<'g> {
    grammar: &'g Grammar,
    data: Map<SymbolID, SymbolData>,
}

impl<'g> SymbolAnalysis<'g> {
    /// Create the seeded, not yet iterated analysis.
    pub fn new(grammar: &'g Grammar) -> Self {
        let mut data: Map<SymbolID, SymbolData> = Map::default();
        for (id, symbol) in grammar.symbols().iter() {
            let mut entry = SymbolData::default();
            // First(t) = {t}, the end marker included.
            if symbol.is_terminal() {
                entry.first.insert(id.index());
            }
            data.insert(id, entry);
        }

        // Without this, the end marker never reaches any follow set and no state accepts.
        data[&grammar.start_symbol()]
            .follow
            .insert(grammar.end_of_input().index());

        Self { grammar, data }
    }

    /// Run all three fixpoints to convergence.
    pub fn compute(grammar: &'g Grammar) -> Self {
        let mut analysis = Self::new(grammar);
        let nullable = iterate(|| analysis.update_nullable());
        let first = iterate(|| analysis.update_first());
        let follow = iterate(|| analysis.update_follow());
        tracing::debug!(nullable, first, follow, "analysis converged after passes");
        analysis
    }

    /// Run one pass of the nullable fixpoint, returning whether anything changed.
    pub fn update_nullable(&mut self) -> bool {
        let grammar = self.grammar;
        let mut changed = false;
        for rule in grammar.rules() {
            if self.data[&rule.head()].nullable {
                continue;
            }
            if self.is_nullable_seq(rule.children()) {
                self.data[&rule.head()].nullable = true;
                changed = true;
            }
        }
        changed
    }

    /// Run one pass of the first-set fixpoint, returning whether anything changed.
    pub fn update_first(&mut self) -> bool {
        let grammar = self.grammar;
        let mut changed = false;
        for rule in grammar.rules() {
            let first = self.first_of(rule.children());
            changed |= union_into(&mut self.data[&rule.head()].first, &first);
        }
        changed
    }

    /// Run one pass of the follow-set fixpoint, returning whether anything changed.
    pub fn update_follow(&mut self) -> bool {
        let grammar = self.grammar;
        let mut changed = false;
        for rule in grammar.rules() {
            let children = rule.children();
            for (i, &child) in children.iter().enumerate() {
                let suffix = &children[i + 1..];
                let mut follow = self.first_of(suffix);
                if self.is_nullable_seq(suffix) {
                    follow.union_with(&self.data[&rule.head()].follow);
                }
                changed |= union_into(&mut self.data[&child].follow, &follow);
            }
        }
        changed
    }

    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        self.data[&symbol].nullable
    }

    pub fn first(&self, symbol: SymbolID) -> &BitSet {
        &self.data[&symbol].first
    }

    pub fn follow(&self, symbol: SymbolID) -> &BitSet {
        &self.data[&symbol].follow
    }

    pub fn data(&self, symbol: SymbolID) -> &SymbolData {
        &self.data[&symbol]
    }

    /// `First(X1 X2 ... Xn)`, up to and including the first non-nullable symbol.
    pub fn first_of(&self, symbols: &[SymbolID]) -> BitSet {
        let mut first = BitSet::new();
        for symbol in symbols {
            let data = &self.data[symbol];
            first.union_with(&data.first);
            if !data.nullable {
                break;
            }
        }
        first
    }

    /// Return whether every symbol of the sequence is nullable; an empty sequence is.
    pub fn is_nullable_seq(&self, symbols: &[SymbolID]) -> bool {
        symbols.iter().all(|symbol| self.data[symbol].nullable)
    }
}

fn iterate(mut pass: impl FnMut() -> bool) -> usize {
    let mut passes = 1;
    while pass() {
        passes += 1;
    }
    passes
}

fn union_into(target: &mut BitSet, other: &BitSet) -> bool {
    let before = target.len();
    target.union_with(other);
    target.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{build_rules, Symbol, SymbolSet};

    fn grammar(symbols: Vec<Symbol>, start: &str, rules: &[(&str, (&str, &[&str]))]) -> Grammar {
        let symbols = SymbolSet::new(symbols).unwrap();
        let rules = build_rules(
            &symbols,
            rules
                .iter()
                .map(|&(name, (head, children))| (name, (head, children.iter().copied()))),
        )
        .unwrap();
        Grammar::new(symbols, start, rules).unwrap()
    }

    /// `S -> A B c`, `A -> a | <empty>`, `B -> A A | b`
    fn nullable_grammar() -> Grammar {
        grammar(
            vec![
                Symbol::terminal("a"),
                Symbol::terminal("b"),
                Symbol::terminal("c"),
                Symbol::nonterminal("S"),
                Symbol::nonterminal("A"),
                Symbol::nonterminal("B"),
                Symbol::end_of_input("EOI"),
            ],
            "S",
            &[
                ("S_ABC", ("S", &["A", "B", "c"])),
                ("A_A", ("A", &["a"])),
                ("A_EMPTY", ("A", &[])),
                ("B_AA", ("B", &["A", "A"])),
                ("B_B", ("B", &["b"])),
            ],
        )
    }

    fn ids(g: &Grammar, names: &[&str]) -> BitSet {
        names
            .iter()
            .map(|name| g.symbols().lookup(name).unwrap().index())
            .collect()
    }

    fn id(g: &Grammar, name: &str) -> SymbolID {
        g.symbols().lookup(name).unwrap()
    }

    #[test]
    fn nullable_direct_and_transitive() {
        let g = nullable_grammar();
        let analysis = SymbolAnalysis::compute(&g);
        assert!(analysis.is_nullable(id(&g, "A")));
        assert!(analysis.is_nullable(id(&g, "B")));
        assert!(!analysis.is_nullable(id(&g, "S")));
        assert!(!analysis.is_nullable(id(&g, "a")));
    }

    #[test]
    fn first_of_terminal_is_itself() {
        let g = nullable_grammar();
        let analysis = SymbolAnalysis::compute(&g);
        for (symbol_id, symbol) in g.symbols().iter() {
            if symbol.is_terminal() {
                assert_eq!(*analysis.first(symbol_id), ids(&g, &[symbol.name()]));
            }
        }
    }

    #[test]
    fn first_through_nullable_prefix() {
        let g = nullable_grammar();
        let analysis = SymbolAnalysis::compute(&g);
        assert_eq!(*analysis.first(id(&g, "A")), ids(&g, &["a"]));
        assert_eq!(*analysis.first(id(&g, "B")), ids(&g, &["a", "b"]));
        assert_eq!(*analysis.first(id(&g, "S")), ids(&g, &["a", "b", "c"]));
    }

    #[test]
    fn follow_sets() {
        let g = nullable_grammar();
        let analysis = SymbolAnalysis::compute(&g);
        assert_eq!(*analysis.follow(id(&g, "S")), ids(&g, &["EOI"]));
        assert_eq!(*analysis.follow(id(&g, "A")), ids(&g, &["a", "b", "c"]));
        assert_eq!(*analysis.follow(id(&g, "B")), ids(&g, &["c"]));
    }

    #[test]
    fn end_of_input_follows_start_after_seeding() {
        let g = nullable_grammar();
        let analysis = SymbolAnalysis::new(&g);
        assert!(analysis
            .follow(g.start_symbol())
            .contains(g.end_of_input().index()));
    }

    #[test]
    fn fixpoints_are_idempotent() {
        let g = nullable_grammar();
        let mut analysis = SymbolAnalysis::compute(&g);
        let snapshot: Vec<_> = g
            .symbols()
            .iter()
            .map(|(id, _)| analysis.data(id).clone())
            .collect();
        assert!(!analysis.update_nullable());
        assert!(!analysis.update_first());
        assert!(!analysis.update_follow());
        for (i, (id, _)) in g.symbols().iter().enumerate() {
            let data = analysis.data(id);
            assert_eq!(data.nullable, snapshot[i].nullable);
            assert_eq!(data.first, snapshot[i].first);
            assert_eq!(data.follow, snapshot[i].follow);
        }
    }

    #[test]
    fn arithmetic_sets() {
        // E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id
        let g = grammar(
            vec![
                Symbol::terminal("PLUS"),
                Symbol::terminal("STAR"),
                Symbol::terminal("LPAREN"),
                Symbol::terminal("RPAREN"),
                Symbol::terminal("ID"),
                Symbol::nonterminal("E"),
                Symbol::nonterminal("T"),
                Symbol::nonterminal("F"),
                Symbol::end_of_input("EOI"),
            ],
            "E",
            &[
                ("E_ADD", ("E", &["E", "PLUS", "T"])),
                ("E_T", ("E", &["T"])),
                ("T_MUL", ("T", &["T", "STAR", "F"])),
                ("T_F", ("T", &["F"])),
                ("F_PAREN", ("F", &["LPAREN", "E", "RPAREN"])),
                ("F_ID", ("F", &["ID"])),
            ],
        );
        let analysis = SymbolAnalysis::compute(&g);
        for name in ["E", "T", "F"] {
            assert_eq!(*analysis.first(id(&g, name)), ids(&g, &["LPAREN", "ID"]));
        }
        assert_eq!(
            *analysis.follow(id(&g, "E")),
            ids(&g, &["PLUS", "RPAREN", "EOI"])
        );
        assert_eq!(
            *analysis.follow(id(&g, "T")),
            ids(&g, &["PLUS", "STAR", "RPAREN", "EOI"])
        );
        assert_eq!(*analysis.follow(id(&g, "F")), *analysis.follow(id(&g, "T")));
    }
}
