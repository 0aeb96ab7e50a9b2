//! Parse table definition.

use std::{fmt, rc::Rc, sync::Arc};

/// The number to identify a state of the LR automaton.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u16,
}

impl StateID {
    /// The state built from the augmented start rule.
    pub const START: Self = Self::from_raw(0);

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.raw)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The trait for abstracting a compiled shift/reduce action table.
pub trait ParseTable {
    /// The type to identify the grammar symbols, shared by tokens and tree nodes.
    type Symbol: Copy + Eq + fmt::Debug;

    /// The type to identify the production rules.
    type Rule: Copy + Eq + fmt::Debug;

    /// Return the state the automaton starts from.
    fn initial_state(&self) -> StateID;

    /// Return the symbol appended to every input as the end marker.
    fn end_of_input(&self) -> Self::Symbol;

    /// Return the symbol that the root of every accepted tree must carry.
    fn start_symbol(&self) -> Self::Symbol;

    /// Return whether the symbol may be carried by a token of the input.
    ///
    /// Nonterminals and the end marker must return `false`.
    fn is_token(&self, symbol: Self::Symbol) -> bool;

    /// Return the action registered for the specified state and lookahead symbol.
    ///
    /// `None` means the lookahead is not acceptable in that state.
    fn action(&self, current: StateID, lookahead: Self::Symbol) -> Option<ParseAction<Self::Rule>>;

    /// Return the left-hand side of a production rule.
    fn rule_head(&self, rule: Self::Rule) -> Self::Symbol;

    /// Return the right-hand side of a production rule.
    fn rule_children(&self, rule: Self::Rule) -> &[Self::Symbol];
}

macro_rules! impl_parse_table_for_pointer {
    ($($ptr:ty),*) => {$(
        impl<T: ?Sized> ParseTable for $ptr
        where
            T: ParseTable,
        {
            type Symbol = T::Symbol;
            type Rule = T::Rule;

            fn initial_state(&self) -> StateID {
                (**self).initial_state()
            }

            fn end_of_input(&self) -> Self::Symbol {
                (**self).end_of_input()
            }

            fn start_symbol(&self) -> Self::Symbol {
                (**self).start_symbol()
            }

            fn is_token(&self, symbol: Self::Symbol) -> bool {
                (**self).is_token(symbol)
            }

            fn action(
                &self,
                current: StateID,
                lookahead: Self::Symbol,
            ) -> Option<ParseAction<Self::Rule>> {
                (**self).action(current, lookahead)
            }

            fn rule_head(&self, rule: Self::Rule) -> Self::Symbol {
                (**self).rule_head(rule)
            }

            fn rule_children(&self, rule: Self::Rule) -> &[Self::Symbol] {
                (**self).rule_children(rule)
            }
        }
    )*};
}

impl_parse_table_for_pointer!(&T, Rc<T>, Arc<T>);

/// The action that the automaton performs in a state on a particular lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParseAction<TRule> {
    /// Consume the lookahead and move to the specified state.
    Shift(StateID),

    /// Replace the children of the specified rule on top of the stack with a new node.
    Reduce(TRule),

    /// Finish parsing successfully.
    Accept,
}
