//! An SLR(1) parser generator.
//!
//! A [`Grammar`](grammar::Grammar) is compiled once into an immutable [`ActionTable`], which
//! can then drive any number of parses through the engine of `slrgen-runtime`.

pub mod analysis;
pub mod grammar;
pub mod lr0;
pub mod table;
pub mod types;
mod util;

pub use crate::table::{Action, ActionTable, CompileError};
pub use slrgen_runtime::{ParseAction, ParseTable, StateID};

use crate::grammar::{Grammar, RuleID, SymbolID};
use std::convert::Infallible;

/// A node of the trees built by an [`ActionTable`].
pub type Node<'t> = slrgen_runtime::Node<'t, SymbolID, RuleID>;

/// A terminal symbol paired with its literal text.
pub type Token<'t> = slrgen_runtime::Token<'t, SymbolID>;

pub type ParseError<L = Infallible> = slrgen_runtime::ParseError<SymbolID, L>;

/// Compile the grammar into its SLR(1) action table.
pub fn compile(g: &Grammar) -> Result<ActionTable, CompileError> {
    ActionTable::compile(g)
}
