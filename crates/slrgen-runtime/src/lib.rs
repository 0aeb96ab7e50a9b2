//! Runtime implementation for the `slrgen` parser generator.
//!
//! The engine knows nothing about how a table was built. It only needs
//! something implementing [`ParseTable`](definition::ParseTable).

pub mod definition;
pub mod parser;
pub mod stream;
pub mod tree;

pub use crate::{
    definition::{ParseAction, ParseTable, StateID},
    parser::{parse, try_parse, ParseError},
    tree::{Node, Token},
};
