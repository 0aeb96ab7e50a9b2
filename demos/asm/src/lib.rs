//! An assembly front end driven by an SLR(1) table.

pub mod grammar;
pub mod instruction;
pub mod lexer;
pub mod lines;
pub mod opcode;
