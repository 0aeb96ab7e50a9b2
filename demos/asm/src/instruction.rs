//! Lowering of parse trees into instructions.

use crate::{
    grammar::AsmParser,
    opcode::{self, Format, Opcode},
};
use slrgen::Node;
use std::fmt;

const IMMEDIATE_BITS: u32 = 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Immediate(u32),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "r{}", r),
            Self::Immediate(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The canonical, upper case name of the operation.
    pub operation: &'static str,
    pub opcode: Opcode,
    /// The operand format written in the source, which may differ from `opcode.format`.
    pub shape: Format,
    pub operands: Vec<Operand>,
}

#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    #[error("unknown operation `{}'", _0)]
    UnknownOperation(String),

    #[error("immediate value `{text}' does not fit in {bits} bits")]
    ImmediateOutOfRange { text: String, bits: u32 },

    #[error("invalid register `{}'", _0)]
    InvalidRegister(String),

    #[error("malformed instruction tree: {}", _0)]
    MalformedTree(&'static str),
}

impl Instruction {
    /// Build an instruction from a tree accepted by the parser, dispatching on the rule that fired.
    ///
    /// An operand shape that disagrees with the format of the operation is only warned about.
    pub fn lower(parser: &AsmParser, tree: &Node<'_>) -> Result<Self, LowerError> {
        let [instruction] = tree.children() else {
            return Err(LowerError::MalformedTree("expected a single instruction"));
        };
        let shape = instruction
            .rule()
            .and_then(|rule| parser.shape(rule))
            .ok_or(LowerError::MalformedTree("not an instruction rule"))?;

        let texts: Vec<&str> = instruction.children().iter().filter_map(Node::text).collect();
        let (name, operands) = match (shape, &texts[..]) {
            (Format::Bare, [name]) => (name, vec![]),
            (Format::Register, [name, a]) => (name, vec![register(a)?]),
            (Format::RegisterImmediate, [name, a, _, i]) => (name, vec![register(a)?, immediate(i)?]),
            (Format::ThreeRegisters, [name, a, _, b, _, c]) => {
                (name, vec![register(a)?, register(b)?, register(c)?])
            }
            _ => return Err(LowerError::MalformedTree("unexpected operands")),
        };

        let (operation, opcode) =
            opcode::lookup(name).ok_or_else(|| LowerError::UnknownOperation(name.to_string()))?;

        let lowered = Self {
            operation,
            opcode: *opcode,
            shape,
            operands,
        };
        if !lowered.matches_format() {
            tracing::warn!(
                operation,
                expected = %opcode.format,
                found = %shape,
                "operands do not match the format of the operation"
            );
        }
        Ok(lowered)
    }

    pub fn matches_format(&self) -> bool {
        self.shape == self.opcode.format
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation)?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{}", operand)?;
        }
        if let Some(code) = self.opcode.code {
            write!(f, "  ; op={}", code)?;
        }
        Ok(())
    }
}

fn register(text: &str) -> Result<Operand, LowerError> {
    text.strip_prefix('r')
        .and_then(|n| n.parse().ok())
        .filter(|n| *n < 32)
        .map(Operand::Register)
        .ok_or_else(|| LowerError::InvalidRegister(text.to_owned()))
}

fn immediate(text: &str) -> Result<Operand, LowerError> {
    text.parse::<u32>()
        .ok()
        .filter(|n| *n < 1 << IMMEDIATE_BITS)
        .map(Operand::Immediate)
        .ok_or_else(|| LowerError::ImmediateOutOfRange {
            text: text.to_owned(),
            bits: IMMEDIATE_BITS,
        })
}
