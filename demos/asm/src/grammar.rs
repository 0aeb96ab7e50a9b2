//! The instruction grammar and its parser.

use crate::{
    instruction::{Instruction, LowerError},
    lexer::{self, LexError, Terminal},
    opcode::Format,
};
use slrgen::{
    grammar::{build_rules, Grammar, GrammarDefError, RuleID, Symbol, SymbolID, SymbolSet},
    ActionTable, CompileError, Node, ParseError, StateID, Token,
};

pub const START: &str = "START";
pub const INSTRUCTION: &str = "INSTRUCTION";
pub const END_OF_INPUT: &str = "EOF";

/// Instruction rule names, paired with the operand format they accept.
const SHAPES: [(&str, Format); 4] = [
    ("NO_OPERANDS", Format::Bare),
    ("REGISTER", Format::Register),
    ("REGISTER_IMMEDIATE", Format::RegisterImmediate),
    ("THREE_REGISTERS", Format::ThreeRegisters),
];

/// Define the grammar of a single instruction line.
pub fn grammar() -> Result<Grammar, GrammarDefError> {
    let symbols = SymbolSet::new(
        Terminal::ALL
            .iter()
            .map(|t| Symbol::terminal(t.name()))
            .chain([
                Symbol::nonterminal(START),
                Symbol::nonterminal(INSTRUCTION),
                Symbol::end_of_input(END_OF_INPUT),
            ]),
    )?;

    let (op, reg, int, comma) = ("Operation", "Register", "Integer", "Comma");
    let rules = build_rules(
        &symbols,
        [
            ("LINE", (START, vec![INSTRUCTION])),
            ("NO_OPERANDS", (INSTRUCTION, vec![op])),
            ("REGISTER", (INSTRUCTION, vec![op, reg])),
            ("REGISTER_IMMEDIATE", (INSTRUCTION, vec![op, reg, comma, int])),
            (
                "THREE_REGISTERS",
                (INSTRUCTION, vec![op, reg, comma, reg, comma, reg]),
            ),
        ],
    )?;

    Grammar::new(symbols, START, rules)
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid grammar")]
    Grammar(
        #[from]
        #[source]
        GrammarDefError,
    ),

    #[error("failed to compile the action table")]
    Compile(
        #[from]
        #[source]
        CompileError,
    ),

    #[error("missing symbol `{}'", _0)]
    MissingSymbol(&'static str),

    #[error("missing rule `{}'", _0)]
    MissingRule(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected {found} (expected one of: {expected})")]
    Syntax {
        state: StateID,
        found: String,
        expected: String,
    },

    #[error("parser failure: {}", _0)]
    Parser(String),

    #[error(transparent)]
    Lower(#[from] LowerError),
}

/// A compiled instruction parser.
#[derive(Debug)]
pub struct AsmParser {
    table: ActionTable,
    terminals: [SymbolID; 5],
    shapes: Vec<(RuleID, Format)>,
}

impl AsmParser {
    pub fn new() -> Result<Self, BuildError> {
        let grammar = grammar()?;
        let table = slrgen::compile(&grammar)?;

        let mut terminals = [table.grammar().end_of_input(); 5];
        for (slot, terminal) in terminals.iter_mut().zip(Terminal::ALL) {
            *slot = table
                .grammar()
                .symbols()
                .lookup(terminal.name())
                .ok_or(BuildError::MissingSymbol(terminal.name()))?;
        }

        let shapes: Vec<(RuleID, Format)> = SHAPES
            .iter()
            .map(|&(name, shape)| {
                let rule = table.grammar().rule_by_name(name);
                rule.map(|rule| (rule.id(), shape))
                    .ok_or(BuildError::MissingRule(name))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            table,
            terminals,
            shapes,
        })
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn grammar(&self) -> &Grammar {
        self.table.grammar()
    }

    pub fn symbol(&self, terminal: Terminal) -> SymbolID {
        self.terminals[terminal as usize]
    }

    /// The operand format accepted by an instruction rule.
    pub fn shape(&self, rule: RuleID) -> Option<Format> {
        self.shapes
            .iter()
            .find(|(id, _)| *id == rule)
            .map(|(_, shape)| *shape)
    }

    /// Tokenize and parse a single line.
    pub fn parse_line<'s>(&self, line: &'s str) -> Result<Node<'s>, LineError> {
        let tokens = lexer::lex(line)
            .map(|lexeme| lexeme.map(|l| Token::new(self.symbol(l.terminal), l.text)));
        self.table.try_parse(tokens).map_err(|err| match err {
            ParseError::Lexer(err) => LineError::Lex(err),
            ParseError::Syntax {
                state,
                symbol,
                text,
            } => {
                let name = self.grammar().symbol(symbol).name();
                LineError::Syntax {
                    state,
                    found: match text {
                        Some(text) => format!("{} `{}'", name, text),
                        None => "end of line".to_owned(),
                    },
                    expected: self.expected(state).join(", "),
                }
            }
            err => LineError::Parser(self.table.display_error(&err).to_string()),
        })
    }

    /// Parse a line and turn its tree into an instruction.
    pub fn assemble_line(&self, line: &str) -> Result<Instruction, LineError> {
        let tree = self.parse_line(line)?;
        Ok(Instruction::lower(self, &tree)?)
    }

    fn expected(&self, state: StateID) -> Vec<&str> {
        let g = self.grammar();
        self.table
            .actions(state)
            .into_iter()
            .flat_map(|actions| actions.keys())
            .map(|symbol| match g.symbol(*symbol) {
                Symbol::EndOfInput(..) => "end of line",
                symbol => symbol.name(),
            })
            .collect()
    }
}
