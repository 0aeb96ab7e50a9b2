//! Tokenizer of instruction lines.

use crate::opcode;
use logos::Logos;
use std::ops::Range;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Logos)]
#[logos(skip r"([ \t\r\n\f]+|;[^\n]*)")]
enum RawToken {
    // r0 .. r31; longer words such as `r32` or `r1x` are identifiers.
    #[regex(r"r([12][0-9]|3[01]|[0-9])", priority = 10)]
    Register,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[_a-zA-Z][_a-zA-Z0-9]*")]
    Word,

    #[token(",")]
    Comma,
}

/// The terminal symbols of the instruction grammar.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Terminal {
    Operation,
    Register,
    Integer,
    Identifier,
    Comma,
}

impl Terminal {
    pub const ALL: [Self; 5] = [
        Self::Operation,
        Self::Register,
        Self::Integer,
        Self::Identifier,
        Self::Comma,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Operation => "Operation",
            Self::Register => "Register",
            Self::Integer => "Integer",
            Self::Identifier => "Identifier",
            Self::Comma => "Comma",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'s> {
    pub terminal: Terminal,
    pub text: &'s str,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized input `{text}' at column {column}")]
pub struct LexError {
    pub text: String,
    /// 1-based.
    pub column: usize,
}

/// Split a line into lexemes. Words naming a known operation become operations.
pub fn lex(input: &str) -> impl Iterator<Item = Result<Lexeme<'_>, LexError>> + '_ {
    RawToken::lexer(input)
        .spanned()
        .map(move |(token, span)| {
            let text = &input[span.clone()];
            let terminal = match token {
                Ok(RawToken::Register) => Terminal::Register,
                Ok(RawToken::Integer) => Terminal::Integer,
                Ok(RawToken::Word) if opcode::is_operation(text) => Terminal::Operation,
                Ok(RawToken::Word) => Terminal::Identifier,
                Ok(RawToken::Comma) => Terminal::Comma,
                Err(..) => {
                    return Err(LexError {
                        text: text.to_owned(),
                        column: span.start + 1,
                    })
                }
            };
            Ok(Lexeme {
                terminal,
                text,
                span,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminals(input: &str) -> Vec<(Terminal, &str)> {
        lex(input)
            .map(|lexeme| lexeme.map(|l| (l.terminal, l.text)))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn instruction_line() {
        assert_eq!(
            terminals("ADD r1, 4"),
            [
                (Terminal::Operation, "ADD"),
                (Terminal::Register, "r1"),
                (Terminal::Comma, ","),
                (Terminal::Integer, "4"),
            ]
        );
    }

    #[test]
    fn registers_and_identifiers() {
        assert_eq!(
            terminals("r0 r31 r32 r1x loop"),
            [
                (Terminal::Register, "r0"),
                (Terminal::Register, "r31"),
                (Terminal::Identifier, "r32"),
                (Terminal::Identifier, "r1x"),
                (Terminal::Identifier, "loop"),
            ]
        );
    }

    #[test]
    fn operations_ignore_case_and_comments_are_skipped() {
        assert_eq!(
            terminals("  jiz r2,16 ; jump ahead"),
            [
                (Terminal::Operation, "jiz"),
                (Terminal::Register, "r2"),
                (Terminal::Comma, ","),
                (Terminal::Integer, "16"),
            ]
        );
        assert!(terminals("; only a comment").is_empty());
    }

    #[test]
    fn unknown_character() {
        let err = lex("ADD #1").find_map(Result::err).unwrap();
        assert_eq!(
            err,
            LexError {
                text: "#".into(),
                column: 5,
            }
        );
    }
}
