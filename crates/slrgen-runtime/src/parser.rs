//! The shift/reduce parse engine.

use crate::{
    definition::{ParseAction, ParseTable, StateID},
    stream::PushBack,
    tree::{Node, Token},
};
use std::{convert::Infallible, fmt, iter};

type TableNode<'t, TDef> =
    Node<'t, <TDef as ParseTable>::Symbol, <TDef as ParseTable>::Rule>;

/// The items flowing through the input stream of the engine.
enum Input<'t, S, R> {
    Node(Node<'t, S, R>),
    End,
}

/// Run the parse table over a sequence of tokens and build the parse tree.
///
/// The end-of-input marker is appended implicitly.
pub fn parse<'t, TDef, I>(
    table: TDef,
    tokens: I,
) -> Result<TableNode<'t, TDef>, ParseError<TDef::Symbol>>
where
    TDef: ParseTable,
    I: IntoIterator,
    I::Item: Into<Token<'t, TDef::Symbol>>,
{
    try_parse(
        table,
        tokens
            .into_iter()
            .map(|token| Ok::<_, Infallible>(token.into())),
    )
}

/// Same as [`parse`], but reads from a fallible token source such as a lexer.
pub fn try_parse<'t, TDef, I, E>(
    table: TDef,
    tokens: I,
) -> Result<TableNode<'t, TDef>, ParseError<TDef::Symbol, E>>
where
    TDef: ParseTable,
    I: IntoIterator<Item = Result<Token<'t, TDef::Symbol>, E>>,
    E: fmt::Display,
{
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let end = table.end_of_input();
    let mut stream = PushBack::new(
        tokens
            .into_iter()
            .map(|token| token.map(|token| Input::Node(token.into())))
            .chain(iter::once(Ok(Input::End))),
    );
    let mut stack: Vec<(StateID, TableNode<'t, TDef>)> = vec![];
    let mut current = table.initial_state();

    loop {
        let peeked = stream.peek().map(|item| match item {
            Ok(Input::Node(node)) if node.is_leaf() => Ok(Lookahead::Token(node.symbol())),
            Ok(Input::Node(node)) => Ok(Lookahead::Reduced(node.symbol())),
            Ok(Input::End) => Ok(Lookahead::End),
            Err(..) => Err(()),
        });
        let at_end = matches!(peeked, Some(Ok(Lookahead::End)));
        let lookahead = match peeked {
            // The end marker and nonterminals are never valid in the token input.
            Some(Ok(Lookahead::Token(symbol))) if symbol == end || !table.is_token(symbol) => {
                tracing::trace!("invalid token: state = {:?}, symbol = {:?}", current, symbol);
                return Err(unexpected(&mut stream, current, symbol));
            }
            Some(Ok(Lookahead::Token(symbol) | Lookahead::Reduced(symbol))) => symbol,
            Some(Ok(Lookahead::End)) => end,
            Some(Err(())) => match stream.next() {
                Some(Err(err)) => return Err(ParseError::Lexer(err)),
                _ => return Err(ParseError::InputExhausted { state: current }),
            },
            None => return Err(ParseError::InputExhausted { state: current }),
        };

        let Some(action) = table.action(current, lookahead) else {
            tracing::trace!("no action: state = {:?}, lookahead = {:?}", current, lookahead);
            return Err(unexpected(&mut stream, current, lookahead));
        };

        match action {
            ParseAction::Shift(next) => match stream.next() {
                Some(Ok(Input::Node(node))) => {
                    tracing::trace!("shift: {:?} -> {:?} on {:?}", current, next, lookahead);
                    stack.push((current, node));
                    current = next;
                }
                Some(Err(err)) => return Err(ParseError::Lexer(err)),
                // The end marker can only be consumed by a table that shifts over it.
                Some(Ok(Input::End)) | None => {
                    return Err(ParseError::InputExhausted { state: current })
                }
            },

            ParseAction::Reduce(rule) => {
                let (resume, node) = reduce(&table, &mut stack, current, rule)
                    .map_err(|reason| ParseError::Internal {
                        state: current,
                        reason,
                    })?;
                tracing::trace!("reduce: {:?} -> {:?} by {:?}", current, resume, rule);
                current = resume;
                stream.push_back(Ok(Input::Node(node)));
            }

            ParseAction::Accept => {
                tracing::trace!("accept: state = {:?}", current);
                return accept(&table, &mut stack, at_end).map_err(|reason| {
                    ParseError::Internal {
                        state: current,
                        reason,
                    }
                });
            }
        }
    }
}

/// What the next item of the input stream is.
#[derive(Copy, Clone)]
enum Lookahead<S> {
    Token(S),
    Reduced(S),
    End,
}

/// Consume the offending item and build the syntax error for it.
fn unexpected<'t, S, R, E, I>(
    stream: &mut PushBack<I>,
    state: StateID,
    symbol: S,
) -> ParseError<S, E>
where
    I: Iterator<Item = Result<Input<'t, S, R>, E>>,
    S: fmt::Debug,
    E: fmt::Display,
{
    let text = match stream.next() {
        Some(Ok(Input::Node(node))) => Some(node.flatten_text()),
        _ => None,
    };
    ParseError::Syntax {
        state,
        symbol,
        text,
    }
}

/// Pop the children of `rule` off the stack and build the reduced node.
///
/// Returns the state to resume from together with the new node.
fn reduce<'t, TDef>(
    table: &TDef,
    stack: &mut Vec<(StateID, TableNode<'t, TDef>)>,
    current: StateID,
    rule: TDef::Rule,
) -> Result<(StateID, TableNode<'t, TDef>), String>
where
    TDef: ParseTable,
{
    let expected = table.rule_children(rule);
    let mut children = Vec::with_capacity(expected.len());
    let mut resume = current;
    for &symbol in expected.iter().rev() {
        let (state, node) = stack
            .pop()
            .ok_or_else(|| format!("stack underflow while reducing {:?}", rule))?;
        if node.symbol() != symbol {
            return Err(format!(
                "expected {:?} on the stack while reducing {:?}, found {:?}",
                symbol,
                rule,
                node.symbol()
            ));
        }
        resume = state;
        children.push(node);
    }
    children.reverse();

    let node = Node::Internal {
        symbol: table.rule_head(rule),
        children,
        rule,
    };
    Ok((resume, node))
}

/// Check the postconditions of an accepted parse and take the root off the stack.
fn accept<'t, TDef>(
    table: &TDef,
    stack: &mut Vec<(StateID, TableNode<'t, TDef>)>,
    at_end: bool,
) -> Result<TableNode<'t, TDef>, String>
where
    TDef: ParseTable,
{
    if !at_end {
        return Err("accepted before the end of input".to_owned());
    }
    let (_, root) = stack.pop().ok_or("accepted with an empty stack")?;
    if !stack.is_empty() {
        return Err(format!("{} extra node(s) left on the stack", stack.len()));
    }
    if root.symbol() != table.start_symbol() {
        return Err(format!(
            "the root node is {:?}, not the start symbol",
            root.symbol()
        ));
    }
    Ok(root)
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<TSym: fmt::Debug, L: fmt::Display = Infallible> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    /// The table has no action for the lookahead symbol in the current state.
    #[error("syntax error: unexpected {symbol:?} in state {state:?}")]
    Syntax {
        state: StateID,
        symbol: TSym,
        text: Option<String>,
    },

    /// The table or the engine is broken; never caused by the input.
    #[error("internal parser error in state {state:?}: {reason}")]
    Internal { state: StateID, reason: String },

    #[error("input exhausted before accepting (state {state:?})")]
    InputExhausted { state: StateID },
}

impl<TSym: fmt::Debug, L: fmt::Display> ParseError<TSym, L> {
    /// The state the automaton was in when the error occurred.
    pub fn state(&self) -> Option<StateID> {
        match self {
            Self::Lexer(..) => None,
            Self::Syntax { state, .. }
            | Self::Internal { state, .. }
            | Self::InputExhausted { state } => Some(*state),
        }
    }
}
