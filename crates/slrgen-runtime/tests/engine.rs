use slrgen_runtime::{parse, try_parse, Node, ParseAction, ParseError, ParseTable, StateID, Token};
use std::{collections::HashMap, sync::Arc, thread};

const END: char = '$';

/// A hand-written table for `S -> a b`.
///
/// ```text
/// S#000: a => shift(S#001), S => shift(S#003)
/// S#001: b => shift(S#002)
/// S#002: $ => reduce(0)
/// S#003: $ => accept
/// ```
struct MockTable {
    actions: HashMap<(u16, char), ParseAction<u8>>,
    rules: Vec<(char, Vec<char>)>,
}

impl MockTable {
    fn new() -> Self {
        let mut actions = HashMap::new();
        actions.insert((0, 'a'), ParseAction::Shift(StateID::from_raw(1)));
        actions.insert((0, 'S'), ParseAction::Shift(StateID::from_raw(3)));
        actions.insert((1, 'b'), ParseAction::Shift(StateID::from_raw(2)));
        actions.insert((2, END), ParseAction::Reduce(0));
        actions.insert((3, END), ParseAction::Accept);
        Self {
            actions,
            rules: vec![('S', vec!['a', 'b'])],
        }
    }

    fn with(mut self, state: u16, symbol: char, action: ParseAction<u8>) -> Self {
        self.actions.insert((state, symbol), action);
        self
    }
}

impl ParseTable for MockTable {
    type Symbol = char;
    type Rule = u8;

    fn initial_state(&self) -> StateID {
        StateID::START
    }

    fn end_of_input(&self) -> char {
        END
    }

    fn start_symbol(&self) -> char {
        'S'
    }

    fn is_token(&self, symbol: char) -> bool {
        symbol.is_ascii_lowercase()
    }

    fn action(&self, current: StateID, lookahead: char) -> Option<ParseAction<u8>> {
        self.actions.get(&(current.into_raw(), lookahead)).copied()
    }

    fn rule_head(&self, rule: u8) -> char {
        self.rules[rule as usize].0
    }

    fn rule_children(&self, rule: u8) -> &[char] {
        &self.rules[rule as usize].1
    }
}

#[test]
fn accepts_valid_input() {
    let table = MockTable::new();
    let root = parse(&table, [('a', "x"), ('b', "y")]).unwrap();
    assert_eq!(root.symbol(), 'S');
    assert_eq!(root.rule(), Some(0));
    assert_eq!(
        root.children(),
        &[
            Node::Leaf {
                symbol: 'a',
                text: "x".into()
            },
            Node::Leaf {
                symbol: 'b',
                text: "y".into()
            },
        ]
    );
    assert_eq!(root.flatten_text(), "xy");
}

#[test]
fn syntax_error_carries_state_and_token() {
    let table = MockTable::new();
    match parse(&table, [('b', "y")]) {
        Err(ParseError::Syntax {
            state,
            symbol,
            text,
        }) => {
            assert_eq!(state, StateID::START);
            assert_eq!(symbol, 'b');
            assert_eq!(text.as_deref(), Some("y"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn syntax_error_at_end_of_input() {
    let table = MockTable::new();
    match parse(&table, [('a', "x")]) {
        Err(ParseError::Syntax {
            state,
            symbol,
            text,
        }) => {
            assert_eq!(state, StateID::from_raw(1));
            assert_eq!(symbol, END);
            assert_eq!(text, None);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn table_is_reusable_after_error() {
    let table = MockTable::new();
    assert!(parse(&table, [('b', "y")]).is_err());
    assert!(parse(&table, [('a', "x"), ('b', "y")]).is_ok());
}

#[test]
fn shifting_the_end_marker_exhausts_input() {
    let table = MockTable::new().with(3, END, ParseAction::Shift(StateID::from_raw(4)));
    match parse(&table, [('a', "x"), ('b', "y")]) {
        Err(ParseError::InputExhausted { state }) => assert_eq!(state, StateID::from_raw(3)),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn reduce_mismatch_is_internal_error() {
    let mut table = MockTable::new().with(2, END, ParseAction::Reduce(1));
    table.rules.push(('S', vec!['a', 'c']));
    let err = parse(&table, [('a', "x"), ('b', "y")]).unwrap_err();
    assert!(matches!(err, ParseError::Internal { .. }), "{:?}", err);
    assert_eq!(err.state(), Some(StateID::from_raw(2)));
}

#[test]
fn extra_nodes_at_accept_is_internal_error() {
    let table = MockTable::new().with(2, END, ParseAction::Accept);
    let err = parse(&table, [('a', "x"), ('b', "y")]).unwrap_err();
    assert!(matches!(err, ParseError::Internal { .. }), "{:?}", err);
}

#[test]
fn lexer_errors_are_forwarded() {
    let table = MockTable::new();
    let tokens: Vec<Result<Token<'_, char>, String>> =
        vec![Ok(Token::new('a', "x")), Err("bad character `@'".into())];
    match try_parse(&table, tokens) {
        Err(ParseError::Lexer(msg)) => assert_eq!(msg, "bad character `@'"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn shared_table_across_threads() {
    let table = Arc::new(MockTable::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let text = i.to_string();
                parse(table, [('a', text.clone()), ('b', text)])
                    .map(Node::into_owned)
                    .map(|root| root.flatten_text())
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let flattened = handle.join().unwrap().unwrap();
        assert_eq!(flattened, format!("{}{}", i, i));
    }
}

#[test]
fn end_marker_in_the_input_is_syntax_error() {
    let table = MockTable::new();
    match parse(&table, [('a', "x"), (END, "y"), ('b', "z")]) {
        Err(ParseError::Syntax {
            state,
            symbol,
            text,
        }) => {
            assert_eq!(state, StateID::from_raw(1));
            assert_eq!(symbol, END);
            assert_eq!(text.as_deref(), Some("y"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn nonterminal_in_the_input_is_syntax_error() {
    let table = MockTable::new();
    match parse(&table, [('S', "junk")]) {
        Err(ParseError::Syntax {
            state,
            symbol,
            text,
        }) => {
            assert_eq!(state, StateID::START);
            assert_eq!(symbol, 'S');
            assert_eq!(text.as_deref(), Some("junk"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn accept_before_end_of_input_is_internal_error() {
    let table = MockTable::new().with(1, 'b', ParseAction::Accept);
    let err = parse(&table, [('a', "x"), ('b', "y")]).unwrap_err();
    assert!(matches!(err, ParseError::Internal { .. }));
    assert_eq!(err.state(), Some(StateID::from_raw(1)));
}
