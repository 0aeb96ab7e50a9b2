//! Parse tree.

use std::borrow::Cow;

/// A terminal symbol paired with the literal text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'t, S> {
    pub symbol: S,
    pub text: Cow<'t, str>,
}

impl<'t, S> Token<'t, S> {
    pub fn new(symbol: S, text: impl Into<Cow<'t, str>>) -> Self {
        Self {
            symbol,
            text: text.into(),
        }
    }
}

impl<'t, S, T> From<(S, T)> for Token<'t, S>
where
    T: Into<Cow<'t, str>>,
{
    fn from((symbol, text): (S, T)) -> Self {
        Self::new(symbol, text)
    }
}

/// A node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'t, S, R> {
    /// A shifted token.
    Leaf { symbol: S, text: Cow<'t, str> },

    /// A reduced production, holding its children in source order.
    Internal {
        symbol: S,
        children: Vec<Node<'t, S, R>>,
        rule: R,
    },
}

impl<'t, S, R> Node<'t, S, R> {
    pub fn symbol(&self) -> S
    where
        S: Copy,
    {
        match self {
            Self::Leaf { symbol, .. } | Self::Internal { symbol, .. } => *symbol,
        }
    }

    /// The production that built this node, if any.
    pub fn rule(&self) -> Option<R>
    where
        R: Copy,
    {
        match self {
            Self::Leaf { .. } => None,
            Self::Internal { rule, .. } => Some(*rule),
        }
    }

    pub fn children(&self) -> &[Node<'t, S, R>] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Internal { children, .. } => children,
        }
    }

    /// The literal text of a leaf.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Leaf { text, .. } => Some(&**text),
            Self::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Iterate over the leaves of this subtree from left to right.
    pub fn leaves(&self) -> Leaves<'_, 't, S, R> {
        Leaves { stack: vec![self] }
    }

    /// Concatenate the texts of all leaves from left to right.
    pub fn flatten_text(&self) -> String {
        self.leaves().filter_map(Node::text).collect()
    }

    /// Detach the tree from the input it was parsed from.
    pub fn into_owned(self) -> Node<'static, S, R> {
        match self {
            Self::Leaf { symbol, text } => Node::Leaf {
                symbol,
                text: Cow::Owned(text.into_owned()),
            },
            Self::Internal {
                symbol,
                children,
                rule,
            } => Node::Internal {
                symbol,
                children: children.into_iter().map(Node::into_owned).collect(),
                rule,
            },
        }
    }
}

impl<'t, S, R> From<Token<'t, S>> for Node<'t, S, R> {
    fn from(token: Token<'t, S>) -> Self {
        Self::Leaf {
            symbol: token.symbol,
            text: token.text,
        }
    }
}

/// Iterator over the leaves of a tree, see [`Node::leaves`].
pub struct Leaves<'a, 't, S, R> {
    stack: Vec<&'a Node<'t, S, R>>,
}

impl<'a, 't, S, R> Iterator for Leaves<'a, 't, S, R> {
    type Item = &'a Node<'t, S, R>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf { .. } => return Some(node),
                Node::Internal { children, .. } => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestNode = Node<'static, char, u8>;

    fn leaf(symbol: char, text: &'static str) -> TestNode {
        Token::new(symbol, text).into()
    }

    #[test]
    fn leaves_in_source_order() {
        let tree = Node::Internal {
            symbol: 'S',
            rule: 0,
            children: vec![
                leaf('a', "x"),
                Node::Internal {
                    symbol: 'B',
                    rule: 1,
                    children: vec![leaf('b', "y"), leaf('c', "z")],
                },
                Node::Internal {
                    symbol: 'E',
                    rule: 2,
                    children: vec![],
                },
                leaf('d', "w"),
            ],
        };
        let texts: Vec<_> = tree.leaves().filter_map(Node::text).collect();
        assert_eq!(texts, ["x", "y", "z", "w"]);
        assert_eq!(tree.flatten_text(), "xyzw");
        assert_eq!(tree.children().len(), 4);
        assert_eq!(tree.children()[1].rule(), Some(1));
        assert_eq!(tree.children()[0].rule(), None);
    }

    #[test]
    fn into_owned_preserves_structure() {
        let text = String::from("r1");
        let node: Node<'_, char, u8> = Token::new('r', text.as_str()).into();
        let owned = node.into_owned();
        drop(text);
        assert_eq!(owned.text(), Some("r1"));
        assert_eq!(owned.symbol(), 'r');
        assert!(owned.is_leaf());
    }
}
