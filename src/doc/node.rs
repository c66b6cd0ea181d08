use serde::{Deserialize, Serialize};

use super::DocError;

/// Attributes carried on a structural node's opening boundary.
///
/// Only register entries use these today: they record the open depths of
/// the fragment stored in the entry so a later paste can reproduce the
/// original slice exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attrs {
    #[serde(default)]
    pub open_start: usize,
    #[serde(default)]
    pub open_end: usize,
}

impl Attrs {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One unit of the document's flat position space.
///
/// A document is a balanced token sequence; token `i` occupies positions
/// `[i, i+1)`, so the document size equals the token count and a node with
/// `n` characters of text contributes `n + 2` positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Opening boundary of a structural node.
    Open { kind: String, attrs: Attrs },
    /// Closing boundary of a structural node.
    Close { kind: String },
    /// A single character of inline text.
    Text { ch: char },
}

impl Token {
    pub fn open(kind: impl Into<String>) -> Self {
        Token::Open {
            kind: kind.into(),
            attrs: Attrs::default(),
        }
    }

    pub fn close(kind: impl Into<String>) -> Self {
        Token::Close { kind: kind.into() }
    }
}

/// Tree view of document content, used for construction, assertions and
/// the wire form of slices. Converts losslessly to and from tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// An inline text run. Serializes as a bare JSON string.
    Text(String),
    /// A structural node with child content.
    Elem {
        kind: String,
        #[serde(default, skip_serializing_if = "Attrs::is_default")]
        attrs: Attrs,
        #[serde(default)]
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn elem(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Elem {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        }
    }

    pub fn elem_with_attrs(kind: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Self {
        Node::Elem {
            kind: kind.into(),
            attrs,
            children,
        }
    }

    /// The number of flat positions this node spans: character count for
    /// text, content size plus the two boundaries for elements.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Elem { children, .. } => {
                2 + children.iter().map(Node::size).sum::<usize>()
            }
        }
    }

    /// Append this node's token form to `out`.
    pub(crate) fn flatten_into(&self, out: &mut Vec<Token>) {
        match self {
            Node::Text(text) => out.extend(text.chars().map(|ch| Token::Text { ch })),
            Node::Elem {
                kind,
                attrs,
                children,
            } => {
                out.push(Token::Open {
                    kind: kind.clone(),
                    attrs: *attrs,
                });
                for child in children {
                    child.flatten_into(out);
                }
                out.push(Token::Close { kind: kind.clone() });
            }
        }
    }
}

/// Flatten a node list into its token form.
pub(crate) fn flatten(nodes: &[Node]) -> Vec<Token> {
    let mut out = Vec::new();
    for node in nodes {
        node.flatten_into(&mut out);
    }
    out
}

/// Rebuild the tree view of a balanced token run. Adjacent text tokens
/// merge into a single text node.
pub(crate) fn parse_nodes(tokens: &[Token]) -> Result<Vec<Node>, DocError> {
    struct Frame {
        kind: String,
        attrs: Attrs,
        children: Vec<Node>,
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut top: Vec<Node> = Vec::new();
    let mut text = String::new();

    fn flush(text: &mut String, out: &mut Vec<Node>) {
        if !text.is_empty() {
            out.push(Node::Text(std::mem::take(text)));
        }
    }

    for (at, token) in tokens.iter().enumerate() {
        match token {
            Token::Text { ch } => text.push(*ch),
            Token::Open { kind, attrs } => {
                flush(&mut text, stack.last_mut().map_or(&mut top, |f| &mut f.children));
                stack.push(Frame {
                    kind: kind.clone(),
                    attrs: *attrs,
                    children: Vec::new(),
                });
            }
            Token::Close { kind } => {
                flush(&mut text, stack.last_mut().map_or(&mut top, |f| &mut f.children));
                let frame = stack.pop().ok_or(DocError::Unbalanced { at })?;
                if frame.kind != *kind {
                    return Err(DocError::Unbalanced { at });
                }
                let node = Node::Elem {
                    kind: frame.kind,
                    attrs: frame.attrs,
                    children: frame.children,
                };
                stack.last_mut().map_or(&mut top, |f| &mut f.children).push(node);
            }
        }
    }

    if !stack.is_empty() {
        return Err(DocError::Unbalanced { at: tokens.len() });
    }
    flush(&mut text, &mut top);
    Ok(top)
}
