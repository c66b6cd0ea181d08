use serde::{Deserialize, Serialize};

use super::node::{flatten, parse_nodes};
use super::{Attrs, DocError, Node, Schema, Token};

/// An extracted, possibly partial, piece of a document.
///
/// `content` holds the *closed* (balanced) token form of the extracted
/// range: missing opening boundaries are synthesized at the front and
/// missing closing boundaries at the back. `open_start` and `open_end`
/// record how many structural levels the extraction cut through at each
/// edge, so the raw token run as it sat in the source document is exactly
/// `content[open_start .. len - open_end]`.
///
/// A slice with both depths zero is self-contained and can be inserted at
/// any structurally valid position; an open slice re-inserts cleanly only
/// where the surrounding nesting matches its open depths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSlice", into = "RawSlice")]
pub struct Slice {
    content: Vec<Token>,
    open_start: usize,
    open_end: usize,
}

/// Wire form: content as a node list plus the open depths.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSlice {
    #[serde(default)]
    content: Vec<Node>,
    #[serde(default)]
    open_start: usize,
    #[serde(default)]
    open_end: usize,
}

impl TryFrom<RawSlice> for Slice {
    type Error = DocError;

    fn try_from(raw: RawSlice) -> Result<Self, Self::Error> {
        Slice::new(raw.content, raw.open_start, raw.open_end)
    }
}

impl From<Slice> for RawSlice {
    fn from(slice: Slice) -> Self {
        RawSlice {
            open_start: slice.open_start,
            open_end: slice.open_end,
            content: slice.nodes(),
        }
    }
}

impl Slice {
    /// The empty slice, used to express pure deletions.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            open_start: 0,
            open_end: 0,
        }
    }

    /// Build a slice from closed content nodes and explicit open depths.
    ///
    /// Fails when the declared depths exceed the nesting actually present
    /// on the first/last child spines of `content`.
    pub fn new(content: Vec<Node>, open_start: usize, open_end: usize) -> Result<Self, DocError> {
        if spine_depth(&content, Edge::Start) < open_start
            || spine_depth(&content, Edge::End) < open_end
        {
            return Err(DocError::InvalidSlice {
                open_start,
                open_end,
            });
        }
        Ok(Self {
            content: flatten(&content),
            open_start,
            open_end,
        })
    }

    /// A self-contained slice holding one empty element.
    pub fn node(kind: impl Into<String>, attrs: Attrs) -> Self {
        let kind = kind.into();
        Self {
            content: vec![
                Token::Open {
                    kind: kind.clone(),
                    attrs,
                },
                Token::Close { kind },
            ],
            open_start: 0,
            open_end: 0,
        }
    }

    /// Internal constructor for already-closed token runs.
    pub(crate) fn from_parts(content: Vec<Token>, open_start: usize, open_end: usize) -> Self {
        debug_assert!(open_start + open_end <= content.len() || content.is_empty());
        Self {
            content,
            open_start,
            open_end,
        }
    }

    /// The number of positions the slice occupied in its source document.
    /// Synthesized closing boundaries do not count.
    pub fn size(&self) -> usize {
        self.content.len() - self.open_start - self.open_end
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// The closed token form.
    pub fn content(&self) -> &[Token] {
        &self.content
    }

    /// The token run as it sat in the source document, with the
    /// synthesized boundaries stripped.
    pub(crate) fn raw(&self) -> &[Token] {
        &self.content[self.open_start..self.content.len() - self.open_end]
    }

    /// The closed content as a node tree.
    pub fn nodes(&self) -> Vec<Node> {
        // content is balanced by construction
        parse_nodes(&self.content).unwrap_or_default()
    }

    /// Whether the slice's top-level content is inline (text or inline
    /// node kinds). Empty slices count as block.
    pub fn has_inline_content(&self, schema: &Schema) -> bool {
        let mut depth = 0usize;
        for token in &self.content {
            match token {
                Token::Text { .. } if depth == 0 => return true,
                Token::Open { kind, .. } => {
                    if depth == 0 && schema.is_inline(kind) {
                        return true;
                    }
                    depth += 1;
                }
                Token::Close { .. } => depth -= 1,
                Token::Text { .. } => {}
            }
        }
        false
    }
}

enum Edge {
    Start,
    End,
}

/// How deeply the first (or last) child spine of `content` nests.
fn spine_depth(content: &[Node], edge: Edge) -> usize {
    let mut depth = 0;
    let mut nodes = content;
    loop {
        let next = match edge {
            Edge::Start => nodes.first(),
            Edge::End => nodes.last(),
        };
        match next {
            Some(Node::Elem { children, .. }) => {
                depth += 1;
                nodes = children;
            }
            _ => return depth,
        }
    }
}
