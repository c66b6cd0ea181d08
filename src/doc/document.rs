use crate::editing::{MapRange, StepMap};

use super::node::{flatten, parse_nodes};
use super::{Attrs, DocAccess, DocError, Node, Replaced, Schema, Slice, Token};

/// Reference document implementation backed by a balanced token stream.
///
/// Equality compares content only, so two documents with the same tree
/// compare equal regardless of how their schemas were assembled.
#[derive(Debug, Clone)]
pub struct Doc {
    schema: Schema,
    content: Vec<Token>,
}

/// A direct structural child, located by its outer token range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNode {
    pub kind: String,
    pub attrs: Attrs,
    /// Position of the child's opening boundary.
    pub start: usize,
    /// Outer size, boundaries included.
    pub size: usize,
}

impl PartialEq for Doc {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for Doc {}

impl Doc {
    /// Build a document from top-level nodes, checking every kind against
    /// the schema.
    pub fn new(schema: Schema, nodes: Vec<Node>) -> Result<Self, DocError> {
        let content = flatten(&nodes);
        validate(&schema, &content)?;
        Ok(Self { schema, content })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The tree view of the document.
    pub fn nodes(&self) -> Vec<Node> {
        // content is kept balanced by every constructor and edit
        parse_nodes(&self.content).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.content
    }

    /// All text characters in document order, structure dropped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|token| match token {
                Token::Text { ch } => Some(*ch),
                _ => None,
            })
            .collect()
    }

    /// Direct children of the document root.
    pub fn children(&self) -> Vec<ChildNode> {
        self.children_in(0, self.content.len())
    }

    /// The document's last structural child, if any.
    pub fn last_child(&self) -> Option<ChildNode> {
        self.children().pop()
    }

    /// Structural children whose outer range falls inside `start..end`.
    /// Text tokens at the top of the range are skipped.
    pub(crate) fn children_in(&self, start: usize, end: usize) -> Vec<ChildNode> {
        let mut children = Vec::new();
        let mut depth = 0usize;
        let mut open: Option<(usize, String, Attrs)> = None;
        for (offset, token) in self.content[start..end].iter().enumerate() {
            match token {
                Token::Open { kind, attrs } => {
                    if depth == 0 {
                        open = Some((start + offset, kind.clone(), *attrs));
                    }
                    depth += 1;
                }
                Token::Close { .. } => {
                    // a close the range does not open belongs to an
                    // enclosing node; skip it
                    if depth == 0 {
                        continue;
                    }
                    depth -= 1;
                    if depth == 0 {
                        let (at, kind, attrs) = open.take().unwrap_or_default();
                        children.push(ChildNode {
                            kind,
                            attrs,
                            start: at,
                            size: start + offset + 1 - at,
                        });
                    }
                }
                Token::Text { .. } => {}
            }
        }
        children
    }

    fn check_range(&self, from: usize, to: usize) -> Result<(), DocError> {
        if from > to {
            return Err(DocError::InvalidRange { from, to });
        }
        if to > self.content.len() {
            return Err(DocError::OutOfRange {
                pos: to,
                size: self.content.len(),
            });
        }
        Ok(())
    }

    fn spliced(&self, from: usize, to: usize, insert: &[Token]) -> Result<Vec<Token>, DocError> {
        let mut out = Vec::with_capacity(self.content.len() - (to - from) + insert.len());
        out.extend_from_slice(&self.content[..from]);
        out.extend_from_slice(insert);
        out.extend_from_slice(&self.content[to..]);
        validate(&self.schema, &out)?;
        Ok(out)
    }
}

impl DocAccess for Doc {
    fn size(&self) -> usize {
        self.content.len()
    }

    fn slice(&self, from: usize, to: usize) -> Result<Slice, DocError> {
        self.check_range(from, to)?;
        let raw = &self.content[from..to];

        // Boundaries the extraction cuts through: closes with no open in
        // the slice all precede opens with no close in the slice.
        let mut unmatched_opens: Vec<&Token> = Vec::new();
        let mut unmatched_closes: Vec<&str> = Vec::new();
        for token in raw {
            match token {
                Token::Open { .. } => unmatched_opens.push(token),
                Token::Close { kind } => {
                    if unmatched_opens.pop().is_none() {
                        unmatched_closes.push(kind);
                    }
                }
                Token::Text { .. } => {}
            }
        }

        let open_start = unmatched_closes.len();
        let open_end = unmatched_opens.len();
        let mut content = Vec::with_capacity(raw.len() + open_start + open_end);
        for kind in unmatched_closes.iter().rev() {
            content.push(Token::open(kind.to_string()));
        }
        content.extend_from_slice(raw);
        for token in unmatched_opens.iter().rev() {
            if let Token::Open { kind, .. } = token {
                content.push(Token::close(kind.clone()));
            }
        }
        Ok(Slice::from_parts(content, open_start, open_end))
    }

    fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Replaced<Self>, DocError> {
        self.check_range(from, to)?;

        // Prefer the raw run: an open fragment drops into place wherever
        // the surrounding depth matches its open boundaries. When it does
        // not fit, fall back to the closed form, growing the inserted
        // content by the synthesized boundaries.
        let content = match self.spliced(from, to, slice.raw()) {
            Ok(content) => content,
            Err(DocError::UnknownKind(kind)) => return Err(DocError::UnknownKind(kind)),
            Err(_) if slice.open_start() > 0 || slice.open_end() > 0 => self
                .spliced(from, to, slice.content())
                .map_err(|err| match err {
                    DocError::UnknownKind(kind) => DocError::UnknownKind(kind),
                    _ => DocError::CannotReplace { from, to },
                })?,
            Err(_) => return Err(DocError::CannotReplace { from, to }),
        };

        let inserted = content.len() + (to - from) - self.content.len();
        let map = StepMap::new(vec![MapRange {
            start: from,
            len: to - from,
            inserted,
        }]);
        Ok(Replaced {
            doc: Doc {
                schema: self.schema.clone(),
                content,
            },
            map,
        })
    }
}

/// Check a token stream for balanced, kind-matched boundaries and
/// schema-known kinds. Containment rules are the host's concern.
fn validate(schema: &Schema, tokens: &[Token]) -> Result<(), DocError> {
    let mut stack: Vec<&str> = Vec::new();
    for (at, token) in tokens.iter().enumerate() {
        match token {
            Token::Open { kind, .. } => {
                if !schema.contains(kind) {
                    return Err(DocError::UnknownKind(kind.clone()));
                }
                stack.push(kind);
            }
            Token::Close { kind } => match stack.pop() {
                Some(open) if open == kind => {}
                _ => return Err(DocError::Unbalanced { at }),
            },
            Token::Text { .. } => {}
        }
    }
    if stack.is_empty() {
        Ok(())
    } else {
        Err(DocError::Unbalanced { at: tokens.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> Node {
        Node::elem("paragraph", vec![Node::text(text)])
    }

    fn two_paragraphs() -> Doc {
        Doc::new(Schema::basic(), vec![p("1234567890"), p("abcdefghij")]).unwrap()
    }

    #[test]
    fn test_flat_addressing() {
        let doc = two_paragraphs();

        assert_eq!(doc.size(), 24);
        assert_eq!(doc.text(), "1234567890abcdefghij");
        assert_eq!(doc.nodes(), vec![p("1234567890"), p("abcdefghij")]);
    }

    #[test]
    fn test_unknown_kind_is_rejected_at_construction() {
        let result = Doc::new(Schema::basic(), vec![Node::elem("table", vec![])]);

        assert!(matches!(result, Err(DocError::UnknownKind(kind)) if kind == "table"));
    }

    #[test]
    fn test_slice_of_whole_node_is_closed() {
        let doc = two_paragraphs();
        let slice = doc.slice(0, 12).unwrap();

        assert_eq!(slice.open_start(), 0);
        assert_eq!(slice.open_end(), 0);
        assert_eq!(slice.size(), 12);
        assert_eq!(slice.nodes(), vec![p("1234567890")]);
    }

    #[test]
    fn test_slice_inside_one_node_is_plain_text() {
        let doc = two_paragraphs();
        let slice = doc.slice(4, 7).unwrap();

        assert_eq!(slice.open_start(), 0);
        assert_eq!(slice.open_end(), 0);
        assert_eq!(slice.nodes(), vec![Node::text("456")]);
    }

    #[test]
    fn test_slice_across_boundary_records_open_depths() {
        let doc = two_paragraphs();
        let slice = doc.slice(10, 14).unwrap();

        assert_eq!(slice.open_start(), 1);
        assert_eq!(slice.open_end(), 1);
        assert_eq!(slice.size(), 4);
        assert_eq!(slice.nodes(), vec![p("0"), p("a")]);
    }

    #[test]
    fn test_slice_bounds_are_checked() {
        let doc = two_paragraphs();

        assert!(matches!(
            doc.slice(7, 4),
            Err(DocError::InvalidRange { from: 7, to: 4 })
        ));
        assert!(matches!(
            doc.slice(0, 30),
            Err(DocError::OutOfRange { pos: 30, size: 24 })
        ));
    }

    #[test]
    fn test_replace_text_inside_paragraph() {
        let doc = two_paragraphs();
        let insert = Slice::new(vec![Node::text("XX")], 0, 0).unwrap();
        let replaced = doc.replace(6, 6, &insert).unwrap();

        assert_eq!(
            replaced.doc.nodes(),
            vec![p("12345XX67890"), p("abcdefghij")]
        );
        assert_eq!(replaced.doc.size(), 26);
        // the source document is untouched
        assert_eq!(doc.size(), 24);
    }

    #[test]
    fn test_replace_coerces_open_slice_at_top_level() {
        let doc = two_paragraphs();
        let slice = doc.slice(10, 14).unwrap();
        let replaced = doc.replace(24, 24, &slice).unwrap();

        assert_eq!(
            replaced.doc.nodes(),
            vec![p("1234567890"), p("abcdefghij"), p("0"), p("a")]
        );
        // coercion closed both edges, growing the insertion by two
        assert_eq!(replaced.doc.size(), 30);
    }

    #[test]
    fn test_replace_open_slice_at_matching_depth_stays_open() {
        let doc = two_paragraphs();
        let slice = doc.slice(10, 14).unwrap();
        // position 6 sits inside the first paragraph, depth matches
        let replaced = doc.replace(6, 6, &slice).unwrap();

        assert_eq!(
            replaced.doc.nodes(),
            vec![p("123450"), p("a67890"), p("abcdefghij")]
        );
        assert_eq!(replaced.doc.size(), 28);
    }

    #[test]
    fn test_replace_rejects_structural_damage() {
        let doc = two_paragraphs();

        // deleting a lone closing boundary cannot balance
        let result = doc.replace(11, 12, &Slice::empty());
        assert!(matches!(
            result,
            Err(DocError::CannotReplace { from: 11, to: 12 })
        ));
    }

    #[test]
    fn test_delete_across_boundary_joins_nodes() {
        let doc = two_paragraphs();
        let replaced = doc.replace(10, 14, &Slice::empty()).unwrap();

        assert_eq!(replaced.doc.nodes(), vec![p("123456789bcdefghij")]);
    }

    #[test]
    fn test_children_enumeration() {
        let doc = two_paragraphs();
        let children = doc.children();

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].start, 0);
        assert_eq!(children[0].size, 12);
        assert_eq!(children[1].start, 12);
        assert_eq!(children[1].kind, "paragraph");

        let last = doc.last_child().unwrap();
        assert_eq!(last.start, 12);
        assert_eq!(last.size, 12);
    }

    #[test]
    fn test_children_in_skips_closes_of_enclosing_nodes() {
        let doc = two_paragraphs();
        // the range starts inside the first paragraph, so its closing
        // boundary at 11 has no matching open within the range
        let children = doc.children_in(1, 24);

        assert_eq!(children.len(), 1);
        assert_eq!(children[0].start, 12);
        assert_eq!(children[0].size, 12);
    }
}
