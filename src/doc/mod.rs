/*!
 * # Document Model
 *
 * The tree-shaped document the edit core operates on, addressed through a
 * flat integer position space.
 *
 * A document is stored as a balanced sequence of [`Token`]s: an opening
 * boundary, a closing boundary, or one character of text. Token `i`
 * occupies positions `[i, i + 1)`, so position 0 is the document start,
 * the maximum position equals the document size, and a node with `n`
 * characters of text contributes `n + 2` positions. The tree view
 * ([`Node`]) converts losslessly to and from this token form.
 *
 * The edit core consumes documents only through the [`DocAccess`]
 * capability: range-slice extraction (producing a [`Slice`] with open
 * depth metadata) and range replacement (producing a new document plus
 * the [`StepMap`](crate::editing::StepMap) for the change). [`Doc`] is
 * the reference implementation; a host with its own document type
 * implements the same trait. Documents are immutable values, so holders
 * of earlier versions are never invalidated by later edits.
 *
 * Structural well-formedness here means balanced, kind-matched
 * boundaries. Which node kinds may contain which content is the host
 * schema's concern and is not checked by this crate.
 */

mod document;
mod node;
mod schema;
mod slice;

pub use document::{ChildNode, Doc};
pub use node::{Attrs, Node, Token};
pub use schema::{NodeSpec, Schema};
pub use slice::Slice;

use crate::editing::StepMap;

/// Failures surfaced by the document model.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("Position {pos} is out of range for a document of size {size}")]
    OutOfRange { pos: usize, size: usize },
    #[error("Invalid range: {from} must not exceed {to}")]
    InvalidRange { from: usize, to: usize },
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),
    #[error("Unbalanced structural boundary at position {at}")]
    Unbalanced { at: usize },
    #[error("Replacing {from}..{to} would break the surrounding structure")]
    CannotReplace { from: usize, to: usize },
    #[error("Open depths {open_start}/{open_end} exceed the fragment's nesting")]
    InvalidSlice { open_start: usize, open_end: usize },
}

/// Result of a range replacement: the new document plus the position map
/// for the change.
#[derive(Debug, Clone)]
pub struct Replaced<D> {
    pub doc: D,
    pub map: StepMap,
}

/// The document capability the edit core is written against.
///
/// All operations are pure: a failed call returns an error and leaves the
/// receiver untouched, a successful `replace` returns a fresh document.
pub trait DocAccess: Sized {
    /// Total number of flat positions in the document.
    fn size(&self) -> usize;

    /// Extract the content between two positions, recording how many
    /// structural levels the extraction cut through at each edge.
    fn slice(&self, from: usize, to: usize) -> Result<Slice, DocError>;

    /// Replace `from..to` with `slice`, coercing open fragments into
    /// self-contained form when the surrounding depth does not match.
    fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Replaced<Self>, DocError>;
}
