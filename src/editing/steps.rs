use serde::{Deserialize, Serialize};

use crate::doc::{DocAccess, DocError, Slice};

use super::map::{Bias, Mappable, MapRange, StepMap};

/// Failures surfaced by step construction and application.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("Invalid move range: {from} must be less than {to}")]
    EmptyRange { from: usize, to: usize },
    #[error("Destination {dest} lies inside the moved range {from}..{to}")]
    DestinationInsideRange {
        from: usize,
        to: usize,
        dest: usize,
    },
    #[error("Invalid delete range: {delete_from} must be less than {delete_to}")]
    EmptyDeleteRange {
        delete_from: usize,
        delete_to: usize,
    },
    #[error("Destination {dest} lies inside the delete range {delete_from}..{delete_to}")]
    DestinationInsideDeleteRange {
        delete_from: usize,
        delete_to: usize,
        dest: usize,
    },
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// Result of applying a step: the new document plus the composite
/// position map for everything the step changed.
#[derive(Debug, Clone)]
pub struct StepResult<D> {
    pub doc: D,
    pub map: StepMap,
}

/// An atomic, invertible edit that relocates the content in `from..to`
/// to `dest`.
///
/// The three positions address the document the step will be applied to;
/// the step itself never changes after construction. Applying it is
/// equivalent to inserting the sliced content at `dest` and then deleting
/// the original range, exposed as one step so it can be inverted and
/// rebased as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMove")]
pub struct MoveStep {
    from: usize,
    to: usize,
    dest: usize,
}

#[derive(Deserialize)]
struct RawMove {
    from: usize,
    to: usize,
    dest: usize,
}

impl TryFrom<RawMove> for MoveStep {
    type Error = StepError;

    fn try_from(raw: RawMove) -> Result<Self, Self::Error> {
        MoveStep::new(raw.from, raw.to, raw.dest)
    }
}

impl MoveStep {
    /// Build a move step, failing fast on contract violations: the source
    /// range must be non-empty and the destination must lie strictly
    /// outside it. Destinations at the range boundaries are rejected too
    /// since they describe a move that goes nowhere.
    pub fn new(from: usize, to: usize, dest: usize) -> Result<Self, StepError> {
        if from >= to {
            return Err(StepError::EmptyRange { from, to });
        }
        if dest >= from && dest <= to {
            return Err(StepError::DestinationInsideRange { from, to, dest });
        }
        Ok(Self { from, to, dest })
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn dest(&self) -> usize {
        self.dest
    }

    /// Relocate `from..to` to `dest`, returning the new document and the
    /// composite map covering both touched spans.
    ///
    /// The insertion happens first, against the original document; the
    /// source range is then mapped through that insertion and removed.
    /// Either the whole step applies or the document is left untouched.
    pub fn apply<D: DocAccess>(&self, doc: &D) -> Result<StepResult<D>, StepError> {
        let slice = doc.slice(self.from, self.to)?;
        let inserted = doc.replace(self.dest, self.dest, &slice)?;
        let fitted = inserted_len(&inserted.map);

        let from = inserted.map.map(self.from, Bias::Start);
        let to = inserted.map.map(self.to, Bias::End);
        let removed = inserted.doc.replace(from, to, &Slice::empty())?;

        Ok(StepResult {
            doc: removed.doc,
            map: self.combined_map(fitted),
        })
    }

    /// Compute the step that undoes this move, given the document the
    /// move has not yet been applied to.
    ///
    /// The insertion at `dest` is recomputed to learn the size the
    /// fragment takes once fitted there, so the returned step's delete
    /// range covers the relocated copy exactly even when coercion grew it.
    pub fn invert<D: DocAccess>(&self, doc: &D) -> Result<InvertedMoveStep, StepError> {
        let slice = doc.slice(self.from, self.to)?;
        let probe = doc.replace(self.dest, self.dest, &slice)?;
        let fitted = inserted_len(&probe.map);

        let map = self.combined_map(fitted);
        let current_dest = map.map(self.dest, Bias::Start);
        let dest = map.map(self.from, Bias::Start);
        InvertedMoveStep::new(dest, slice, current_dest, current_dest + fitted)
    }

    /// Rebase this step through a concurrent edit's map.
    ///
    /// Returns `None` when the mapped positions collapse into a
    /// degenerate move (the concurrent edit deleted the touched region);
    /// callers treat that as a no-op, not an error.
    pub fn map(&self, mapping: &impl Mappable) -> Option<MoveStep> {
        let from = mapping.map(self.from, Bias::End);
        let to = mapping.map(self.to, Bias::Start);
        let dest = mapping.map(self.dest, Bias::End);
        MoveStep::new(from, to, dest).ok()
    }

    /// The two-span map for this move, assuming the fragment keeps its
    /// size at the destination.
    pub fn range_map(&self) -> StepMap {
        self.combined_map(self.to - self.from)
    }

    /// Source removal plus destination insertion as one map; `new` sorts
    /// the spans into ascending anchor order, so forward and backward
    /// moves come out the same shape.
    fn combined_map(&self, fitted: usize) -> StepMap {
        StepMap::new(vec![
            MapRange {
                start: self.from,
                len: self.to - self.from,
                inserted: 0,
            },
            MapRange {
                start: self.dest,
                len: 0,
                inserted: fitted,
            },
        ])
    }
}

/// The mirror image of a [`MoveStep`], produced by inverting one.
///
/// `dest` is where the extracted content goes back (the original move's
/// source), `content` is the fragment that was relocated, and
/// `delete_from..delete_to` is the range, in the post-move document, that
/// holds the relocated copy. Inverting again yields a move step equal in
/// effect to the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawInvertedMove")]
pub struct InvertedMoveStep {
    dest: usize,
    content: Slice,
    delete_from: usize,
    delete_to: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInvertedMove {
    dest: usize,
    content: Slice,
    delete_from: usize,
    delete_to: usize,
}

impl TryFrom<RawInvertedMove> for InvertedMoveStep {
    type Error = StepError;

    fn try_from(raw: RawInvertedMove) -> Result<Self, Self::Error> {
        InvertedMoveStep::new(raw.dest, raw.content, raw.delete_from, raw.delete_to)
    }
}

impl InvertedMoveStep {
    pub fn new(
        dest: usize,
        content: Slice,
        delete_from: usize,
        delete_to: usize,
    ) -> Result<Self, StepError> {
        if delete_from >= delete_to {
            return Err(StepError::EmptyDeleteRange {
                delete_from,
                delete_to,
            });
        }
        if dest >= delete_from && dest <= delete_to {
            return Err(StepError::DestinationInsideDeleteRange {
                delete_from,
                delete_to,
                dest,
            });
        }
        Ok(Self {
            dest,
            content,
            delete_from,
            delete_to,
        })
    }

    pub fn dest(&self) -> usize {
        self.dest
    }

    pub fn content(&self) -> &Slice {
        &self.content
    }

    pub fn delete_from(&self) -> usize {
        self.delete_from
    }

    pub fn delete_to(&self) -> usize {
        self.delete_to
    }

    /// Insert the stored fragment back at `dest`, then remove the
    /// relocated copy, shifted past the insertion when it landed before
    /// the copy.
    pub fn apply<D: DocAccess>(&self, doc: &D) -> Result<StepResult<D>, StepError> {
        let inserted = doc.replace(self.dest, self.dest, &self.content)?;
        let fitted = inserted_len(&inserted.map);

        let offset = if self.dest < self.delete_from {
            fitted
        } else {
            0
        };
        let removed = inserted.doc.replace(
            self.delete_from + offset,
            self.delete_to + offset,
            &Slice::empty(),
        )?;

        Ok(StepResult {
            doc: removed.doc,
            map: self.combined_map(fitted),
        })
    }

    /// Reconstruct the move this step undoes, equal in effect to the
    /// original move up to position renumbering.
    pub fn invert(&self) -> Result<MoveStep, StepError> {
        let size = self.content.size();
        let deleted = self.delete_to - self.delete_from;
        let from = if self.dest > self.delete_from {
            self.dest - deleted
        } else {
            self.dest
        };
        let dest = if self.delete_from > self.dest {
            self.delete_from + size
        } else {
            self.delete_from
        };
        MoveStep::new(from, from + size, dest)
    }

    /// Rebase through a concurrent edit's map, with the same bias
    /// conventions as [`MoveStep::map`]. `None` means the step collapsed
    /// into a no-op.
    pub fn map(&self, mapping: &impl Mappable) -> Option<InvertedMoveStep> {
        let dest = mapping.map(self.dest, Bias::End);
        let delete_from = mapping.map(self.delete_from, Bias::End);
        let delete_to = mapping.map(self.delete_to, Bias::Start);
        InvertedMoveStep::new(dest, self.content.clone(), delete_from, delete_to).ok()
    }

    /// Insertion at `dest` plus removal of the relocated copy, derived
    /// from this step's own fields for both move directions, assuming the
    /// fragment keeps its size at `dest`.
    pub fn range_map(&self) -> StepMap {
        self.combined_map(self.content.size())
    }

    fn combined_map(&self, fitted: usize) -> StepMap {
        StepMap::new(vec![
            MapRange {
                start: self.delete_from,
                len: self.delete_to - self.delete_from,
                inserted: 0,
            },
            MapRange {
                start: self.dest,
                len: 0,
                inserted: fitted,
            },
        ])
    }
}

/// A document edit step, dispatched over a closed set of kinds.
///
/// The wire form carries a `kind` tag (`"move"` / `"invertedMove"`) so a
/// transaction log or network payload can reconstruct steps generically;
/// see [`StepRegistry`](super::StepRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Step {
    Move(MoveStep),
    InvertedMove(InvertedMoveStep),
}

impl Step {
    /// The stable type tag used in the wire form.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Move(_) => "move",
            Step::InvertedMove(_) => "invertedMove",
        }
    }

    pub fn apply<D: DocAccess>(&self, doc: &D) -> Result<StepResult<D>, StepError> {
        match self {
            Step::Move(step) => step.apply(doc),
            Step::InvertedMove(step) => step.apply(doc),
        }
    }

    /// Invert against the document the step has not yet been applied to.
    /// The two step kinds alternate under inversion.
    pub fn invert<D: DocAccess>(&self, doc: &D) -> Result<Step, StepError> {
        match self {
            Step::Move(step) => step.invert(doc).map(Step::InvertedMove),
            Step::InvertedMove(step) => step.invert().map(Step::Move),
        }
    }

    /// Rebase through a concurrent edit's map; `None` is a degenerate
    /// no-op, not an error.
    pub fn map(&self, mapping: &impl Mappable) -> Option<Step> {
        match self {
            Step::Move(step) => step.map(mapping).map(Step::Move),
            Step::InvertedMove(step) => step.map(mapping).map(Step::InvertedMove),
        }
    }

    pub fn range_map(&self) -> StepMap {
        match self {
            Step::Move(step) => step.range_map(),
            Step::InvertedMove(step) => step.range_map(),
        }
    }
}

/// Total length inserted by a single-edit map.
fn inserted_len(map: &StepMap) -> usize {
    map.ranges().iter().map(|range| range.inserted).sum()
}
