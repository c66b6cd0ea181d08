/*!
 * # Edit Core
 *
 * Reversible edit steps over the flat position space of the
 * [document model](crate::doc), plus the register-backed cut/paste flow
 * built on top of them.
 *
 * The centerpiece is the [`MoveStep`], which relocates a range of
 * content in a single atomic edit. Applying one yields a new document
 * and a [`StepMap`] describing how every position moved; inverting one
 * yields an [`InvertedMoveStep`] that restores the prior document
 * exactly, including content the destination coerced into a different
 * shape. Both step kinds rebase over concurrent edits via [`Mappable`]
 * and round-trip through JSON via the [`StepRegistry`].
 *
 * [`Transaction`] sequences steps and plain replaces against one
 * document while accumulating the composite [`Mapping`], and the
 * [`registers`] module uses it to implement cut and paste as moves in
 * and out of a dedicated storage node, so the operations stay invertible
 * instead of destroying content.
 */

pub mod map;
pub mod registers;
pub mod registry;
pub mod steps;
pub mod transaction;

pub use map::{Bias, MapRange, MapResult, Mappable, Mapping, StepMap};
pub use registers::{
    REGISTER_BLOCK, REGISTER_INLINE, REGISTER_SLOT, RegisterError, handle_cut, handle_paste,
    with_registers,
};
pub use registry::{CodecError, StepCodec, StepRegistry};
pub use steps::{InvertedMoveStep, MoveStep, Step, StepError, StepResult};
pub use transaction::Transaction;
