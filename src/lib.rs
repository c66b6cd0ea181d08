/*!
 * # treeshift
 *
 * Reversible move steps and register-backed cut/paste for tree-shaped
 * documents addressed through a flat integer position space.
 *
 * - [`doc`]: the token-stream document model, slices with open depth
 *   metadata, and the [`DocAccess`](doc::DocAccess) capability the edit
 *   core is written against.
 * - [`editing`]: [`MoveStep`](editing::MoveStep) and its inverse,
 *   position maps for rebasing, the step codec registry, transactions,
 *   and the cut/paste register flow.
 */

pub mod doc;
pub mod editing;

pub use doc::{Doc, DocAccess, DocError, Schema, Slice};
pub use editing::{
    Bias, InvertedMoveStep, Mappable, Mapping, MoveStep, Step, StepError, StepMap, StepRegistry,
    Transaction,
};
