//! Method-local analyses the outliner builds on.
//!
//! Two views of a method's control-flow graph live here:
//!
//! - [`Liveness`] — backward register liveness at block and instruction
//!   boundaries, the source of truth for live-in parameters, live-out
//!   return values and the escape-to-catch check;
//! - [`big_blocks`] — maximal straight-line multi-block regions
//!   ([`BigBlock`]) whose concatenated instruction streams are the
//!   outliner's search space.
//!
//! Both are pure functions of one method and safe to run in parallel
//! across methods. Both are derived views: recompute them after any graph
//! mutation.

mod bigblock;
mod liveness;

pub use bigblock::{big_blocks, BigBlock};
pub use liveness::Liveness;
