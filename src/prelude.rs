//! # dexoutline Prelude
//!
//! This module provides a convenient prelude for the most commonly used
//! types and traits from the dexoutline library. Import this module to get
//! quick access to the essentials for building programs and running the
//! outliner.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexoutline operations
pub use crate::Error;

/// The result type used throughout dexoutline
pub use crate::Result;

// ================================================================================================
// Program Model
// ================================================================================================

/// The whole-program container and its identifiers
pub use crate::ir::{BlockId, ClassId, MethodId, MethodRefId, Program, Reg, TypeId};

/// Instructions, terminators and blocks
pub use crate::ir::{BasicBlock, BinaryOp, CatchEdge, CmpOp, Insn, InvokeKind, Terminator, UnaryOp};

/// Access flags
pub use crate::ir::{ClassFlags, MethodFlags};

/// Fluent builders for assembling programs
pub use crate::ir::build::{BlockBuilder, ClassBuilder, MethodBuilder, ProgramBuilder};

// ================================================================================================
// Analyses
// ================================================================================================

/// Straight-line region extraction and register liveness
pub use crate::analysis::{big_blocks, BigBlock, Liveness};

// ================================================================================================
// Outlining
// ================================================================================================

/// The outlining pass, its configuration and its report
pub use crate::outliner::{InstructionSequenceOutliner, OutlinerConfig, OutlinerStats};

/// Register-renaming canonicalization
pub use crate::outliner::{canonicalize, CanonicalSequence};

// ================================================================================================
// Pass Infrastructure
// ================================================================================================

/// Transformation stages and their pipeline
pub use crate::pass::{Pass, PassPipeline};
