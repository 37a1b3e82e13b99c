// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dexoutline
//!
//! A whole-program instruction sequence outliner for register-based
//! bytecode. `dexoutline` finds identical straight-line instruction runs
//! repeated across (or within) method bodies and replaces every occurrence
//! with a call to one synthesized static method, shrinking the program at
//! the cost of a few extra call instructions per site.
//!
//! ## Quick Start
//!
//! Add `dexoutline` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dexoutline = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the
//! prelude:
//!
//! ```rust
//! use dexoutline::prelude::*;
//!
//! let mut builder = ProgramBuilder::new();
//! let string = builder.string_type();
//! let void = builder.void_type();
//! let printer = builder.reference_type("Lio/Printer;");
//! let println = builder.extern_method(printer, "println", void, &[string]);
//!
//! let mut class = builder.class("LMain;")?;
//! for name in ["first", "second"] {
//!     class
//!         .method(name)
//!         .block(|b| {
//!             for line in ["shared", "prologue", "here"] {
//!                 b.const_string(Reg(0), line);
//!                 b.invoke_static(println, &[Reg(0)]);
//!             }
//!             b.ret();
//!         })
//!         .build()?;
//! }
//! let mut program = builder.build()?;
//!
//! let outliner = InstructionSequenceOutliner::new(OutlinerConfig::default());
//! let stats = outliner.outline(&mut program)?;
//! assert_eq!(stats.methods_created, 1);
//! # Ok::<(), dexoutline::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - the program model: classes, methods, basic blocks,
//!   instructions and interned symbol pools, plus fluent builders
//! - [`analysis`] - derived views over method graphs: big-block extraction
//!   and backward register liveness
//! - [`outliner`] - the outlining pass itself: canonicalization, candidate
//!   discovery, dataflow contracts, synthesis and call-site rewriting
//! - [`pass`] - the [`Pass`](pass::Pass) trait and
//!   [`PassPipeline`](pass::PassPipeline) for composing transformation
//!   stages
//! - [`prelude`] - re-exports of the commonly used types
//! - [`Error`] and [`Result`] - error handling across the crate
//!
//! Candidate scanning runs in parallel per method (`rayon`), with results
//! merged deterministically; given the same program and configuration, the
//! outliner always produces the same output.

#[macro_use]
pub(crate) mod error;

pub mod analysis;
pub mod ir;
pub mod outliner;
pub mod pass;
pub mod prelude;
pub mod utils;

pub use error::Error;

/// Result type used throughout `dexoutline`, with [`enum@Error`] as the
/// failure case.
pub type Result<T> = std::result::Result<T, Error>;
