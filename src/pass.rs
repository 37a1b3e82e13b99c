//! Pass trait and pipeline infrastructure.
//!
//! A [`Pass`] is one named whole-program transformation stage. The host
//! assembles an ordered list of stages into a [`PassPipeline`] and runs it
//! over one mutable [`Program`]; each stage reports whether it changed
//! anything. Stages hold no references into the program between runs, so a
//! pipeline can be reused across programs.

use log::{debug, info};

use crate::ir::Program;
use crate::Result;

/// A whole-program transformation stage.
///
/// Passes must be thread-safe (`Send + Sync`); whether a pass exploits
/// parallelism internally is its own business — the pipeline itself runs
/// stages strictly in order, since later stages see earlier stages' edits.
pub trait Pass: Send + Sync {
    /// Unique name for logging and stage lists.
    fn name(&self) -> &'static str;

    /// Runs the pass over the whole program.
    ///
    /// Returns `true` if the program was changed.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural defects of the program graph;
    /// expected per-candidate failures are handled internally by passes.
    fn run(&self, program: &mut Program) -> Result<bool>;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// An ordered list of passes executed over one program.
///
/// # Example
///
/// ```rust
/// use dexoutline::ir::build::ProgramBuilder;
/// use dexoutline::outliner::InstructionSequenceOutliner;
/// use dexoutline::pass::PassPipeline;
///
/// let mut builder = ProgramBuilder::new();
/// builder.class("LMain;")?;
/// let mut program = builder.build()?;
///
/// let pipeline = PassPipeline::new().with_pass(InstructionSequenceOutliner::default());
/// let changed = pipeline.run(&mut program)?;
/// assert!(!changed, "an empty program has nothing to outline");
/// # Ok::<(), dexoutline::Error>(())
/// ```
#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass to the end of the stage list.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends a boxed pass to the end of the stage list.
    pub fn push(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// The registered stage names, in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Runs every stage once, in order.
    ///
    /// Returns `true` if any stage changed the program.
    ///
    /// # Errors
    ///
    /// Propagates the first stage error; later stages do not run.
    pub fn run(&self, program: &mut Program) -> Result<bool> {
        let mut any_changed = false;
        for pass in &self.passes {
            debug!("running pass {}", pass.name());
            let changed = pass.run(program)?;
            info!(
                "pass {} {}",
                pass.name(),
                if changed { "changed the program" } else { "made no changes" }
            );
            any_changed |= changed;
        }
        Ok(any_changed)
    }
}
