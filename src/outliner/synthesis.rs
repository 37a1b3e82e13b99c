//! Synthesis of outlined methods.
//!
//! A selected candidate becomes one `public static synthetic` method named
//! `$outline$<n>`. Its parameters are the canonical sequence's live-in
//! registers in first-read order with types inferred from consumer demands,
//! its return value is the single live-out register (or `void`), and its
//! body is the canonical instruction run itself in a single block followed
//! by the return. Parameters arrive directly in their canonical register
//! indices, so the body needs no entry moves.
//!
//! When every occurrence of a candidate lies in one class, the method lands
//! there; cross-class candidates go into the shared helper class
//! `Ldexoutline/Outlined;`, created on first use and reused thereafter.

use log::debug;

use crate::ir::{
    BasicBlock, ClassFlags, ClassId, Method, MethodFlags, MethodId, Program, Reg, Terminator,
    TypeId,
};

use super::candidates::{Candidate, CandidateKey};
use super::dataflow;

/// Upper bound on parameters of a synthesized method, after the dex
/// `invoke-static/range` ceiling practical for outlined helpers.
pub(crate) const MAX_OUTLINE_PARAMS: usize = 16;

/// Descriptor of the shared helper class for cross-class candidates.
pub(crate) const HELPER_CLASS: &str = "Ldexoutline/Outlined;";

/// Name prefix of synthesized methods.
pub(crate) const OUTLINE_PREFIX: &str = "$outline$";

/// Naming and placement state for one pass invocation.
///
/// The counter resumes past any `$outline$<n>` methods already present, so
/// re-running the pass over an already-outlined program never collides.
#[derive(Debug)]
pub(crate) struct SynthesisContext {
    counter: usize,
}

impl SynthesisContext {
    /// Creates a context, resuming the name counter from the program.
    pub(crate) fn new(program: &Program) -> Self {
        let next = program
            .method_ids()
            .filter_map(|id| {
                let name = program.method(id).name();
                let suffix = name.strip_prefix(OUTLINE_PREFIX)?;
                suffix.parse::<usize>().ok()
            })
            .max()
            .map_or(0, |n| n + 1);
        Self { counter: next }
    }

    /// Synthesizes the outlined method for `candidate`.
    ///
    /// Returns `None` without touching the program when the candidate's
    /// contract is inexpressible: a live-in with no derivable parameter
    /// type, a live-out with no derivable return type, or too many
    /// parameters.
    pub(crate) fn synthesize(
        &mut self,
        program: &mut Program,
        candidate: &Candidate,
    ) -> Option<MethodId> {
        let key = &candidate.key;
        let live_ins = key.seq.live_ins();
        if live_ins.len() > MAX_OUTLINE_PARAMS {
            return None;
        }
        let param_types = dataflow::param_types(program, &key.seq)?;
        let return_type = match key.live_out {
            Some(index) => dataflow::return_type(program, &key.seq, index)?,
            None => program.types().void(),
        };

        let class = self.placement(program, candidate);
        let name = format!("{OUTLINE_PREFIX}{}", self.counter);
        self.counter += 1;

        let id = self.emit(program, class, &name, key, &live_ins, param_types, return_type);
        debug!(
            "synthesized {} ({} insns, {} params, {} occurrences)",
            program.qualified_name(id),
            key.seq.len(),
            live_ins.len(),
            candidate.occurrences.len()
        );
        Some(id)
    }

    /// The class receiving the synthesized method: the shared declaring
    /// class when all occurrences agree, otherwise the helper class.
    fn placement(&self, program: &mut Program, candidate: &Candidate) -> ClassId {
        let mut shared: Option<ClassId> = None;
        for occurrence in &candidate.occurrences {
            let class = program.method(occurrence.method).class();
            match shared {
                None => shared = Some(class),
                Some(existing) if existing == class => {}
                Some(_) => return helper_class(program),
            }
        }
        shared.unwrap_or_else(|| helper_class(program))
    }

    fn emit(
        &self,
        program: &mut Program,
        class: ClassId,
        name: &str,
        key: &CandidateKey,
        live_ins: &[u16],
        param_types: Vec<TypeId>,
        return_type: TypeId,
    ) -> MethodId {
        let body = BasicBlock::new(
            key.seq.insns().to_vec(),
            Terminator::Return {
                src: key.live_out.map(Reg),
            },
            Vec::new(),
        );
        let proto = program.intern_proto(return_type, param_types);
        let params: Vec<Reg> = live_ins.iter().map(|&index| Reg(index)).collect();
        program.add_method(Method::new(
            name.to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC | MethodFlags::SYNTHETIC,
            proto,
            key.seq.reg_count(),
            params,
            vec![body],
        ))
    }
}

/// The shared helper class, created on first demand.
fn helper_class(program: &mut Program) -> ClassId {
    if let Some(id) = program.find_class(HELPER_CLASS) {
        return id;
    }
    let object = program.types().object();
    program
        .add_class(
            HELPER_CLASS,
            object,
            ClassFlags::PUBLIC | ClassFlags::FINAL | ClassFlags::SYNTHETIC,
        )
        .unwrap_or_else(|_| unreachable!("descriptor checked above"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build::ProgramBuilder;
    use crate::outliner::candidates::{Occurrence, RunLoc};
    use crate::outliner::canon::canonicalize;
    use crate::ir::{BlockId, Insn};

    fn candidate_for(
        insns: &[Insn],
        live_out: Option<u16>,
        methods: &[MethodId],
    ) -> Candidate {
        let seq = canonicalize(insns);
        Candidate {
            key: CandidateKey { seq, live_out },
            occurrences: methods
                .iter()
                .map(|&method| Occurrence {
                    method,
                    loc: RunLoc {
                        head: BlockId(0),
                        start: 0,
                        len: insns.len(),
                    },
                })
                .collect(),
            score: 1,
            weighted_score: 1.0,
        }
    }

    fn two_method_program() -> (Program, Vec<MethodId>, crate::ir::MethodRefId) {
        let mut builder = ProgramBuilder::new();
        let string = builder.string_type();
        let void = builder.void_type();
        let printer = builder.reference_type("Lio/Printer;");
        let println = builder.extern_method(printer, "println", void, &[string]);
        let mut class = builder.class("LMain;").unwrap();
        let mut ids = Vec::new();
        for name in ["a", "b"] {
            ids.push(
                class
                    .method(name)
                    .block(|b| {
                        b.const_string(Reg(0), "x");
                        b.invoke_static(println, &[Reg(0)]);
                        b.ret();
                    })
                    .build()
                    .unwrap(),
            );
        }
        (builder.build().unwrap(), ids, println)
    }

    #[test]
    fn test_void_method_lands_in_shared_class() {
        let (mut program, ids, println) = two_method_program();
        let insns = vec![
            Insn::ConstString {
                dest: Reg(0),
                value: {
                    // reuse the interned literal from method bodies
                    let Insn::ConstString { value, .. } =
                        &program.method(ids[0]).block(BlockId(0)).insns()[0]
                    else {
                        panic!("expected const-string");
                    };
                    *value
                },
            },
            Insn::Invoke {
                kind: crate::ir::InvokeKind::Static,
                method: println,
                args: vec![Reg(0)],
            },
        ];
        let candidate = candidate_for(&insns, None, &ids);

        let mut context = SynthesisContext::new(&program);
        let id = context.synthesize(&mut program, &candidate).unwrap();

        let method = program.method(id);
        assert_eq!(method.name(), "$outline$0");
        assert!(method.flags().contains(MethodFlags::SYNTHETIC));
        assert!(method.is_static());
        assert_eq!(method.class(), program.method(ids[0]).class());
        assert_eq!(program.proto(method.proto()).return_type, program.types().void());
        assert!(program.proto(method.proto()).params.is_empty());
        assert!(program.find_class(HELPER_CLASS).is_none());
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_cross_class_candidate_uses_helper() {
        let mut builder = ProgramBuilder::new();
        let int = builder.int_type();
        let mut ids = Vec::new();
        for descriptor in ["LA;", "LB;"] {
            let mut class = builder.class(descriptor).unwrap();
            ids.push(
                class
                    .method("f")
                    .returns(int)
                    .block(|b| {
                        b.const_int(Reg(0), 1);
                        b.binop_lit(crate::ir::BinaryOp::Add, Reg(1), Reg(0), 2);
                        b.ret_val(Reg(1));
                    })
                    .build()
                    .unwrap(),
            );
        }
        let mut program = builder.build().unwrap();

        let insns: Vec<Insn> = program.method(ids[0]).block(BlockId(0)).insns().to_vec();
        // canonical: c0 = const, c1 = c0 + 2; live-out c1
        let candidate = candidate_for(&insns, Some(1), &ids);

        let mut context = SynthesisContext::new(&program);
        let id = context.synthesize(&mut program, &candidate).unwrap();

        let helper = program.find_class(HELPER_CLASS).expect("helper created");
        assert_eq!(program.method(id).class(), helper);
        assert_eq!(
            program.proto(program.method(id).proto()).return_type,
            program.types().int()
        );
        assert!(program.validate().is_ok());

        // A second cross-class synthesis reuses the helper.
        let again = candidate_for(&insns, Some(1), &ids);
        context.synthesize(&mut program, &again).unwrap();
        assert_eq!(program.find_class(HELPER_CLASS), Some(helper));
    }

    #[test]
    fn test_name_counter_resumes_past_existing_outlines() {
        let (mut program, ids, println) = two_method_program();
        let value = {
            let Insn::ConstString { value, .. } =
                &program.method(ids[0]).block(BlockId(0)).insns()[0]
            else {
                panic!("expected const-string");
            };
            *value
        };
        let insns = vec![
            Insn::ConstString {
                dest: Reg(0),
                value,
            },
            Insn::Invoke {
                kind: crate::ir::InvokeKind::Static,
                method: println,
                args: vec![Reg(0)],
            },
        ];

        let mut first = SynthesisContext::new(&program);
        let candidate = candidate_for(&insns, None, &ids);
        first.synthesize(&mut program, &candidate).unwrap();

        let mut second = SynthesisContext::new(&program);
        let candidate = candidate_for(&insns, None, &ids);
        let id = second.synthesize(&mut program, &candidate).unwrap();
        assert_eq!(program.method(id).name(), "$outline$1");
    }

    #[test]
    fn test_inexpressible_contract_is_skipped() {
        let (mut program, ids, _) = two_method_program();
        // A bare move gives its live-in no demand.
        let insns = vec![
            Insn::Move {
                dest: Reg(1),
                src: Reg(0),
            },
            Insn::Move {
                dest: Reg(2),
                src: Reg(1),
            },
        ];
        let candidate = candidate_for(&insns, None, &ids);
        let before = program.method_count();

        let mut context = SynthesisContext::new(&program);
        assert!(context.synthesize(&mut program, &candidate).is_none());
        assert_eq!(program.method_count(), before);
    }
}
