//! Dataflow contracts of candidate instruction runs.
//!
//! A run can only become a method if it has a clean boundary: its live-in
//! registers (read before defined, in canonical first-appearance order)
//! become parameters, its at-most-one live-out register (defined in the
//! run and read after it) becomes the return value, and none of its
//! definitions may be observed by a catch handler — outlining collapses
//! the original multi-block region into one call/return boundary, so a
//! handler expecting a partially-computed value at the point of an in-run
//! exception could no longer see it.
//!
//! Everything here marks failures by returning `None` or [`LiveOut::Many`];
//! an ineligible run is silently dropped, never an error.

use crate::analysis::Liveness;
use crate::ir::{BlockId, Insn, Method, Program, Reg, TypeId};

use super::canon::CanonicalSequence;
use super::demand;

/// Outcome of the single-live-out rule for one concrete window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiveOut {
    /// No definition of the run survives it; the outlined method is void.
    None,
    /// Exactly one definition is read after the run.
    One(Reg),
    /// Two or more definitions are read after the run; no single-value
    /// return can carry them, the run is ineligible.
    Many,
}

/// The distinct registers a window defines, in definition order.
pub(crate) fn window_defs(insns: &[Insn]) -> Vec<Reg> {
    let mut defs = Vec::new();
    for insn in insns {
        if let Some(def) = insn.def() {
            if !defs.contains(&def) {
                defs.push(def);
            }
        }
    }
    defs
}

/// Applies the single-live-out rule at the window's end boundary.
///
/// `end` is the position of the window's last instruction. The live-out
/// set is the liveness at the boundary just after it, intersected with the
/// window's definitions.
pub(crate) fn live_out_of(
    method: &Method,
    liveness: &Liveness,
    end: (BlockId, usize),
    defs: &[Reg],
) -> LiveOut {
    let live = liveness.live_after(method, end.0, end.1);
    let mut found = None;
    for &def in defs {
        if live.contains(def.index()) {
            if found.is_some() {
                return LiveOut::Many;
            }
            found = Some(def);
        }
    }
    match found {
        Some(reg) => LiveOut::One(reg),
        None => LiveOut::None,
    }
}

/// Returns `true` if any window definition is live into a catch handler of
/// a covered block.
pub(crate) fn escapes_to_catch(
    method: &Method,
    liveness: &Liveness,
    covered: &[BlockId],
    defs: &[Reg],
) -> bool {
    covered.iter().any(|&block| {
        method.block(block).catches().iter().any(|edge| {
            let handler_live = liveness.block_live_in(edge.handler);
            defs.iter().any(|def| handler_live.contains(def.index()))
        })
    })
}

/// Infers the parameter types of a canonical sequence, one per live-in in
/// canonical order.
///
/// Each live-in's consumers up to its first redefinition contribute
/// demands ([`demand::demands_of`]); the folded join is the declared
/// parameter type. Returns `None` when any live-in is unconstrained or its
/// demands have no common expressible type.
pub(crate) fn param_types(program: &Program, seq: &CanonicalSequence) -> Option<Vec<TypeId>> {
    seq.live_ins()
        .into_iter()
        .map(|index| {
            let reg = Reg(index);
            let mut demands = Vec::new();
            for insn in seq.insns() {
                demand::demands_of(program, insn, reg, &mut demands);
                if insn.def() == Some(reg) {
                    break;
                }
            }
            demand::fold_demands(program, &demands)
        })
        .collect()
}

/// Derives the return type of a sequence from its live-out register by
/// forward type tracking through the run.
///
/// Constants, allocations, field reads, invoke results and arithmetic all
/// pin a type; moves propagate known types; `check-cast` refines. Returns
/// `None` when the live-out's last definition leaves no derivable type.
pub(crate) fn return_type(
    program: &Program,
    seq: &CanonicalSequence,
    live_out: u16,
) -> Option<TypeId> {
    let types = program.types();
    let int = types.int();
    let boolean = types.primitive(crate::ir::PrimitiveType::Boolean);
    let mut known: std::collections::HashMap<Reg, TypeId> = std::collections::HashMap::new();

    for (index, insn) in seq.insns().iter().enumerate() {
        match insn {
            Insn::ConstInt { dest, .. } => {
                known.insert(*dest, int);
            }
            Insn::ConstString { dest, .. } => {
                known.insert(*dest, types.string());
            }
            Insn::ConstClass { dest, .. } => {
                known.insert(*dest, types.class());
            }
            Insn::Move { dest, src } => match known.get(src).copied() {
                Some(ty) => {
                    known.insert(*dest, ty);
                }
                None => {
                    known.remove(dest);
                }
            },
            Insn::MoveResult { dest } => {
                // The validator guarantees the preceding instruction is
                // the feeding invoke.
                let ty = match seq.insns().get(index.wrapping_sub(1)) {
                    Some(Insn::Invoke { method, .. }) => {
                        let mref = program.method_ref(*method);
                        Some(program.proto(mref.proto).return_type)
                    }
                    _ => None,
                };
                match ty {
                    Some(ty) => {
                        known.insert(*dest, ty);
                    }
                    None => {
                        known.remove(dest);
                    }
                }
            }
            Insn::CheckCast { reg, class } => {
                known.insert(*reg, *class);
            }
            Insn::InstanceOf { dest, .. } => {
                known.insert(*dest, boolean);
            }
            Insn::NewInstance { dest, class } => {
                known.insert(*dest, *class);
            }
            Insn::InstanceGet { dest, field, .. } | Insn::StaticGet { dest, field } => {
                known.insert(*dest, program.field_ref(*field).field_type);
            }
            Insn::UnaryOp { dest, .. }
            | Insn::BinaryOp { dest, .. }
            | Insn::BinaryOpLit { dest, .. } => {
                known.insert(*dest, int);
            }
            Insn::Invoke { .. } | Insn::InstancePut { .. } | Insn::StaticPut { .. } => {}
        }
    }

    known.get(&Reg(live_out)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::big_blocks;
    use crate::ir::build::ProgramBuilder;
    use crate::ir::BinaryOp;
    use crate::outliner::canon::canonicalize;

    #[test]
    fn test_single_live_out_detected() {
        let mut builder = ProgramBuilder::new();
        let int = builder.int_type();
        let mut class = builder.class("LMain;").unwrap();
        let id = class
            .method("f")
            .returns(int)
            .block(|b| {
                b.const_int(Reg(0), 1);
                b.const_int(Reg(1), 2);
                b.binop(BinaryOp::Add, Reg(2), Reg(0), Reg(1));
                b.ret_val(Reg(2));
            })
            .build()
            .unwrap();
        let program = builder.build().unwrap();
        let method = program.method(id);
        let liveness = Liveness::compute(method);

        let insns = method.block(method.entry()).insns();
        let defs = window_defs(insns);
        assert_eq!(defs, vec![Reg(0), Reg(1), Reg(2)]);
        assert_eq!(
            live_out_of(method, &liveness, (method.entry(), 2), &defs),
            LiveOut::One(Reg(2))
        );
        // The two-instruction prefix leaves both constants live.
        assert_eq!(
            live_out_of(method, &liveness, (method.entry(), 1), &defs[..2]),
            LiveOut::Many
        );
    }

    #[test]
    fn test_escape_to_catch_detected() {
        let mut builder = ProgramBuilder::new();
        let int = builder.int_type();
        let mut class = builder.class("LMain;").unwrap();
        let id = class
            .method("guarded")
            .returns(int)
            .block(|b| {
                b.const_int(Reg(0), 3);
                b.const_int(Reg(1), 4);
                b.catch_(None, 1);
                b.goto_(2);
            })
            .block(|b| {
                // handler observes v0
                b.ret_val(Reg(0));
            })
            .block(|b| {
                b.ret_val(Reg(1));
            })
            .build()
            .unwrap();
        let program = builder.build().unwrap();
        let method = program.method(id);
        let liveness = Liveness::compute(method);

        let covered = [method.entry()];
        assert!(escapes_to_catch(method, &liveness, &covered, &[Reg(0)]));
        assert!(!escapes_to_catch(method, &liveness, &covered, &[Reg(1)]));
    }

    #[test]
    fn test_param_types_weakened_by_cast_only_use() {
        let mut builder = ProgramBuilder::new();
        let narrow = builder.reference_type("La/Narrow;");
        let string = builder.string_type();
        let void = builder.void_type();
        let printer = builder.reference_type("Lio/Printer;");
        let println = builder.extern_method(printer, "println", void, &[string]);
        let mut class = builder.class("LMain;").unwrap();
        class
            .method("casts")
            .block(|b| {
                b.check_cast(Reg(0), narrow);
                b.const_int(Reg(1), 0);
                b.ret();
            })
            .build()
            .unwrap();
        let program = builder.build().unwrap();

        // cast-only consumer: parameter weakens to java.lang.Object
        let cast_run = canonicalize(&[
            Insn::CheckCast {
                reg: Reg(0),
                class: narrow,
            },
            Insn::ConstInt {
                dest: Reg(1),
                value: 0,
            },
        ]);
        assert_eq!(
            param_types(&program, &cast_run),
            Some(vec![program.types().object()])
        );

        // string-consuming call: parameter stays java.lang.String
        let call_run = canonicalize(&[Insn::Invoke {
            kind: crate::ir::InvokeKind::Static,
            method: println,
            args: vec![Reg(0)],
        }]);
        assert_eq!(
            param_types(&program, &call_run),
            Some(vec![program.types().string()])
        );

        // move-only consumer: no expressible demand
        let move_run = canonicalize(&[Insn::Move {
            dest: Reg(1),
            src: Reg(0),
        }]);
        assert_eq!(param_types(&program, &move_run), None);
    }

    #[test]
    fn test_return_type_tracked_through_run() {
        let mut builder = ProgramBuilder::new();
        let int = builder.int_type();
        let object = builder.object_type();
        let source = builder.extern_method(object, "next", int, &[]);
        let mut class = builder.class("LMain;").unwrap();
        class
            .method("placeholder")
            .block(|b| {
                b.ret();
            })
            .build()
            .unwrap();
        let program = builder.build().unwrap();

        let seq = canonicalize(&[
            Insn::Invoke {
                kind: crate::ir::InvokeKind::Static,
                method: source,
                args: Vec::new(),
            },
            Insn::MoveResult { dest: Reg(0) },
            Insn::BinaryOpLit {
                op: BinaryOp::Add,
                dest: Reg(1),
                src: Reg(0),
                literal: 1,
            },
        ]);
        assert_eq!(return_type(&program, &seq, 0), Some(int));
        assert_eq!(return_type(&program, &seq, 1), Some(int));
    }

    #[test]
    fn test_window_positions_match_big_block_stream() {
        let mut builder = ProgramBuilder::new();
        let mut class = builder.class("LMain;").unwrap();
        let id = class
            .method("chain")
            .block(|b| {
                b.const_int(Reg(0), 1);
                b.goto_(1);
            })
            .block(|b| {
                b.const_int(Reg(1), 2);
                b.ret();
            })
            .build()
            .unwrap();
        let program = builder.build().unwrap();
        let method = program.method(id);
        let bbs = big_blocks(method);
        assert_eq!(bbs[0].positions(method).len(), 2);
        assert_eq!(window_defs(&bbs[0].insns(method).cloned().collect::<Vec<_>>()).len(), 2);
    }
}
