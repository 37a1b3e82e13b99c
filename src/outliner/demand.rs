//! Per-instruction type demands for live-in registers.
//!
//! Every instruction that consumes a live-in register imposes a minimal
//! sufficient type on it: a `check-cast` accepts any object reference
//! regardless of the cast's target, a virtual call needs something
//! assignable to the invoked method's declared receiver, a field write
//! needs the field's declared type, arithmetic needs `int`. The parameter
//! type of an outlined method is the *weakest* type satisfying all of its
//! consumers — not the most specific type the value happens to have at any
//! call site.
//!
//! Demand computation is an exhaustive match over the closed instruction
//! enum, one minimal-requirement rule per instruction category; a new
//! variant fails to compile here until it states its demands.

use crate::ir::{Insn, Program, Reg, TypeId, TypeKind};

/// Appends the demands `insn` imposes on `reg` to `out`.
///
/// A register may occupy several operand positions of one instruction
/// (`add v1, v0, v0`); every position contributes its own demand. Positions
/// that constrain nothing (plain `move`, `instance-of` sources,
/// `check-cast` beyond being a reference) contribute the weakest
/// expressible demand for their domain or nothing at all.
pub(crate) fn demands_of(program: &Program, insn: &Insn, reg: Reg, out: &mut Vec<TypeId>) {
    let types = program.types();
    let int = types.int();
    let object = types.object();
    match insn {
        // Definitions only; no reads to constrain.
        Insn::ConstInt { .. }
        | Insn::ConstString { .. }
        | Insn::ConstClass { .. }
        | Insn::MoveResult { .. }
        | Insn::NewInstance { .. }
        | Insn::StaticGet { .. } => {}

        // A move constrains nothing; the demand comes from wherever the
        // copy is consumed. Within a run that consumer may be absent, in
        // which case the live-in stays demand-free and the run is dropped.
        Insn::Move { .. } => {}

        // Reference checks only need a generic object reference,
        // independent of the tested-against type.
        Insn::CheckCast { reg: checked, .. } => {
            if *checked == reg {
                out.push(object);
            }
        }
        Insn::InstanceOf { src, .. } => {
            if *src == reg {
                out.push(object);
            }
        }

        // Arguments demand the invoked method's declared types; for
        // instance dispatch the receiver demands the declaring type.
        Insn::Invoke { kind, method, args } => {
            let mref = program.method_ref(*method);
            let proto = program.proto(mref.proto);
            let has_receiver = matches!(
                kind,
                crate::ir::InvokeKind::Virtual | crate::ir::InvokeKind::Direct
            );
            for (position, arg) in args.iter().enumerate() {
                if *arg != reg {
                    continue;
                }
                if has_receiver && position == 0 {
                    out.push(mref.owner);
                } else {
                    let param = if has_receiver { position - 1 } else { position };
                    if let Some(&ty) = proto.params.get(param) {
                        out.push(ty);
                    }
                }
            }
        }

        // Field accesses demand the declaring type for the object and the
        // declared field type for the value.
        Insn::InstanceGet { object: obj, field, .. } => {
            if *obj == reg {
                out.push(program.field_ref(*field).owner);
            }
        }
        Insn::InstancePut { src, object: obj, field } => {
            let fref = program.field_ref(*field);
            if *src == reg {
                out.push(fref.field_type);
            }
            if *obj == reg {
                out.push(fref.owner);
            }
        }
        Insn::StaticPut { src, field } => {
            if *src == reg {
                out.push(program.field_ref(*field).field_type);
            }
        }

        // Arithmetic is defined over int registers.
        Insn::UnaryOp { src, .. } | Insn::BinaryOpLit { src, .. } => {
            if *src == reg {
                out.push(int);
            }
        }
        Insn::BinaryOp { lhs, rhs, .. } => {
            if *lhs == reg {
                out.push(int);
            }
            if *rhs == reg {
                out.push(int);
            }
        }
    }
}

/// Joins two demands into the weakest type satisfying both.
///
/// Equal demands join to themselves; primitives must agree exactly; for
/// reference types the narrower demand wins when one is assignable to the
/// other, since anything acceptable to the narrower consumer also
/// satisfies the wider one. Unrelated reference demands (and any future
/// interface or array joins) return `None`, marking the occurrence
/// inexpressible; that is the documented extension point for a richer join.
#[must_use]
pub(crate) fn join(program: &Program, a: TypeId, b: TypeId) -> Option<TypeId> {
    if a == b {
        return Some(a);
    }
    let types = program.types();
    match (types.kind(a), types.kind(b)) {
        (TypeKind::Reference, TypeKind::Reference) => {
            if types.is_assignable(a, b) {
                Some(a)
            } else if types.is_assignable(b, a) {
                Some(b)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Folds all demands of one live-in into a parameter type.
///
/// Returns `None` when the demands conflict or when no instruction
/// constrained the register at all; either way the run cannot carry the
/// register as a typed parameter and is dropped.
#[must_use]
pub(crate) fn fold_demands(program: &Program, demands: &[TypeId]) -> Option<TypeId> {
    let mut iter = demands.iter().copied();
    let first = iter.next()?;
    iter.try_fold(first, |acc, demand| join(program, acc, demand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InvokeKind, Program};

    fn demands_for(program: &Program, insn: &Insn, reg: Reg) -> Vec<TypeId> {
        let mut out = Vec::new();
        demands_of(program, insn, reg, &mut out);
        out
    }

    #[test]
    fn test_cast_demands_generic_object() {
        let mut program = Program::new();
        let object = program.types().object();
        let narrow = {
            let obj = program.types().object();
            program.types_mut().intern_reference("La/Narrow;", obj)
        };
        let insn = Insn::CheckCast {
            reg: Reg(0),
            class: narrow,
        };
        assert_eq!(demands_for(&program, &insn, Reg(0)), vec![object]);
    }

    #[test]
    fn test_virtual_receiver_demands_declared_type() {
        let mut program = Program::new();
        let object = program.types().object();
        let string = program.types().string();
        let stream = program.types_mut().intern_reference("Lio/Stream;", object);
        let void = program.types().void();
        let proto = program.intern_proto(void, vec![string]);
        let println = program.intern_method_ref(stream, "println", proto);

        let insn = Insn::Invoke {
            kind: InvokeKind::Virtual,
            method: println,
            args: vec![Reg(4), Reg(7)],
        };
        assert_eq!(demands_for(&program, &insn, Reg(4)), vec![stream]);
        assert_eq!(demands_for(&program, &insn, Reg(7)), vec![string]);
    }

    #[test]
    fn test_field_and_arithmetic_demands() {
        let mut program = Program::new();
        let object = program.types().object();
        let int = program.types().int();
        let owner = program.types_mut().intern_reference("La/Holder;", object);
        let field = program.intern_field_ref(owner, "count", int);

        let put = Insn::InstancePut {
            src: Reg(1),
            object: Reg(2),
            field,
        };
        assert_eq!(demands_for(&program, &put, Reg(1)), vec![int]);
        assert_eq!(demands_for(&program, &put, Reg(2)), vec![owner]);

        let shared = Insn::BinaryOp {
            op: crate::ir::BinaryOp::Add,
            dest: Reg(0),
            lhs: Reg(3),
            rhs: Reg(3),
        };
        assert_eq!(demands_for(&program, &shared, Reg(3)), vec![int, int]);
    }

    #[test]
    fn test_join_narrows_along_supertype_chain() {
        let mut program = Program::new();
        let object = program.types().object();
        let string = program.types().string();
        let int = program.types().int();

        assert_eq!(join(&program, string, object), Some(string));
        assert_eq!(join(&program, object, string), Some(string));
        assert_eq!(join(&program, int, int), Some(int));
        assert_eq!(join(&program, int, program.types().object()), None);

        let a = program.types_mut().intern_reference("La/A;", object);
        assert_eq!(join(&program, a, string), None, "unrelated references");
    }

    #[test]
    fn test_fold_requires_a_constraining_use() {
        let program = Program::new();
        assert_eq!(fold_demands(&program, &[]), None);
        let object = program.types().object();
        let string = program.types().string();
        assert_eq!(fold_demands(&program, &[object, string, object]), Some(string));
    }
}
