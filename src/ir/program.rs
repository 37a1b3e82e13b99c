//! The whole-program container: classes, methods and interning tables.
//!
//! [`Program`] is the unit a pass operates on. It owns the class and method
//! arenas together with the [`TypeTable`] and [`RefPool`] all instructions
//! index into. Passes mutate it in place; ownership stays with the host
//! across the entire pipeline.

use std::collections::HashMap;

use super::block::BlockId;
use super::class::{Class, ClassFlags, ClassId};
use super::method::{Method, MethodId};
use super::refs::{FieldRef, FieldRefId, MethodRef, MethodRefId, Proto, ProtoId, RefPool, StringId};
use super::types::{TypeId, TypeTable};
use crate::Result;

/// A complete program: classes, methods, types and symbol pools.
///
/// # Examples
///
/// ```rust
/// use dexoutline::ir::build::ProgramBuilder;
///
/// let mut builder = ProgramBuilder::new();
/// builder.class("LMain;").unwrap();
/// let program = builder.build().unwrap();
/// assert!(program.find_class("LMain;").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Program {
    types: TypeTable,
    refs: RefPool,
    classes: Vec<Class>,
    methods: Vec<Method>,
    class_by_type: HashMap<TypeId, ClassId>,
}

impl Program {
    /// Creates an empty program with the well-known types registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: TypeTable::new(),
            refs: RefPool::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            class_by_type: HashMap::new(),
        }
    }

    /// The type table.
    #[must_use]
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Mutable access to the type table.
    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    // ------------------------------------------------------------------
    // Symbol pools
    // ------------------------------------------------------------------

    /// Interns a string literal.
    pub fn intern_string(&mut self, value: &str) -> StringId {
        self.refs.intern_string(value)
    }

    /// Returns an interned string.
    #[must_use]
    pub fn string(&self, id: StringId) -> &str {
        self.refs.string(id)
    }

    /// Interns a prototype.
    pub fn intern_proto(&mut self, return_type: TypeId, params: Vec<TypeId>) -> ProtoId {
        self.refs.intern_proto(return_type, params)
    }

    /// Returns an interned prototype.
    #[must_use]
    pub fn proto(&self, id: ProtoId) -> &Proto {
        self.refs.proto(id)
    }

    /// Interns a method reference.
    pub fn intern_method_ref(&mut self, owner: TypeId, name: &str, proto: ProtoId) -> MethodRefId {
        self.refs.intern_method_ref(owner, name, proto)
    }

    /// Returns an interned method reference.
    #[must_use]
    pub fn method_ref(&self, id: MethodRefId) -> &MethodRef {
        self.refs.method_ref(id)
    }

    /// Interns a field reference.
    pub fn intern_field_ref(
        &mut self,
        owner: TypeId,
        name: &str,
        field_type: TypeId,
    ) -> FieldRefId {
        self.refs.intern_field_ref(owner, name, field_type)
    }

    /// Returns an interned field reference.
    #[must_use]
    pub fn field_ref(&self, id: FieldRefId) -> &FieldRef {
        self.refs.field_ref(id)
    }

    // ------------------------------------------------------------------
    // Classes and methods
    // ------------------------------------------------------------------

    /// Registers a new class under `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateClass`] if a class with this
    /// descriptor already exists.
    pub fn add_class(
        &mut self,
        descriptor: &str,
        super_type: TypeId,
        flags: ClassFlags,
    ) -> Result<ClassId> {
        let type_id = self.types.intern_reference(descriptor, super_type);
        if self.class_by_type.contains_key(&type_id) {
            return Err(crate::Error::DuplicateClass(descriptor.to_string()));
        }
        let id = ClassId(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        self.classes.push(Class::new(type_id, super_type, flags));
        self.class_by_type.insert(type_id, id);
        Ok(id)
    }

    /// Returns a class by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    /// All classes in registration order.
    #[must_use]
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Iterator over all class ids.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(|i| ClassId(i as u32))
    }

    /// Finds a class by descriptor.
    #[must_use]
    pub fn find_class(&self, descriptor: &str) -> Option<ClassId> {
        let type_id = self.types.lookup(descriptor)?;
        self.class_by_type.get(&type_id).copied()
    }

    /// Returns the class declaring `type_id`, if the type is a program class.
    #[must_use]
    pub fn class_of_type(&self, type_id: TypeId) -> Option<ClassId> {
        self.class_by_type.get(&type_id).copied()
    }

    /// Appends a method to the arena and to its class's member list.
    pub fn add_method(&mut self, method: Method) -> MethodId {
        let id = MethodId(u32::try_from(self.methods.len()).unwrap_or(u32::MAX));
        let class = method.class();
        self.methods.push(method);
        self.classes[class.index()].push_method(id);
        id
    }

    /// Returns a method by id.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    /// Returns a method mutably.
    pub fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.methods[id.index()]
    }

    /// Number of methods in the arena.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Iterator over all method ids in arena order.
    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> {
        (0..self.methods.len()).map(|i| MethodId(i as u32))
    }

    /// Finds a method by class descriptor and name.
    ///
    /// Returns the first member with a matching name; overloads are not
    /// distinguished.
    #[must_use]
    pub fn find_method(&self, class_descriptor: &str, name: &str) -> Option<MethodId> {
        let class = self.find_class(class_descriptor)?;
        self.classes[class.index()]
            .methods()
            .iter()
            .copied()
            .find(|&id| self.method(id).name() == name)
    }

    /// Returns `Lcls;.name`, the fully qualified method name.
    ///
    /// Keys of the outliner's optional profile-weight map use this form.
    #[must_use]
    pub fn qualified_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        let class = self.class(method.class());
        format!("{}.{}", self.types.descriptor(class.type_id()), method.name())
    }

    /// Resolves a method reference to a program method, if the owner is a
    /// program class with a member of that name and prototype.
    #[must_use]
    pub fn resolve_method_ref(&self, id: MethodRefId) -> Option<MethodId> {
        let mref = self.refs.method_ref(id);
        let class = self.class_of_type(mref.owner)?;
        self.classes[class.index()]
            .methods()
            .iter()
            .copied()
            .find(|&m| {
                let method = self.method(m);
                method.name() == mref.name && method.proto() == mref.proto
            })
    }

    /// Builds a method reference invoking a program method.
    pub fn method_ref_for(&mut self, id: MethodId) -> MethodRefId {
        let method = self.method(id);
        let owner = self.classes[method.class().index()].type_id();
        let name = method.name().to_string();
        let proto = method.proto();
        self.refs.intern_method_ref(owner, &name, proto)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validates every method graph in the program.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedGraph`] describing the first
    /// violation found: a dangling block target, an out-of-range register,
    /// or a `move-result` that does not directly follow an invoke.
    pub fn validate(&self) -> Result<()> {
        for id in self.method_ids() {
            self.validate_method(id)?;
        }
        Ok(())
    }

    fn validate_method(&self, id: MethodId) -> Result<()> {
        let method = self.method(id);
        let name = self.qualified_name(id);
        let block_count = method.block_count();
        let registers = method.registers();

        let check_reg = |reg: super::insn::Reg, what: &str, block: BlockId| -> Result<()> {
            if reg.0 >= registers {
                return Err(malformed_error!(
                    "{}: {} {} out of range in {} (frame has {} registers)",
                    name,
                    what,
                    reg,
                    block,
                    registers
                ));
            }
            Ok(())
        };

        for param in method.params() {
            check_reg(*param, "parameter register", method.entry())?;
        }

        for block_id in method.block_ids() {
            let block = method.block(block_id);

            for target in block.terminator().targets() {
                if target.index() >= block_count {
                    return Err(malformed_error!(
                        "{}: terminator of {} targets missing block {}",
                        name,
                        block_id,
                        target
                    ));
                }
            }
            for edge in block.catches() {
                if edge.handler.index() >= block_count {
                    return Err(malformed_error!(
                        "{name}: catch edge of {block_id} targets missing block {}",
                        edge.handler
                    ));
                }
            }

            for (index, insn) in block.insns().iter().enumerate() {
                for reg in insn.uses() {
                    check_reg(reg, "use of", block_id)?;
                }
                if let Some(def) = insn.def() {
                    check_reg(def, "definition of", block_id)?;
                }
                if insn.is_move_result() {
                    let paired = index > 0 && block.insns()[index - 1].is_invoke();
                    if !paired {
                        return Err(malformed_error!(
                            "{}: move-result at {}[{}] does not follow an invoke",
                            name,
                            block_id,
                            index
                        ));
                    }
                }
            }
            for reg in block.terminator().uses() {
                check_reg(reg, "terminator use of", block_id)?;
            }
        }
        Ok(())
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, Insn, InvokeKind, MethodFlags, Reg, Terminator};

    fn empty_method(program: &mut Program, class: ClassId, name: &str) -> MethodId {
        let proto = program.intern_proto(program.types().void(), Vec::new());
        program.add_method(Method::new(
            name.to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC,
            proto,
            2,
            Vec::new(),
            vec![BasicBlock::new(
                Vec::new(),
                Terminator::Return { src: None },
                Vec::new(),
            )],
        ))
    }

    #[test]
    fn test_duplicate_class_detected() {
        let mut program = Program::new();
        let object = program.types().object();
        program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        assert!(matches!(
            program.add_class("LFoo;", object, ClassFlags::PUBLIC),
            Err(crate::Error::DuplicateClass(_))
        ));
    }

    #[test]
    fn test_find_and_qualified_name() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let id = empty_method(&mut program, class, "run");

        assert_eq!(program.find_method("LFoo;", "run"), Some(id));
        assert_eq!(program.qualified_name(id), "LFoo;.run");
        assert!(program.find_method("LFoo;", "missing").is_none());
    }

    #[test]
    fn test_resolve_method_ref_round_trip() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let id = empty_method(&mut program, class, "run");

        let mref = program.method_ref_for(id);
        assert_eq!(program.resolve_method_ref(mref), Some(id));

        // An external reference does not resolve.
        let external_owner = {
            let obj = program.types().object();
            program.types_mut().intern_reference("Lext/Lib;", obj)
        };
        let proto = program.intern_proto(program.types().void(), Vec::new());
        let ext = program.intern_method_ref(external_owner, "run", proto);
        assert_eq!(program.resolve_method_ref(ext), None);
    }

    #[test]
    fn test_validate_rejects_dangling_target() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let proto = program.intern_proto(program.types().void(), Vec::new());
        program.add_method(Method::new(
            "bad".to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC,
            proto,
            1,
            Vec::new(),
            vec![BasicBlock::new(
                Vec::new(),
                Terminator::Goto {
                    target: BlockId(9),
                },
                Vec::new(),
            )],
        ));
        assert!(matches!(
            program.validate(),
            Err(crate::Error::MalformedGraph { .. })
        ));
    }

    #[test]
    fn test_validate_names_the_offending_register() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let proto = program.intern_proto(program.types().void(), Vec::new());
        program.add_method(Method::new(
            "bad".to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC,
            proto,
            1,
            Vec::new(),
            vec![BasicBlock::new(
                vec![Insn::ConstInt {
                    dest: Reg(9),
                    value: 0,
                }],
                Terminator::Return { src: None },
                Vec::new(),
            )],
        ));

        let message = program.validate().unwrap_err().to_string();
        assert!(message.contains("LFoo;.bad"), "{message}");
        assert!(message.contains("v9"), "{message}");
    }

    #[test]
    fn test_validate_rejects_unpaired_move_result() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let proto = program.intern_proto(program.types().void(), Vec::new());
        program.add_method(Method::new(
            "bad".to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC,
            proto,
            2,
            Vec::new(),
            vec![BasicBlock::new(
                vec![Insn::MoveResult { dest: Reg(0) }],
                Terminator::Return { src: None },
                Vec::new(),
            )],
        ));
        assert!(matches!(
            program.validate(),
            Err(crate::Error::MalformedGraph { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_paired_move_result() {
        let mut program = Program::new();
        let object = program.types().object();
        let class = program
            .add_class("LFoo;", object, ClassFlags::PUBLIC)
            .unwrap();
        let int = program.types().int();
        let callee_proto = program.intern_proto(int, Vec::new());
        let mref = program.intern_method_ref(object, "next", callee_proto);
        let proto = program.intern_proto(program.types().void(), Vec::new());
        program.add_method(Method::new(
            "good".to_string(),
            class,
            MethodFlags::PUBLIC | MethodFlags::STATIC,
            proto,
            2,
            Vec::new(),
            vec![BasicBlock::new(
                vec![
                    Insn::Invoke {
                        kind: InvokeKind::Static,
                        method: mref,
                        args: Vec::new(),
                    },
                    Insn::MoveResult { dest: Reg(1) },
                ],
                Terminator::Return { src: None },
                Vec::new(),
            )],
        ));
        assert!(program.validate().is_ok());
    }
}
