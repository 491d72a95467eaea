//! Construction API for IR modules and functions.
//!
//! [`FunctionBuilder`] keeps an insertion point like an LLVM `IRBuilder`:
//! instructions go to the end of the current block, except stack slots,
//! which are always placed at the top of the entry block. It also provides
//! the structured region helpers (`begin_if` / `finish_if`, `begin_loop` /
//! `end_loop`) used to lower `se` and `repita`.

use std::collections::{HashMap, HashSet};

use super::{
    BasicBlock, BinaryOp, CastOp, FloatPredicate, Function, FunctionDeclaration, FunctionType,
    GlobalVariable, Initializer, Instruction, IntPredicate, IrType, Linkage, Module, Value,
};

pub struct ModuleBuilder {
    module: Module,
    constant_counters: HashMap<String, u32>,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        ModuleBuilder {
            module: Module::new(name),
            constant_counters: HashMap::new(),
        }
    }

    /// Adds a global variable and returns its address. Zero-initialized
    /// globals get common linkage.
    pub fn add_global(&mut self, name: &str, ty: IrType, initializer: Initializer) -> Value {
        let linkage = if initializer == Initializer::Zero {
            Linkage::Common
        } else {
            Linkage::External
        };
        let global = GlobalVariable {
            name: name.to_string(),
            ty,
            initializer,
            constant: false,
            linkage,
        };
        let pointer = global.pointer();
        self.module.globals.push(global);
        pointer
    }

    pub fn get_global_mut(&mut self, name: &str) -> Option<&mut GlobalVariable> {
        self.module.globals.iter_mut().find(|g| g.name == name)
    }

    /// `{base}.{n}` for the first `n` no global uses yet.
    pub fn unique_global_name(&self, base: &str) -> String {
        let mut n = 1;
        loop {
            let name = format!("{}.{}", base, n);
            if !self.module.globals.iter().any(|g| g.name == name) {
                return name;
            }
            n += 1;
        }
    }

    /// Adds a private byte-string constant named `{prefix}.{n}`.
    pub fn add_string_constant(&mut self, prefix: &str, bytes: &[u8]) -> Value {
        let counter = self.constant_counters.entry(prefix.to_string()).or_insert(0);
        let name = format!("{}.{}", prefix, counter);
        *counter += 1;

        let global = GlobalVariable {
            name,
            ty: IrType::I8.array(bytes.len() as u64),
            initializer: Initializer::Bytes(bytes.to_vec()),
            constant: true,
            linkage: Linkage::Private,
        };
        let pointer = global.pointer();
        self.module.globals.push(global);
        pointer
    }

    /// Declares an external function once; later calls are no-ops.
    pub fn declare_function(&mut self, name: &str, signature: FunctionType) {
        if self.module.declarations.iter().any(|d| d.name == name) {
            return;
        }
        self.module.declarations.push(FunctionDeclaration {
            name: name.to_string(),
            signature,
        });
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.module.get_function(name).is_some()
    }

    pub fn add_function(&mut self, function: Function) {
        self.module.functions.push(function);
    }

    pub fn finish(self) -> Module {
        self.module
    }
}

/// Blocks of a `se` region.
#[derive(Debug, Clone)]
pub struct IfRegion {
    pub then_block: String,
    pub else_block: Option<String>,
    pub merge_block: String,
}

/// Blocks of a `repita` region.
#[derive(Debug, Clone)]
pub struct LoopRegion {
    pub body_block: String,
    pub exit_block: String,
}

pub struct FunctionBuilder {
    function: Function,
    current: usize,
    taken: HashSet<String>,
    temp_counter: u32,
    allocas: usize,
}

impl FunctionBuilder {
    pub fn new(name: &str, return_type: IrType, params: Vec<(String, IrType)>) -> Self {
        let mut taken = HashSet::new();
        taken.insert(String::from("entry"));
        for (param, _) in &params {
            taken.insert(param.clone());
        }

        FunctionBuilder {
            function: Function {
                name: name.to_string(),
                return_type,
                params,
                blocks: vec![BasicBlock::new("entry")],
            },
            current: 0,
            taken,
            temp_counter: 0,
            allocas: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn return_type(&self) -> &IrType {
        &self.function.return_type
    }

    pub fn param_value(&self, index: usize) -> Option<Value> {
        self.function
            .params
            .get(index)
            .map(|(name, ty)| Value::Local {
                name: name.clone(),
                ty: ty.clone(),
            })
    }

    /// Reserves `base`, or `base` with the smallest numeric suffix that is
    /// still free.
    pub fn unique_name(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn temp(&mut self) -> String {
        loop {
            let candidate = format!("t{}", self.temp_counter);
            self.temp_counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn append_block(&mut self, label: &str) -> String {
        let label = self.unique_name(label);
        self.function.blocks.push(BasicBlock::new(&label));
        label
    }

    pub fn position_at_end(&mut self, label: &str) {
        if let Some(index) = self.function.blocks.iter().position(|b| b.label == label) {
            self.current = index;
        }
    }

    pub fn block_count(&self) -> usize {
        self.function.blocks.len()
    }

    pub fn current_block(&self) -> &str {
        &self.function.blocks[self.current].label
    }

    pub fn is_terminated(&self) -> bool {
        self.function.blocks[self.current].is_terminated()
    }

    fn push(&mut self, instruction: Instruction) {
        self.function.blocks[self.current]
            .instructions
            .push(instruction);
    }

    /// Allocates a stack slot at the top of the entry block and returns its
    /// address.
    pub fn build_alloca(&mut self, ty: IrType, name: &str) -> Value {
        let dest = self.unique_name(name);
        self.function.blocks[0].instructions.insert(
            self.allocas,
            Instruction::Alloca {
                dest: dest.clone(),
                ty: ty.clone(),
            },
        );
        self.allocas += 1;
        Value::Local { name: dest, ty: ty.ptr() }
    }

    pub fn build_load(&mut self, ptr: Value) -> Value {
        let ty = ptr.ty().pointee().cloned().unwrap_or(IrType::I32);
        let dest = self.temp();
        self.push(Instruction::Load {
            dest: dest.clone(),
            ty: ty.clone(),
            ptr,
        });
        Value::Local { name: dest, ty }
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) {
        self.push(Instruction::Store { value, ptr });
    }

    pub fn build_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let ty = lhs.ty();
        let dest = self.temp();
        self.push(Instruction::Binary {
            dest: dest.clone(),
            op,
            lhs,
            rhs,
        });
        Value::Local { name: dest, ty }
    }

    pub fn build_icmp(&mut self, predicate: IntPredicate, lhs: Value, rhs: Value) -> Value {
        let dest = self.temp();
        self.push(Instruction::ICmp {
            dest: dest.clone(),
            predicate,
            lhs,
            rhs,
        });
        Value::Local {
            name: dest,
            ty: IrType::I1,
        }
    }

    pub fn build_fcmp(&mut self, predicate: FloatPredicate, lhs: Value, rhs: Value) -> Value {
        let dest = self.temp();
        self.push(Instruction::FCmp {
            dest: dest.clone(),
            predicate,
            lhs,
            rhs,
        });
        Value::Local {
            name: dest,
            ty: IrType::I1,
        }
    }

    pub fn build_cast(&mut self, op: CastOp, value: Value, to: IrType) -> Value {
        let dest = self.temp();
        self.push(Instruction::Cast {
            dest: dest.clone(),
            op,
            value,
            to: to.clone(),
        });
        Value::Local { name: dest, ty: to }
    }

    /// Element address. The first index steps over the pointer itself; a
    /// second one selects inside an array.
    pub fn build_gep(&mut self, ptr: Value, indices: Vec<Value>) -> Value {
        let source_ty = ptr.ty().pointee().cloned().unwrap_or(IrType::I8);
        let mut result_ty = source_ty.clone();
        for _ in indices.iter().skip(1) {
            if let IrType::Array(element, _) = result_ty {
                result_ty = *element;
            }
        }

        let dest = self.temp();
        self.push(Instruction::GetElementPtr {
            dest: dest.clone(),
            source_ty,
            ptr,
            indices,
        });
        Value::Local {
            name: dest,
            ty: result_ty.ptr(),
        }
    }

    /// Emits a call. Returns `None` for `void` callees.
    pub fn build_call(
        &mut self,
        callee: &str,
        signature: FunctionType,
        args: Vec<Value>,
    ) -> Option<Value> {
        let return_type = signature.return_type.clone();
        let dest = (return_type != IrType::Void).then(|| self.temp());
        self.push(Instruction::Call {
            dest: dest.clone(),
            callee: callee.to_string(),
            signature,
            args,
        });
        dest.map(|name| Value::Local {
            name,
            ty: return_type,
        })
    }

    pub fn build_branch(&mut self, target: &str) {
        self.push(Instruction::Branch {
            target: target.to_string(),
        });
    }

    pub fn build_cond_branch(&mut self, condition: Value, then_block: &str, else_block: &str) {
        self.push(Instruction::CondBranch {
            condition,
            then_block: then_block.to_string(),
            else_block: else_block.to_string(),
        });
    }

    pub fn build_return(&mut self, value: Option<Value>) {
        self.push(Instruction::Return { value });
    }

    /// Branches to `target` unless the current block already ended.
    pub fn branch_if_open(&mut self, target: &str) {
        if !self.is_terminated() {
            self.build_branch(target);
        }
    }

    /// Splits control on `condition` (an `i1`) and positions the builder
    /// in the `then` arm.
    pub fn begin_if(&mut self, condition: Value, has_else: bool) -> IfRegion {
        let then_block = self.append_block("se.entao");
        let else_block = has_else.then(|| self.append_block("se.senao"));
        let merge_block = self.append_block("se.fim");

        let false_target = else_block.as_deref().unwrap_or(&merge_block).to_string();
        self.build_cond_branch(condition, &then_block, &false_target);
        self.position_at_end(&then_block);

        IfRegion {
            then_block,
            else_block,
            merge_block,
        }
    }

    /// Closes the `then` arm and moves to the `else` arm.
    pub fn begin_else(&mut self, region: &IfRegion) {
        self.branch_if_open(&region.merge_block);
        if let Some(else_block) = &region.else_block {
            self.position_at_end(else_block);
        }
    }

    /// Closes the last open arm and continues in the merge block.
    pub fn finish_if(&mut self, region: IfRegion) {
        self.branch_if_open(&region.merge_block);
        self.position_at_end(&region.merge_block);
    }

    /// Enters a loop body unconditionally.
    pub fn begin_loop(&mut self) -> LoopRegion {
        let body_block = self.append_block("repita");
        let exit_block = self.append_block("repita.fim");
        self.build_branch(&body_block);
        self.position_at_end(&body_block);

        LoopRegion {
            body_block,
            exit_block,
        }
    }

    /// Ends the body: jumps back when `repeat` (an `i1`) holds, otherwise
    /// leaves the loop.
    pub fn end_loop(&mut self, region: LoopRegion, repeat: Value) {
        if !self.is_terminated() {
            self.build_cond_branch(repeat, &region.body_block, &region.exit_block);
        }
        self.position_at_end(&region.exit_block);
    }

    pub fn finish(self) -> Function {
        self.function
    }
}
