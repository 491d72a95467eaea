//! Typed, basic-block intermediate representation.
//!
//! The code generator lowers the checked AST into these structures through
//! the [`builder`] API. A finished [`Module`] prints itself as LLVM textual
//! IR ([`printer`]) and can be handed to any [`Backend`](crate::backend::Backend).
//!
//! Pointers are typed (`i32*`, `[10 x double]*`), matching the LLVM 14
//! textual format the external toolchain consumes.

pub mod builder;
pub mod printer;


use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    Double,
    Pointer(Box<IrType>),
    Array(Box<IrType>, u64),
}

impl IrType {
    pub fn ptr(&self) -> IrType {
        IrType::Pointer(Box::new(self.clone()))
    }

    pub fn array(&self, len: u64) -> IrType {
        IrType::Array(Box::new(self.clone()), len)
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::Double)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I32)
    }

    pub fn alignment(&self) -> u32 {
        match self {
            IrType::Void | IrType::I1 | IrType::I8 => 1,
            IrType::I32 => 4,
            IrType::Double | IrType::Pointer(_) => 8,
            IrType::Array(element, _) => element.alignment(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ConstInt { ty: IrType, value: i64 },
    ConstFloat(f64),
    /// A named local: parameter, stack slot or instruction result.
    Local { name: String, ty: IrType },
    /// Address of a global; `ty` is the pointer type.
    Global { name: String, ty: IrType },
    /// The null pointer of a pointer type.
    Null(IrType),
}

impl Value {
    pub fn i32(value: i64) -> Self {
        Value::ConstInt {
            ty: IrType::I32,
            value,
        }
    }

    pub fn double(value: f64) -> Self {
        Value::ConstFloat(value)
    }

    /// The zero constant of `ty`.
    pub fn zero(ty: &IrType) -> Self {
        match ty {
            IrType::Double => Value::ConstFloat(0.0),
            IrType::Pointer(_) => Value::Null(ty.clone()),
            other => Value::ConstInt {
                ty: other.clone(),
                value: 0,
            },
        }
    }

    pub fn ty(&self) -> IrType {
        match self {
            Value::ConstInt { ty, .. }
            | Value::Local { ty, .. }
            | Value::Global { ty, .. }
            | Value::Null(ty) => ty.clone(),
            Value::ConstFloat(_) => IrType::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Zero,
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Zero-initialized, mergeable definition.
    Common,
    /// Module-local, address not significant.
    Private,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    pub name: String,
    /// Type of the stored value (the global itself is a pointer to it).
    pub ty: IrType,
    pub initializer: Initializer,
    pub constant: bool,
    pub linkage: Linkage,
}

impl GlobalVariable {
    pub fn pointer(&self) -> Value {
        Value::Global {
            name: self.name.clone(),
            ty: self.ty.ptr(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Sgt,
    Sge,
    Slt,
    Sle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Ogt,
    Oge,
    Olt,
    Ole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    UiToFp,
    FpToUi,
    ZExt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub return_type: IrType,
    pub params: Vec<IrType>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        dest: String,
        ty: IrType,
    },
    Load {
        dest: String,
        ty: IrType,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Binary {
        dest: String,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    ICmp {
        dest: String,
        predicate: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
    FCmp {
        dest: String,
        predicate: FloatPredicate,
        lhs: Value,
        rhs: Value,
    },
    Cast {
        dest: String,
        op: CastOp,
        value: Value,
        to: IrType,
    },
    GetElementPtr {
        dest: String,
        /// Type the base pointer points to.
        source_ty: IrType,
        ptr: Value,
        indices: Vec<Value>,
    },
    Call {
        dest: Option<String>,
        callee: String,
        signature: FunctionType,
        args: Vec<Value>,
    },
    Branch {
        target: String,
    },
    CondBranch {
        condition: Value,
        then_block: String,
        else_block: String,
    },
    Return {
        value: Option<Value>,
    },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Branch { .. } | Instruction::CondBranch { .. } | Instruction::Return { .. }
        )
    }

    /// Values this instruction reads.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Alloca { .. } | Instruction::Branch { .. } => vec![],
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::Binary { lhs, rhs, .. }
            | Instruction::ICmp { lhs, rhs, .. }
            | Instruction::FCmp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::Cast { value, .. } => vec![value],
            Instruction::GetElementPtr { ptr, indices, .. } => {
                std::iter::once(ptr).chain(indices.iter()).collect()
            }
            Instruction::Call { args, .. } => args.iter().collect(),
            Instruction::CondBranch { condition, .. } => vec![condition],
            Instruction::Return { value } => value.iter().collect(),
        }
    }

    /// Labels this instruction can transfer control to.
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Instruction::Branch { target } => vec![target.as_str()],
            Instruction::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![then_block.as_str(), else_block.as_str()],
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(label: &str) -> Self {
        BasicBlock {
            label: label.to_string(),
            instructions: vec![],
        }
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    pub params: Vec<(String, IrType)>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn signature(&self) -> FunctionType {
        FunctionType {
            return_type: self.return_type.clone(),
            params: self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            variadic: false,
        }
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }

    /// Labels of the blocks that branch to `label`.
    pub fn predecessors(&self, label: &str) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| {
                b.terminator()
                    .map(|t| t.successors().contains(&label))
                    .unwrap_or(false)
            })
            .map(|b| b.label.as_str())
            .collect()
    }
}

/// An external function the module calls but does not define.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub signature: FunctionType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub globals: Vec<GlobalVariable>,
    pub declarations: Vec<FunctionDeclaration>,
    pub functions: Vec<Function>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("bloco '{block}' da função '{function}' sem terminador")]
    MissingTerminator { function: String, block: String },
    #[error("bloco '{block}' da função '{function}' tem instrução após o terminador")]
    InstructionAfterTerminator { function: String, block: String },
    #[error("desvio para bloco desconhecido '{target}' na função '{function}'")]
    UnknownBlock { function: String, target: String },
    #[error("símbolo '{name}' definido mais de uma vez")]
    DuplicateSymbol { name: String },
    #[error("função '{function}' usa '@{name}' como {found}, mas o global tem tipo {expected}")]
    GlobalTypeMismatch {
        function: String,
        name: String,
        expected: IrType,
        found: IrType,
    },
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            globals: vec![],
            declarations: vec![],
            functions: vec![],
        }
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Structural checks: every block ends in exactly one terminator and
    /// every branch names a block of the same function.
    pub fn verify(&self) -> Result<(), IrError> {
        let mut symbols = HashSet::new();
        let names = self
            .globals
            .iter()
            .map(|g| &g.name)
            .chain(self.declarations.iter().map(|d| &d.name))
            .chain(self.functions.iter().map(|f| &f.name));
        for name in names {
            if !symbols.insert(name) {
                return Err(IrError::DuplicateSymbol { name: name.clone() });
            }
        }

        for function in &self.functions {
            for block in &function.blocks {
                let terminators = block
                    .instructions
                    .iter()
                    .position(Instruction::is_terminator);
                match terminators {
                    None => {
                        return Err(IrError::MissingTerminator {
                            function: function.name.clone(),
                            block: block.label.clone(),
                        })
                    }
                    Some(index) if index + 1 != block.instructions.len() => {
                        return Err(IrError::InstructionAfterTerminator {
                            function: function.name.clone(),
                            block: block.label.clone(),
                        })
                    }
                    Some(_) => {}
                }

                for operand in block.instructions.iter().flat_map(|i| i.operands()) {
                    let Value::Global { name, ty } = operand else {
                        continue;
                    };
                    if let Some(global) = self.globals.iter().find(|g| &g.name == name) {
                        let expected = global.ty.ptr();
                        if *ty != expected {
                            return Err(IrError::GlobalTypeMismatch {
                                function: function.name.clone(),
                                name: name.clone(),
                                expected,
                                found: ty.clone(),
                            });
                        }
                    }
                }

                for target in block.instructions.iter().flat_map(|i| i.successors()) {
                    if function.block(target).is_none() {
                        return Err(IrError::UnknownBlock {
                            function: function.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
