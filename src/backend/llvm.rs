//! LLVM backend.
//!
//! Rebuilds an IR [`Module`] through `inkwell`, runs the LLVM verifier and
//! writes either textual IR or, for `.o` outputs, a native object file for
//! the host.

use std::{collections::HashMap, path::Path};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage as LlvmLinkage, Module as LlvmModule},
    targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType as LlvmFunctionType},
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue},
    AddressSpace, FloatPredicate as LlvmFloatPredicate, IntPredicate as LlvmIntPredicate,
    OptimizationLevel,
};
use log::{debug, info};

use crate::ir::{
    BinaryOp, CastOp, FloatPredicate, Function, FunctionType, Initializer, Instruction,
    IntPredicate, IrType, Linkage, Module, Value,
};

use super::{Backend, BackendError};

pub struct LlvmBackend;

fn llvm_error(error: impl ToString) -> BackendError {
    BackendError::Llvm(error.to_string())
}

/// Per-module translation state.
struct Lowering<'a> {
    context: &'a Context,
    module: LlvmModule<'a>,
    builder: Builder<'a>,
}

/// Per-function translation state: named values and blocks.
struct FunctionScope<'a> {
    values: HashMap<String, BasicValueEnum<'a>>,
    blocks: HashMap<String, BasicBlock<'a>>,
}

impl<'a> Lowering<'a> {
    fn new(context: &'a Context, name: &str) -> Self {
        Lowering {
            context,
            module: context.create_module(name),
            builder: context.create_builder(),
        }
    }

    fn basic_type(&self, ty: &IrType) -> Result<BasicTypeEnum<'a>, BackendError> {
        Ok(match ty {
            IrType::I1 => self.context.bool_type().into(),
            IrType::I8 => self.context.i8_type().into(),
            IrType::I32 => self.context.i32_type().into(),
            IrType::Double => self.context.f64_type().into(),
            IrType::Pointer(inner) => self
                .basic_type(inner)?
                .ptr_type(AddressSpace::default())
                .into(),
            IrType::Array(element, len) => self.basic_type(element)?.array_type(*len as u32).into(),
            IrType::Void => return Err(llvm_error("void is not a value type")),
        })
    }

    fn function_type(&self, signature: &FunctionType) -> Result<LlvmFunctionType<'a>, BackendError> {
        let params = signature
            .params
            .iter()
            .map(|p| self.basic_type(p).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match &signature.return_type {
            IrType::Void => self.context.void_type().fn_type(&params, signature.variadic),
            other => self.basic_type(other)?.fn_type(&params, signature.variadic),
        })
    }

    fn zero(&self, ty: &IrType) -> Result<BasicValueEnum<'a>, BackendError> {
        Ok(match self.basic_type(ty)? {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::VectorType(t) => t.const_zero().into(),
        })
    }

    fn lower_globals(&self, module: &Module) -> Result<(), BackendError> {
        for global in &module.globals {
            let ty = self.basic_type(&global.ty)?;
            let value = self.module.add_global(ty, None, &global.name);

            let initializer = match &global.initializer {
                Initializer::Zero => self.zero(&global.ty)?,
                Initializer::Int(n) => self.context.i32_type().const_int(*n as u64, true).into(),
                Initializer::Float(f) => self.context.f64_type().const_float(*f).into(),
                Initializer::Bytes(bytes) => self.context.const_string(bytes, false).into(),
            };
            value.set_initializer(&initializer);
            value.set_constant(global.constant);
            value.set_alignment(global.ty.alignment());
            match global.linkage {
                Linkage::Common => value.set_linkage(LlvmLinkage::Common),
                Linkage::Private => {
                    value.set_linkage(LlvmLinkage::Private);
                    value.set_unnamed_addr(true);
                }
                Linkage::External => value.set_linkage(LlvmLinkage::External),
            }
        }
        Ok(())
    }

    fn value(
        &self,
        scope: &FunctionScope<'a>,
        value: &Value,
    ) -> Result<BasicValueEnum<'a>, BackendError> {
        Ok(match value {
            Value::ConstInt { ty, value } => match self.basic_type(ty)? {
                BasicTypeEnum::IntType(t) => t.const_int(*value as u64, true).into(),
                _ => return Err(llvm_error(format!("integer constant of type {}", ty))),
            },
            Value::ConstFloat(f) => self.context.f64_type().const_float(*f).into(),
            Value::Local { name, .. } => *scope
                .values
                .get(name)
                .ok_or_else(|| llvm_error(format!("unknown value %{}", name)))?,
            Value::Global { name, .. } => self
                .module
                .get_global(name)
                .ok_or_else(|| llvm_error(format!("unknown global @{}", name)))?
                .as_pointer_value()
                .into(),
            Value::Null(ty) => self.zero(ty)?,
        })
    }

    fn function(&self, name: &str) -> Result<FunctionValue<'a>, BackendError> {
        self.module
            .get_function(name)
            .ok_or_else(|| llvm_error(format!("unknown function @{}", name)))
    }

    fn lower_function(&self, function: &Function) -> Result<(), BackendError> {
        let llvm_function = self.function(&function.name)?;

        let mut scope = FunctionScope {
            values: HashMap::new(),
            blocks: HashMap::new(),
        };
        for (index, (name, _)) in function.params.iter().enumerate() {
            let param = llvm_function
                .get_nth_param(index as u32)
                .ok_or_else(|| llvm_error(format!("missing parameter {}", name)))?;
            param.set_name(name);
            scope.values.insert(name.clone(), param);
        }
        for block in &function.blocks {
            let llvm_block = self.context.append_basic_block(llvm_function, &block.label);
            scope.blocks.insert(block.label.clone(), llvm_block);
        }

        for block in &function.blocks {
            self.builder.position_at_end(scope.blocks[&block.label]);
            for instruction in &block.instructions {
                self.lower_instruction(&mut scope, instruction)?;
            }
        }

        debug!("rebuilt function '{}' through LLVM", function.name);
        Ok(())
    }

    fn block(&self, scope: &FunctionScope<'a>, label: &str) -> Result<BasicBlock<'a>, BackendError> {
        scope
            .blocks
            .get(label)
            .copied()
            .ok_or_else(|| llvm_error(format!("unknown block %{}", label)))
    }

    fn lower_instruction(
        &self,
        scope: &mut FunctionScope<'a>,
        instruction: &Instruction,
    ) -> Result<(), BackendError> {
        let builder = &self.builder;

        let (dest, result): (Option<&String>, Option<BasicValueEnum<'a>>) = match instruction {
            Instruction::Alloca { dest, ty } => {
                let slot = builder
                    .build_alloca(self.basic_type(ty)?, dest)
                    .map_err(llvm_error)?;
                (Some(dest), Some(slot.into()))
            }
            Instruction::Load { dest, ptr, .. } => {
                let ptr = self.value(scope, ptr)?.into_pointer_value();
                let loaded = builder.build_load(ptr, dest).map_err(llvm_error)?;
                (Some(dest), Some(loaded))
            }
            Instruction::Store { value, ptr } => {
                let value = self.value(scope, value)?;
                let ptr = self.value(scope, ptr)?.into_pointer_value();
                builder.build_store(ptr, value).map_err(llvm_error)?;
                (None, None)
            }
            Instruction::Binary { dest, op, lhs, rhs } => {
                let lhs = self.value(scope, lhs)?;
                let rhs = self.value(scope, rhs)?;
                let result: BasicValueEnum = match op {
                    BinaryOp::Add => builder
                        .build_int_add(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::Sub => builder
                        .build_int_sub(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::Mul => builder
                        .build_int_mul(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::UDiv => builder
                        .build_int_unsigned_div(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::And => builder
                        .build_and(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::Or => builder
                        .build_or(lhs.into_int_value(), rhs.into_int_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::FAdd => builder
                        .build_float_add(lhs.into_float_value(), rhs.into_float_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::FSub => builder
                        .build_float_sub(lhs.into_float_value(), rhs.into_float_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::FMul => builder
                        .build_float_mul(lhs.into_float_value(), rhs.into_float_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                    BinaryOp::FDiv => builder
                        .build_float_div(lhs.into_float_value(), rhs.into_float_value(), dest)
                        .map_err(llvm_error)?
                        .into(),
                };
                (Some(dest), Some(result))
            }
            Instruction::ICmp {
                dest,
                predicate,
                lhs,
                rhs,
            } => {
                let predicate = match predicate {
                    IntPredicate::Eq => LlvmIntPredicate::EQ,
                    IntPredicate::Ne => LlvmIntPredicate::NE,
                    IntPredicate::Sgt => LlvmIntPredicate::SGT,
                    IntPredicate::Sge => LlvmIntPredicate::SGE,
                    IntPredicate::Slt => LlvmIntPredicate::SLT,
                    IntPredicate::Sle => LlvmIntPredicate::SLE,
                };
                let lhs = self.value(scope, lhs)?.into_int_value();
                let rhs = self.value(scope, rhs)?.into_int_value();
                let result = builder
                    .build_int_compare(predicate, lhs, rhs, dest)
                    .map_err(llvm_error)?;
                (Some(dest), Some(result.into()))
            }
            Instruction::FCmp {
                dest,
                predicate,
                lhs,
                rhs,
            } => {
                let predicate = match predicate {
                    FloatPredicate::Oeq => LlvmFloatPredicate::OEQ,
                    FloatPredicate::One => LlvmFloatPredicate::ONE,
                    FloatPredicate::Ogt => LlvmFloatPredicate::OGT,
                    FloatPredicate::Oge => LlvmFloatPredicate::OGE,
                    FloatPredicate::Olt => LlvmFloatPredicate::OLT,
                    FloatPredicate::Ole => LlvmFloatPredicate::OLE,
                };
                let lhs = self.value(scope, lhs)?.into_float_value();
                let rhs = self.value(scope, rhs)?.into_float_value();
                let result = builder
                    .build_float_compare(predicate, lhs, rhs, dest)
                    .map_err(llvm_error)?;
                (Some(dest), Some(result.into()))
            }
            Instruction::Cast {
                dest,
                op,
                value,
                to,
            } => {
                let value = self.value(scope, value)?;
                let to = self.basic_type(to)?;
                let result: BasicValueEnum = match op {
                    CastOp::UiToFp => builder
                        .build_unsigned_int_to_float(
                            value.into_int_value(),
                            to.into_float_type(),
                            dest,
                        )
                        .map_err(llvm_error)?
                        .into(),
                    CastOp::FpToUi => builder
                        .build_float_to_unsigned_int(
                            value.into_float_value(),
                            to.into_int_type(),
                            dest,
                        )
                        .map_err(llvm_error)?
                        .into(),
                    CastOp::ZExt => builder
                        .build_int_z_extend(value.into_int_value(), to.into_int_type(), dest)
                        .map_err(llvm_error)?
                        .into(),
                };
                (Some(dest), Some(result))
            }
            Instruction::GetElementPtr {
                dest, ptr, indices, ..
            } => {
                let ptr = self.value(scope, ptr)?.into_pointer_value();
                let indices = indices
                    .iter()
                    .map(|i| self.value(scope, i).map(|v| v.into_int_value()))
                    .collect::<Result<Vec<_>, _>>()?;
                // Indices come from the generator and stay inside the pointee.
                let address = unsafe { builder.build_in_bounds_gep(ptr, &indices, dest) }
                    .map_err(llvm_error)?;
                (Some(dest), Some(address.into()))
            }
            Instruction::Call {
                dest, callee, args, ..
            } => {
                let function = self.function(callee)?;
                let args = args
                    .iter()
                    .map(|a| self.value(scope, a).map(BasicMetadataValueEnum::from))
                    .collect::<Result<Vec<_>, _>>()?;
                let name = dest.as_deref().unwrap_or("");
                let call = builder
                    .build_call(function, &args, name)
                    .map_err(llvm_error)?;
                (dest.as_ref(), call.try_as_basic_value().left())
            }
            Instruction::Branch { target } => {
                builder
                    .build_unconditional_branch(self.block(scope, target)?)
                    .map_err(llvm_error)?;
                (None, None)
            }
            Instruction::CondBranch {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.value(scope, condition)?.into_int_value();
                builder
                    .build_conditional_branch(
                        condition,
                        self.block(scope, then_block)?,
                        self.block(scope, else_block)?,
                    )
                    .map_err(llvm_error)?;
                (None, None)
            }
            Instruction::Return { value } => {
                match value {
                    Some(value) => {
                        let value = self.value(scope, value)?;
                        builder
                            .build_return(Some(&value as &dyn BasicValue))
                            .map_err(llvm_error)?;
                    }
                    None => {
                        builder.build_return(None).map_err(llvm_error)?;
                    }
                }
                (None, None)
            }
        };

        if let (Some(dest), Some(result)) = (dest, result) {
            scope.values.insert(dest.clone(), result);
        }
        Ok(())
    }

    fn lower(self, module: &Module) -> Result<LlvmModule<'a>, BackendError> {
        self.lower_globals(module)?;

        for declaration in &module.declarations {
            let ty = self.function_type(&declaration.signature)?;
            self.module
                .add_function(&declaration.name, ty, Some(LlvmLinkage::External));
        }
        for function in &module.functions {
            let ty = self.function_type(&function.signature())?;
            self.module.add_function(&function.name, ty, None);
        }
        for function in &module.functions {
            self.lower_function(function)?;
        }

        self.module.verify().map_err(llvm_error)?;
        Ok(self.module)
    }
}

fn write_object(module: &LlvmModule, output: &Path) -> Result<(), BackendError> {
    Target::initialize_native(&InitializationConfig::default()).map_err(llvm_error)?;
    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).map_err(llvm_error)?;
    let machine = target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::None,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| llvm_error("could not create a target machine for the host"))?;

    module.set_triple(&triple);
    module.set_data_layout(&machine.get_target_data().get_data_layout());
    machine
        .write_to_file(module, FileType::Object, output)
        .map_err(llvm_error)
}

impl Backend for LlvmBackend {
    fn name(&self) -> &'static str {
        "llvm"
    }

    fn emit(&self, module: &Module, output: &Path) -> Result<(), BackendError> {
        let context = Context::create();
        let llvm_module = Lowering::new(&context, &module.name).lower(module)?;

        if output.extension().map(|e| e == "o").unwrap_or(false) {
            write_object(&llvm_module, output)?;
        } else {
            llvm_module.print_to_file(output).map_err(llvm_error)?;
        }

        info!("wrote {} ({} backend)", output.display(), self.name());
        Ok(())
    }
}
