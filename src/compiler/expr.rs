use crate::{
    ast::{
        expressions::{Expr, VarRef},
        types::{BinaryOp, Number, UnaryOp},
    },
    ir::{self, CastOp, FloatPredicate, IntPredicate, IrType, Value},
};

use super::compiler::{CodegenError, Compiler, Storage};

/// Lowers an expression that must produce a value.
pub fn gen_expression(compiler: &mut Compiler, expression: &Expr) -> Result<Value, CodegenError> {
    match expression {
        Expr::Number {
            value: Number::Int(n),
            ..
        } => Ok(Value::i32(*n)),
        Expr::Number {
            value: Number::Float(f),
            ..
        } => Ok(Value::double(*f)),
        Expr::Variable(var) => gen_variable(compiler, var),
        Expr::Call { name, args, line } => {
            gen_call(compiler, name, args, *line)?.ok_or_else(|| CodegenError::VoidValueUsed {
                name: name.clone(),
                line: *line,
            })
        }
        Expr::Binary {
            op,
            left,
            right,
            line,
        } => {
            let lhs = gen_expression(compiler, left)?;
            let rhs = gen_expression(compiler, right)?;
            gen_binary(compiler, *op, lhs, rhs, *line)
        }
        Expr::Unary { op, operand, line } => {
            let value = gen_expression(compiler, operand)?;
            let value = widen_bool(compiler, value);
            if value.ty().pointee().is_some() {
                return Err(CodegenError::NotAScalar {
                    name: operand.describe(),
                    line: *line,
                });
            }
            let zero = Value::zero(&value.ty());
            let op = match (op, value.ty().is_float()) {
                (UnaryOp::Plus, false) => ir::BinaryOp::Add,
                (UnaryOp::Minus, false) => ir::BinaryOp::Sub,
                (UnaryOp::Plus, true) => ir::BinaryOp::FAdd,
                (UnaryOp::Minus, true) => ir::BinaryOp::FSub,
            };
            Ok(compiler.builder().build_binary(op, zero, value))
        }
    }
}

/// Reads a variable. A whole array (no index) yields a pointer to its first
/// element, which is how arrays are passed to functions.
fn gen_variable(compiler: &mut Compiler, var: &VarRef) -> Result<Value, CodegenError> {
    if var.index().is_some() {
        let address = gen_address(compiler, var)?;
        return Ok(compiler.builder().build_load(address));
    }

    match compiler.lookup(&var.name, var.line)? {
        Storage::Scalar(ptr) | Storage::ArrayParam(ptr) => Ok(compiler.builder().build_load(ptr)),
        Storage::Array(ptr) => Ok(compiler
            .builder()
            .build_gep(ptr, vec![Value::i32(0), Value::i32(0)])),
    }
}

/// The address a variable reference denotes: the slot of a scalar or the
/// element an index selects.
pub fn gen_address(compiler: &mut Compiler, var: &VarRef) -> Result<Value, CodegenError> {
    let storage = compiler.lookup(&var.name, var.line)?;

    let index = match var.index() {
        Some(index) => index,
        None => {
            return match storage {
                Storage::Scalar(ptr) => Ok(ptr),
                _ => Err(CodegenError::NotAScalar {
                    name: var.name.clone(),
                    line: var.line,
                }),
            }
        }
    };

    let index = gen_expression(compiler, index)?;
    let index = coerce(compiler, index, &IrType::I32, var.line)?;

    match storage {
        Storage::Array(ptr) => Ok(compiler
            .builder()
            .build_gep(ptr, vec![Value::i32(0), index])),
        Storage::ArrayParam(slot) => {
            let base = compiler.builder().build_load(slot);
            Ok(compiler.builder().build_gep(base, vec![index]))
        }
        Storage::Scalar(_) => Err(CodegenError::NotAnArray {
            name: var.name.clone(),
            line: var.line,
        }),
    }
}

/// Lowers a call. Arguments beyond the callee's parameters are evaluated
/// but not passed. Returns `None` for functions without a return type.
pub fn gen_call(
    compiler: &mut Compiler,
    name: &str,
    args: &[Expr],
    line: u32,
) -> Result<Option<Value>, CodegenError> {
    let signature = compiler.signatures.get(name).cloned().ok_or_else(|| {
        CodegenError::UnknownFunction {
            name: name.to_string(),
            line,
        }
    })?;

    if args.len() < signature.params.len() {
        return Err(CodegenError::MissingArguments {
            name: name.to_string(),
            expected: signature.params.len(),
            found: args.len(),
            line,
        });
    }

    let mut values = Vec::with_capacity(signature.params.len());
    for (i, arg) in args.iter().enumerate() {
        let value = gen_expression(compiler, arg)?;
        if let Some(param) = signature.params.get(i) {
            values.push(coerce(compiler, value, param, line)?);
        }
    }

    Ok(compiler.builder().build_call(name, signature, values))
}

fn gen_binary(
    compiler: &mut Compiler,
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    line: u32,
) -> Result<Value, CodegenError> {
    for operand in [&lhs, &rhs] {
        if operand.ty().pointee().is_some() {
            return Err(CodegenError::InvalidConversion {
                from: operand.ty().to_string(),
                to: String::from("a number"),
                line,
            });
        }
    }

    if op.is_logical() {
        let (lhs, rhs) = if lhs.ty() == rhs.ty() && lhs.ty().is_int() {
            (lhs, rhs)
        } else {
            (is_nonzero(compiler, lhs), is_nonzero(compiler, rhs))
        };
        let op = match op {
            BinaryOp::And => ir::BinaryOp::And,
            _ => ir::BinaryOp::Or,
        };
        return Ok(compiler.builder().build_binary(op, lhs, rhs));
    }

    let lhs = widen_bool(compiler, lhs);
    let rhs = widen_bool(compiler, rhs);
    let (lhs, rhs) = if lhs.ty() != rhs.ty() {
        (
            coerce(compiler, lhs, &IrType::Double, line)?,
            coerce(compiler, rhs, &IrType::Double, line)?,
        )
    } else {
        (lhs, rhs)
    };
    let float = lhs.ty().is_float();

    let value = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let op = match (op, float) {
                (BinaryOp::Add, false) => ir::BinaryOp::Add,
                (BinaryOp::Sub, false) => ir::BinaryOp::Sub,
                (BinaryOp::Mul, false) => ir::BinaryOp::Mul,
                (BinaryOp::Add, true) => ir::BinaryOp::FAdd,
                (BinaryOp::Sub, true) => ir::BinaryOp::FSub,
                (BinaryOp::Mul, true) => ir::BinaryOp::FMul,
                (_, true) => ir::BinaryOp::FDiv,
                (_, false) => ir::BinaryOp::UDiv,
            };
            compiler.builder().build_binary(op, lhs, rhs)
        }
        _ if float => {
            let predicate = match op {
                BinaryOp::Greater => FloatPredicate::Ogt,
                BinaryOp::Less => FloatPredicate::Olt,
                BinaryOp::GreaterEquals => FloatPredicate::Oge,
                BinaryOp::LessEquals => FloatPredicate::Ole,
                BinaryOp::NotEquals => FloatPredicate::One,
                _ => FloatPredicate::Oeq,
            };
            compiler.builder().build_fcmp(predicate, lhs, rhs)
        }
        _ => {
            let predicate = match op {
                BinaryOp::Greater => IntPredicate::Sgt,
                BinaryOp::Less => IntPredicate::Slt,
                BinaryOp::GreaterEquals => IntPredicate::Sge,
                BinaryOp::LessEquals => IntPredicate::Sle,
                BinaryOp::NotEquals => IntPredicate::Ne,
                _ => IntPredicate::Eq,
            };
            compiler.builder().build_icmp(predicate, lhs, rhs)
        }
    };

    Ok(value)
}

/// Converts `value` to `to`: `fptoui` towards integers, `uitofp` towards
/// `double`, `zext` from booleans.
pub fn coerce(
    compiler: &mut Compiler,
    value: Value,
    to: &IrType,
    line: u32,
) -> Result<Value, CodegenError> {
    let from = value.ty();
    if &from == to {
        return Ok(value);
    }

    let op = match (&from, to) {
        (IrType::Double, IrType::I32) => CastOp::FpToUi,
        (IrType::I32 | IrType::I1, IrType::Double) => CastOp::UiToFp,
        (IrType::I1, IrType::I32) => CastOp::ZExt,
        _ => {
            return Err(CodegenError::InvalidConversion {
                from: from.to_string(),
                to: to.to_string(),
                line,
            })
        }
    };

    Ok(compiler.builder().build_cast(op, value, to.clone()))
}

/// Widens an `i1` to `i32`; other values pass through.
pub fn widen_bool(compiler: &mut Compiler, value: Value) -> Value {
    if value.ty() == IrType::I1 {
        compiler.builder().build_cast(CastOp::ZExt, value, IrType::I32)
    } else {
        value
    }
}

/// `value != 0` in the value's own type.
pub fn is_nonzero(compiler: &mut Compiler, value: Value) -> Value {
    compare_zero(compiler, value, IntPredicate::Ne, FloatPredicate::One)
}

/// `value == 0` in the value's own type.
pub fn is_zero(compiler: &mut Compiler, value: Value) -> Value {
    compare_zero(compiler, value, IntPredicate::Eq, FloatPredicate::Oeq)
}

fn compare_zero(
    compiler: &mut Compiler,
    value: Value,
    int: IntPredicate,
    float: FloatPredicate,
) -> Value {
    let zero = Value::zero(&value.ty());
    if value.ty().is_float() {
        compiler.builder().build_fcmp(float, value, zero)
    } else {
        compiler.builder().build_icmp(int, value, zero)
    }
}
