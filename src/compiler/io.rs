//! Lowering of `escreva` and `leia` onto the C library's `printf` and
//! `scanf`.
//!
//! Every call site gets its own private format constant (`@escreva.N`,
//! `@leia.N`).

use crate::{
    ast::expressions::{Expr, VarRef},
    ir::{FunctionType, IrType, Value},
};

use super::{
    compiler::{CodegenError, Compiler},
    expr::{gen_address, gen_expression, widen_bool},
};

fn variadic_io() -> FunctionType {
    FunctionType {
        return_type: IrType::I32,
        params: vec![IrType::I8.ptr()],
        variadic: true,
    }
}

/// Adds a format string constant and returns an `i8*` to its first byte.
fn format_pointer(compiler: &mut Compiler, prefix: &str, format: &[u8]) -> Value {
    let constant = compiler.module.add_string_constant(prefix, format);
    compiler
        .builder()
        .build_gep(constant, vec![Value::i32(0), Value::i32(0)])
}

pub fn gen_write(compiler: &mut Compiler, value: &Expr, line: u32) -> Result<(), CodegenError> {
    let value = gen_expression(compiler, value)?;
    let value = widen_bool(compiler, value);

    let format: &[u8] = match value.ty() {
        IrType::Double => b"%lf\n\0",
        IrType::I32 => b"%d\n\0",
        other => {
            return Err(CodegenError::InvalidConversion {
                from: other.to_string(),
                to: String::from("a printable number"),
                line,
            })
        }
    };

    let format = format_pointer(compiler, "escreva", format);
    compiler.module.declare_function("printf", variadic_io());
    compiler
        .builder()
        .build_call("printf", variadic_io(), vec![format, value]);
    Ok(())
}

pub fn gen_read(compiler: &mut Compiler, target: &VarRef, line: u32) -> Result<(), CodegenError> {
    let address = gen_address(compiler, target)?;

    let format: &[u8] = match address.ty().pointee() {
        Some(IrType::Double) => b"%lf\0",
        Some(IrType::I32) => b"%d\0",
        _ => {
            return Err(CodegenError::NotAScalar {
                name: target.name.clone(),
                line,
            })
        }
    };

    let format = format_pointer(compiler, "leia", format);
    compiler.module.declare_function("scanf", variadic_io());
    compiler
        .builder()
        .build_call("scanf", variadic_io(), vec![format, address]);
    Ok(())
}
