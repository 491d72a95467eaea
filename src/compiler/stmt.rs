use crate::{
    ast::{
        expressions::Expr,
        statements::{Assignment, Stmt, VarDecl},
    },
    ir::{IrType, Value},
};

use super::{
    compiler::{literal_length, scalar_type, CodegenError, Compiler, Storage},
    expr::{coerce, gen_address, gen_call, gen_expression, is_nonzero, is_zero},
    io::{gen_read, gen_write},
};

/// Lowers the statements of one body in order.
///
/// A `retorna` stores the return value and ends the body: the statements
/// after it are not lowered.
pub fn gen_body(compiler: &mut Compiler, body: &[Stmt]) -> Result<(), CodegenError> {
    for statement in body {
        gen_statement(compiler, statement)?;
        if matches!(statement, Stmt::Return { .. }) {
            break;
        }
    }
    Ok(())
}

pub fn gen_statement(compiler: &mut Compiler, statement: &Stmt) -> Result<(), CodegenError> {
    match statement {
        Stmt::VarDecl(decl) => gen_local_variables(compiler, decl),
        Stmt::Assignment(assignment) => gen_assignment(compiler, assignment),
        Stmt::Expression(Expr::Call { name, args, line }) => {
            gen_call(compiler, name, args, *line)?;
            Ok(())
        }
        Stmt::Expression(expression) => {
            gen_expression(compiler, expression)?;
            Ok(())
        }
        Stmt::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            let condition = gen_expression(compiler, condition)?;
            let condition = is_nonzero(compiler, condition);

            let region = compiler
                .builder()
                .begin_if(condition, else_body.is_some());
            compiler.push_scope();
            gen_body(compiler, then_body)?;
            if let Some(else_body) = else_body {
                compiler.builder().begin_else(&region);
                gen_body(compiler, else_body)?;
            }
            compiler.pop_scope();
            compiler.builder().finish_if(region);
            Ok(())
        }
        Stmt::Repeat {
            body, condition, ..
        } => {
            let region = compiler.builder().begin_loop();
            compiler.push_scope();
            gen_body(compiler, body)?;
            let condition = gen_expression(compiler, condition)?;
            compiler.pop_scope();

            // `repita ... até c` runs again while `c` is false.
            let repeat = is_zero(compiler, condition);
            compiler.builder().end_loop(region, repeat);
            Ok(())
        }
        Stmt::Read { target, line } => gen_read(compiler, target, *line),
        Stmt::Write { value, line } => gen_write(compiler, value, *line),
        Stmt::Return { value, line } => {
            let value = gen_expression(compiler, value)?;
            if let Some(slot) = compiler.return_slot.clone() {
                let ty = slot.ty().pointee().cloned().unwrap_or(IrType::I32);
                let value = coerce(compiler, value, &ty, *line)?;
                compiler.builder().build_store(value, slot);
            }
            Ok(())
        }
    }
}

fn gen_local_variables(compiler: &mut Compiler, decl: &VarDecl) -> Result<(), CodegenError> {
    let element = scalar_type(decl.var_type);

    for var in &decl.variables {
        match var.index() {
            Some(index) => {
                let len = literal_length(index).ok_or_else(|| CodegenError::InvalidArrayLength {
                    name: var.name.clone(),
                    line: var.line,
                })?;
                let slot = compiler.builder().build_alloca(element.array(len), &var.name);
                compiler.declare_local(&var.name, Storage::Array(slot));
            }
            None => {
                let slot = compiler.builder().build_alloca(element.clone(), &var.name);
                compiler
                    .builder()
                    .build_store(Value::zero(&element), slot.clone());
                compiler.declare_local(&var.name, Storage::Scalar(slot));
            }
        }
    }

    Ok(())
}

fn gen_assignment(compiler: &mut Compiler, assignment: &Assignment) -> Result<(), CodegenError> {
    let value = gen_expression(compiler, &assignment.value)?;
    let target = gen_address(compiler, &assignment.target)?;
    let ty = target.ty().pointee().cloned().unwrap_or(IrType::I32);
    let value = coerce(compiler, value, &ty, assignment.line)?;
    compiler.builder().build_store(value, target);
    Ok(())
}
