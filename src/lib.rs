#![allow(clippy::module_inception)]

//! `tppc`, a compiler for the T++ teaching language.
//!
//! The pipeline is scan → parse → resolve → check returns → generate →
//! emit. Each stage is usable on its own through its module; the helpers
//! below chain them the way the `tppc` binary does.

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::{
    ast::ast::Program,
    compiler::compiler::{CodegenError, Compiler},
    errors::errors::Error,
    ir::Module,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{context::CompilationContext, type_checker::analyze},
};

pub mod ast;
pub mod backend;
pub mod compiler;
pub mod errors;
pub mod ir;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod toolchain;
pub mod type_checker;

extern crate regex;

/// Settings of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name recorded in the IR module header.
    pub module_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            module_name: String::from("module"),
        }
    }
}

impl CompileOptions {
    /// Names the module after the source file.
    pub fn for_path(path: &Path) -> Self {
        let module_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| CompileOptions::default().module_name);
        CompileOptions { module_name }
    }
}

/// The front end's result: the tree plus every lexical and syntax error.
#[derive(Debug)]
pub struct ParsedSource {
    pub program: Program,
    /// Lexical errors, brace imbalance errors, then syntax errors.
    pub errors: Vec<Error>,
}

impl ParsedSource {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn parse_source(source: &str) -> ParsedSource {
    let lexed = tokenize(source);
    debug!(
        "scanned {} tokens, {} lexical errors",
        lexed.tokens.len(),
        lexed.errors.len()
    );

    let (program, parse_errors) = parse(lexed.tokens);
    debug!(
        "parsed {} declarations, {} syntax errors",
        program.declarations.len(),
        parse_errors.len()
    );

    let mut errors = lexed.errors;
    errors.extend(parse_errors);
    ParsedSource { program, errors }
}

/// Runs scope resolution and return checking.
pub fn check_program(program: &Program) -> CompilationContext {
    let ctx = analyze(program);
    info!(
        "semantic analysis: {} warning(s), {} error(s)",
        ctx.diagnostics.warnings().count(),
        ctx.diagnostics.errors().count()
    );
    ctx
}

pub fn generate_module(
    program: &Program,
    ctx: &CompilationContext,
    options: &CompileOptions,
) -> Result<Module, CodegenError> {
    let module = Compiler::new(&options.module_name).compile(program, ctx)?;
    info!(
        "generated module '{}' with {} function(s)",
        module.name,
        module.functions.len()
    );
    Ok(module)
}

/// Why [`compile_source`] stopped.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} lexical/syntax error(s)", .0.len())]
    Syntax(Vec<Error>),
    #[error("semantic analysis reported fatal errors")]
    Semantic(CompilationContext),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// Source text to IR module, stopping at the first failing stage.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<Module, PipelineError> {
    let parsed = parse_source(source);
    if !parsed.is_ok() {
        return Err(PipelineError::Syntax(parsed.errors));
    }

    let ctx = check_program(&parsed.program);
    if ctx.is_fatal() {
        return Err(PipelineError::Semantic(ctx));
    }

    Ok(generate_module(&parsed.program, &ctx, options)?)
}
