//! Integration tests for end-to-end compilation.
//!
//! These tests drive the whole pipeline from T++ source through scanning,
//! parsing, semantic analysis and code generation down to LLVM IR text.

use std::fs;

use tppc::{
    ast::ast::AstNode,
    backend::{Backend, TextBackend},
    check_program, compile_source,
    errors::diagnostics::SemanticIssue,
    ir::Instruction,
    parse_source, CompileOptions, PipelineError,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn compile_ok(source: &str) -> tppc::ir::Module {
    init_logger();
    match compile_source(source, &CompileOptions::default()) {
        Ok(module) => module,
        Err(error) => panic!("compilation failed: {:?}", error),
    }
}

const FATORIAL: &str = "\
{ fatorial iterativo }
inteiro: n

inteiro fatorial(inteiro: n)
  inteiro: fat
  se n > 0 então
    fat := 1
    repita
      fat := fat * n
      n := n - 1
    até n = 0
    retorna(fat)
  senão
    retorna(0)
  fim
fim

inteiro principal()
  leia(n)
  escreva(fatorial(n))
  retorna(0)
fim
";

#[test]
fn test_compile_factorial_program() {
    let module = compile_ok(FATORIAL);
    let text = module.to_string();

    assert!(text.starts_with("; ModuleID = 'module'\n"));
    assert!(text.contains("@n = common global i32 0, align 4"));
    assert!(text.contains("define i32 @fatorial(i32 %n) {"));
    assert!(text.contains("define i32 @principal() {"));
    assert!(text.contains("define i32 @main() {"));
    assert!(text.contains("call i32 (i8*, ...) @scanf(i8* %t0, i32* @n)"));
    assert!(text.contains("declare i32 @printf(i8*, ...)"));
    assert!(text.contains("declare i32 @scanf(i8*, ...)"));
    assert!(module.verify().is_ok());
}

#[test]
fn test_module_named_after_source_file() {
    init_logger();
    let options = CompileOptions::for_path(std::path::Path::new("programas/fatorial.tpp"));
    let module = compile_source(FATORIAL, &options).unwrap();

    assert!(module
        .to_string()
        .starts_with("; ModuleID = 'fatorial.tpp'\nsource_filename = \"fatorial.tpp\"\n"));
}

#[test]
fn test_every_block_is_terminated() {
    let module = compile_ok(FATORIAL);

    for function in &module.functions {
        for block in &function.blocks {
            assert!(
                block.is_terminated(),
                "block {} of {} is open",
                block.label,
                function.name
            );
        }
    }
}

#[test]
fn test_repeat_body_runs_before_condition() {
    let module = compile_ok(
        "inteiro principal()\n\
           inteiro: x\n\
           x := 0\n\
           repita\n\
             escreva(x)\n\
           até x = 0\n\
           retorna(x)\n\
         fim",
    );
    let principal = module.get_function("principal").unwrap();

    let entry = &principal.blocks[0];
    assert!(matches!(
        entry.terminator(),
        Some(Instruction::Branch { target }) if target == "repita"
    ));

    let body = principal.block("repita").unwrap();
    assert!(body
        .instructions
        .iter()
        .any(|i| matches!(i, Instruction::Call { callee, .. } if callee == "printf")));
    assert_eq!(principal.predecessors("repita.fim"), vec!["repita"]);
}

#[test]
fn test_if_without_else_merges_both_paths() {
    let module = compile_ok(
        "principal()\n\
           inteiro: a\n\
           leia(a)\n\
           se a <> 0 então\n\
             escreva(a)\n\
           fim\n\
         fim",
    );
    let principal = module.get_function("principal").unwrap();

    let conditional = principal
        .blocks
        .iter()
        .filter(|b| matches!(b.terminator(), Some(Instruction::CondBranch { .. })))
        .count();
    assert_eq!(conditional, 1);
    assert_eq!(principal.predecessors("se.fim").len(), 2);
}

#[test]
fn test_type_mismatch_is_only_a_warning() {
    init_logger();
    let parsed = parse_source(
        "principal()\n\
           inteiro: a\n\
           flutuante: b\n\
           a := 1.5\n\
           b := 2\n\
           escreva(a)\n\
           escreva(b)\n\
         fim",
    );
    assert!(parsed.is_ok());

    let ctx = check_program(&parsed.program);
    assert_eq!(
        ctx.diagnostics
            .count(|issue| matches!(issue, SemanticIssue::TypeMismatch { .. })),
        2
    );
    assert!(!ctx.is_fatal());

    let module = compile_ok(
        "principal()\n\
           inteiro: a\n\
           a := 1.5\n\
           escreva(a)\n\
         fim",
    );
    assert!(module.to_string().contains("fptoui double 0x3FF8000000000000 to i32"));
}

#[test]
fn test_missing_entry_point_refuses_codegen() {
    init_logger();
    match compile_source("f()\n  escreva(1)\nfim", &CompileOptions::default()) {
        Err(PipelineError::Semantic(ctx)) => {
            assert_eq!(
                ctx.diagnostics
                    .count(|issue| matches!(issue, SemanticIssue::MissingEntryPoint { .. })),
                1
            );
        }
        other => panic!("unexpected result {:?}", other.map(|m| m.to_string())),
    }
}

#[test]
fn test_too_few_arguments_refuses_codegen() {
    init_logger();
    let result = compile_source(
        "inteiro soma(inteiro: a, inteiro: b)\n\
           retorna(a + b)\n\
         fim\n\
         principal()\n\
           escreva(soma(1))\n\
         fim",
        &CompileOptions::default(),
    );

    assert!(matches!(result, Err(PipelineError::Semantic(_))));
}

#[test]
fn test_syntax_errors_stop_the_pipeline() {
    init_logger();
    let result = compile_source(
        "principal()\n\
           escreva(1\n\
         fim",
        &CompileOptions::default(),
    );

    match result {
        Err(PipelineError::Syntax(errors)) => assert!(!errors.is_empty()),
        other => panic!("unexpected result {:?}", other.map(|m| m.to_string())),
    }
}

#[test]
fn test_lexical_errors_stop_the_pipeline() {
    init_logger();
    let result = compile_source("principal()\n  escreva(1) $\nfim", &CompileOptions::default());

    assert!(matches!(result, Err(PipelineError::Syntax(_))));
}

#[test]
fn test_ast_views() {
    init_logger();
    let parsed = parse_source(FATORIAL);
    assert!(parsed.is_ok());

    let tree = AstNode::from(&parsed.program);
    assert_eq!(tree.kind, "program");
    assert_eq!(tree.children.len(), 3);

    let dot = tree.to_dot();
    assert!(dot.starts_with("digraph ast {"));
    assert!(dot.contains("fatorial"));
}

#[test]
fn test_text_backend_output() {
    let module = compile_ok(FATORIAL);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.ll");

    TextBackend.emit(&module, &path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, module.to_string());
    assert!(written.ends_with("declare i32 @printf(i8*, ...)\n"));
}
