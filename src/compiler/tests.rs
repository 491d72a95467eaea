use crate::{
    ast::ast::Program,
    ir::{Function, Instruction, Module},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{context::CompilationContext, type_checker::analyze},
};

use super::compiler::{generate, CodegenError};

fn parse_program(source: &str) -> Program {
    let _ = env_logger::builder().is_test(true).try_init();

    let lexed = tokenize(source);
    assert!(!lexed.has_errors(), "{:?}", lexed.errors);
    let (program, errors) = parse(lexed.tokens);
    assert!(errors.is_empty(), "{:?}", errors);
    program
}

fn compile_source(source: &str) -> Result<Module, CodegenError> {
    let program = parse_program(source);
    let ctx = analyze(&program);
    generate(&program, &ctx)
}

/// Lowers without analysis, for programs the analyzer would stop.
fn compile_unchecked(source: &str) -> Result<Module, CodegenError> {
    let program = parse_program(source);
    generate(&program, &CompilationContext::new())
}

fn compile_text(source: &str) -> String {
    match compile_source(source) {
        Ok(module) => module.to_string(),
        Err(error) => panic!("code generation failed: {}", error),
    }
}

fn function<'m>(module: &'m Module, name: &str) -> &'m Function {
    module
        .get_function(name)
        .unwrap_or_else(|| panic!("no function '{}'", name))
}

fn conditional_branches(function: &Function) -> usize {
    function
        .blocks
        .iter()
        .filter(|b| matches!(b.terminator(), Some(Instruction::CondBranch { .. })))
        .count()
}

#[test]
fn test_globals() {
    let text = compile_text(
        "inteiro: n\n\
         flutuante: v[3], g\n\
         n := 5\n\
         g := -1.5\n\
         inteiro principal()\n\
           v[0] := g\n\
           retorna(n)\n\
         fim",
    );

    assert!(text.contains("@n = global i32 5, align 4"));
    assert!(text.contains("@v = common global [3 x double] zeroinitializer, align 8"));
    assert!(text.contains("@g = global double 0xBFF8000000000000, align 8"));
    assert!(text.contains("getelementptr inbounds [3 x double], [3 x double]* @v, i32 0, i32 0"));
}

#[test]
fn test_global_initializer_converts_to_global_type() {
    let text = compile_text(
        "inteiro: n\n\
         n := 2.9\n\
         inteiro principal()\n\
           retorna(n)\n\
         fim",
    );

    assert!(text.contains("@n = global i32 2, align 4"));
}

#[test]
fn test_function_with_parameters() {
    let text = compile_text(
        "inteiro dobro(inteiro: x)\n\
           retorna(x + x)\n\
         fim\n\
         inteiro principal()\n\
           retorna(dobro(2))\n\
         fim",
    );

    let expected = "define i32 @dobro(i32 %x) {\n\
                    entry:\n  \
                      %x.addr = alloca i32, align 4\n  \
                      %retorno = alloca i32, align 4\n  \
                      store i32 %x, i32* %x.addr\n  \
                      store i32 0, i32* %retorno\n  \
                      %t0 = load i32, i32* %x.addr\n  \
                      %t1 = load i32, i32* %x.addr\n  \
                      %t2 = add i32 %t0, %t1\n  \
                      store i32 %t2, i32* %retorno\n  \
                      br label %saida\n\
                    \n\
                    saida:\n  \
                      %t3 = load i32, i32* %retorno\n  \
                      ret i32 %t3\n\
                    }\n";
    assert!(text.contains(expected), "{}", text);
    assert!(text.contains("call i32 @dobro(i32 2)"));
}

#[test]
fn test_entry_wrapper() {
    let module = compile_source("principal()\nfim").unwrap();
    let text = module.to_string();

    assert!(text.contains("define i32 @main() {\nentry:\n  call void @principal()\n  ret i32 0\n}"));

    let module = compile_source("flutuante principal()\n  retorna(1.5)\nfim").unwrap();
    let text = module.to_string();
    assert!(text.contains("  %t0 = call double @principal()\n  %t1 = fptoui double %t0 to i32\n  ret i32 %t1\n"));
}

#[test]
fn test_write_float() {
    let text = compile_text(
        "principal()\n\
           flutuante: f\n\
           f := 2.5\n\
           escreva(f)\n\
         fim",
    );

    assert!(text.contains("%f = alloca double, align 8"));
    assert!(text.contains("store double 0x4004000000000000, double* %f"));
    assert!(text.contains(
        "@escreva.0 = private unnamed_addr constant [5 x i8] c\"%lf\\0A\\00\", align 1"
    ));
    assert!(text.contains("call i32 (i8*, ...) @printf(i8* %t1, double %t0)"));
    assert!(text.contains("declare i32 @printf(i8*, ...)"));
}

#[test]
fn test_each_write_gets_its_own_format() {
    let text = compile_text(
        "principal()\n\
           escreva(1)\n\
           escreva(2)\n\
         fim",
    );

    assert!(text.contains("@escreva.0 = "));
    assert!(text.contains("@escreva.1 = "));
    assert_eq!(text.matches("declare i32 @printf").count(), 1);
}

#[test]
fn test_read_integer() {
    let text = compile_text(
        "principal()\n\
           inteiro: n\n\
           leia(n)\n\
           escreva(n)\n\
         fim",
    );

    assert!(text.contains("@leia.0 = private unnamed_addr constant [3 x i8] c\"%d\\00\", align 1"));
    assert!(text.contains("%t0 = getelementptr inbounds [3 x i8], [3 x i8]* @leia.0, i32 0, i32 0"));
    assert!(text.contains("call i32 (i8*, ...) @scanf(i8* %t0, i32* %n)"));
    assert!(text.contains("declare i32 @scanf(i8*, ...)"));
}

#[test]
fn test_repeat_enters_body_unconditionally() {
    let module = compile_source(
        "principal()\n\
           inteiro: x\n\
           x := 3\n\
           repita\n\
             escreva(x)\n\
             x := x - 1\n\
           até x = 0\n\
         fim",
    )
    .unwrap();
    let principal = function(&module, "principal");

    assert!(matches!(
        principal.blocks[0].terminator(),
        Some(Instruction::Branch { target }) if target == "repita"
    ));
    match principal.block("repita").and_then(|b| b.terminator()) {
        Some(Instruction::CondBranch {
            then_block,
            else_block,
            ..
        }) => {
            assert_eq!(then_block, "repita");
            assert_eq!(else_block, "repita.fim");
        }
        other => panic!("unexpected terminator {:?}", other),
    }

    let text = module.to_string();
    assert!(text.contains("= icmp eq i32 %"));
    assert!(text.contains(", false\n  br i1 %"));
}

#[test]
fn test_if_without_else() {
    let module = compile_source(
        "principal()\n\
           inteiro: x\n\
           x := 1\n\
           se x > 0 então\n\
             escreva(x)\n\
           fim\n\
         fim",
    )
    .unwrap();
    let principal = function(&module, "principal");

    assert_eq!(conditional_branches(principal), 1);
    let mut preds = principal.predecessors("se.fim");
    preds.sort();
    assert_eq!(preds, vec!["entry", "se.entao"]);
    assert!(principal.blocks.iter().all(|b| b.is_terminated()));
    assert!(module.to_string().contains("icmp sgt i32"));
}

#[test]
fn test_if_with_else() {
    let module = compile_source(
        "principal()\n\
           flutuante: x\n\
           x := 1.0\n\
           se x então\n\
             escreva(1)\n\
           senão\n\
             escreva(2)\n\
           fim\n\
         fim",
    )
    .unwrap();
    let principal = function(&module, "principal");

    assert_eq!(conditional_branches(principal), 1);
    let mut preds = principal.predecessors("se.fim");
    preds.sort();
    assert_eq!(preds, vec!["se.entao", "se.senao"]);
    assert!(module.to_string().contains("fcmp one double %t0, 0x0000000000000000"));
}

#[test]
fn test_mixed_arithmetic_promotes_to_double() {
    let text = compile_text(
        "principal()\n\
           inteiro: a\n\
           flutuante: b\n\
           a := 1\n\
           b := 2.0\n\
           escreva(a + b)\n\
         fim",
    );

    assert!(text.contains("uitofp i32 %t0 to double"));
    assert!(text.contains("fadd double"));
}

#[test]
fn test_assignment_conversions() {
    let text = compile_text(
        "principal()\n\
           inteiro: a\n\
           flutuante: b\n\
           a := 2.5\n\
           b := a\n\
           a := a / 2\n\
           a := -a\n\
           b := b * (a > 1)\n\
         fim",
    );

    assert!(text.contains("fptoui double 0x4004000000000000 to i32"));
    assert!(text.contains("uitofp i32"));
    assert!(text.contains("udiv i32"));
    assert!(text.contains("sub i32 0, %"));
    assert!(text.contains("zext i1"));
}

#[test]
fn test_float_comparison_uses_ordered_predicates() {
    let text = compile_text(
        "principal()\n\
           flutuante: b\n\
           b := 2.0\n\
           se b <= 1.0 então\n\
             escreva(b)\n\
           fim\n\
         fim",
    );

    assert!(text.contains("fcmp ole double"));
}

#[test]
fn test_logical_operators() {
    let text = compile_text(
        "principal()\n\
           inteiro: a\n\
           a := 1\n\
           se a > 0 && a < 10 então\n\
             escreva(a)\n\
           fim\n\
         fim",
    );

    assert!(text.contains("and i1"));
}

#[test]
fn test_local_array() {
    let text = compile_text(
        "principal()\n\
           inteiro: v[10]\n\
           v[2] := 5\n\
           escreva(v[2])\n\
         fim",
    );

    assert!(text.contains("%v = alloca [10 x i32], align 4"));
    assert!(text.contains("getelementptr inbounds [10 x i32], [10 x i32]* %v, i32 0, i32 2"));
}

#[test]
fn test_array_parameter() {
    let text = compile_text(
        "soma(inteiro: v[])\n\
           escreva(v[0])\n\
         fim\n\
         principal()\n\
           inteiro: a[3]\n\
           soma(a)\n\
         fim",
    );

    assert!(text.contains("define void @soma(i32* %v) {"));
    assert!(text.contains("%v.addr = alloca i32*, align 8"));
    assert!(text.contains("store i32* %v, i32** %v.addr"));
    assert!(text.contains("getelementptr inbounds i32, i32* %t0, i32 0"));
    assert!(text.contains("getelementptr inbounds [3 x i32], [3 x i32]* %a, i32 0, i32 0"));
    assert!(text.contains("call void @soma(i32* %t0)"));
}

#[test]
fn test_extra_arguments_are_not_passed() {
    let text = compile_text(
        "f(inteiro: a)\n\
           escreva(a)\n\
         fim\n\
         principal()\n\
           f(1, 2)\n\
         fim",
    );

    assert!(text.contains("call void @f(i32 1)"));
}

#[test]
fn test_return_skips_rest_of_body() {
    let module = compile_source(
        "inteiro principal()\n\
           retorna(1)\n\
           escreva(2)\n\
         fim",
    )
    .unwrap();

    assert!(module.declarations.is_empty());
    assert!(module.to_string().contains("store i32 1, i32* %retorno"));
}

#[test]
fn test_locals_shadow_globals() {
    let text = compile_text(
        "inteiro: x\n\
         principal()\n\
           flutuante: x\n\
           x := 1.5\n\
           escreva(x)\n\
         fim",
    );

    assert!(text.contains("store double 0x3FF8000000000000, double* %x"));
    assert!(!text.contains("@x)"));
}

#[test]
fn test_non_ascii_names_are_quoted() {
    let text = compile_text(
        "principal()\n\
           inteiro: número\n\
           número := 1\n\
           escreva(número)\n\
         fim",
    );

    assert!(text.contains("%\"n\\C3\\BAmero\" = alloca i32, align 4"));
}

#[test]
fn test_refuses_fatal_context() {
    assert_eq!(
        compile_source("f()\nfim").unwrap_err(),
        CodegenError::FatalDiagnostics
    );
}

#[test]
fn test_duplicate_function_is_a_fault() {
    let result = compile_source(
        "f()\nfim\n\
         f()\nfim\n\
         principal()\n\
           f()\n\
         fim",
    );

    assert!(matches!(
        result,
        Err(CodegenError::DuplicateFunction { ref name, .. }) if name == "f"
    ));
}

#[test]
fn test_non_constant_global_initializer_is_a_fault() {
    let result = compile_source(
        "inteiro: a, b\n\
         a := b\n\
         principal()\n\
           escreva(a)\n\
         fim",
    );

    assert!(matches!(
        result,
        Err(CodegenError::NonConstantGlobalInitializer { ref name, .. }) if name == "a"
    ));
}

#[test]
fn test_generated_modules_verify() {
    let module = compile_source(
        "inteiro fatorial(inteiro: n)\n\
           inteiro: r\n\
           r := 1\n\
           repita\n\
             r := r * n\n\
             n := n - 1\n\
           até n <= 1\n\
           retorna(r)\n\
         fim\n\
         principal()\n\
           inteiro: x\n\
           leia(x)\n\
           se x > 0 então\n\
             escreva(fatorial(x))\n\
           senão\n\
             escreva(0)\n\
           fim\n\
         fim",
    )
    .unwrap();

    assert!(module.verify().is_ok());
    for function in &module.functions {
        assert!(function.blocks.iter().all(|b| b.is_terminated()));
    }
}

#[test]
fn test_call_converts_arguments_to_parameter_types() {
    let text = compile_text(
        "flutuante meio(flutuante: v)\n\
           retorna(v / 2)\n\
         fim\n\
         principal()\n\
           escreva(meio(3))\n\
         fim",
    );

    assert!(text.contains("define double @meio(double %v) {"));
    assert!(text.contains("  %t0 = uitofp i32 3 to double\n  %t1 = call double @meio(double %t0)\n"));
}

#[test]
fn test_redeclared_global_before_use_keeps_one_definition() {
    let text = compile_text(
        "inteiro: x\n\
         flutuante: x\n\
         principal()\n\
           x := 1.5\n\
           escreva(x)\n\
         fim",
    );

    assert!(text.contains("@x = common global double 0x0000000000000000, align 8"));
    assert!(!text.contains("@x.1"));
    assert!(text.contains("store double 0x3FF8000000000000, double* @x"));
}

#[test]
fn test_redeclared_global_after_use_gets_new_definition() {
    let module = compile_source(
        "inteiro: x\n\
         p()\n\
           x := 1\n\
           escreva(x)\n\
         fim\n\
         flutuante: x\n\
         inteiro principal()\n\
           x := 2.5\n\
           p()\n\
           retorna(0)\n\
         fim",
    )
    .unwrap();
    let text = module.to_string();

    assert!(text.contains("@x = common global i32 0, align 4"));
    assert!(text.contains("@x.1 = common global double 0x0000000000000000, align 8"));
    assert!(text.contains("store i32 1, i32* @x\n"));
    assert!(text.contains("store double 0x4004000000000000, double* @x.1"));
    assert!(module.verify().is_ok());
}

#[test]
fn test_function_named_like_a_global_is_a_fault() {
    let result = compile_unchecked(
        "inteiro: soma\n\
         inteiro soma(inteiro: a)\n\
           retorna(a)\n\
         fim\n\
         principal()\n\
         fim",
    );

    assert!(matches!(
        result,
        Err(CodegenError::NameClash { ref name, line: 2 }) if name == "soma"
    ));

    let result = compile_unchecked(
        "principal()\n\
         fim\n\
         inteiro: principal",
    );

    assert!(matches!(
        result,
        Err(CodegenError::NameClash { ref name, line: 3 }) if name == "principal"
    ));
}

#[test]
fn test_io_function_names_are_reserved() {
    let result = compile_unchecked(
        "inteiro printf(inteiro: a)\n\
           retorna(a)\n\
         fim\n\
         principal()\n\
           escreva(printf(1))\n\
         fim",
    );

    assert!(matches!(
        result,
        Err(CodegenError::DuplicateFunction { ref name, .. }) if name == "printf"
    ));

    let result = compile_unchecked(
        "inteiro: scanf\n\
         principal()\n\
         fim",
    );

    assert!(matches!(
        result,
        Err(CodegenError::NameClash { ref name, .. }) if name == "scanf"
    ));
}
