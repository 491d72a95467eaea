//! Unit tests for the parser module.
//!
//! Covers declarations, function headers, every statement form, operator
//! precedence and associativity, and error recovery.

use crate::{
    ast::{
        ast::Program,
        expressions::Expr,
        statements::{Declaration, Stmt},
        types::{BinaryOp, Number, ScalarType, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
};

use super::parser::parse;

fn parse_source(source: &str) -> (Program, Vec<Error>) {
    let lexed = tokenize(source);
    assert!(!lexed.has_errors(), "unexpected lexical errors: {:?}", lexed.errors);
    parse(lexed.tokens)
}

fn parse_ok(source: &str) -> Program {
    let (program, errors) = parse_source(source);
    assert!(errors.is_empty(), "unexpected syntax errors: {:?}", errors);
    program
}

/// Parses `expr` as the right-hand side of an assignment inside `principal`.
fn parse_rhs(expr: &str) -> Expr {
    let program = parse_ok(&format!("principal()\n  x := {}\nfim", expr));
    let function = program.functions().next().unwrap();
    match &function.body[0] {
        Stmt::Assignment(assignment) => assignment.value.clone(),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let program = parse_ok("inteiro: a, b\nflutuante: v[10]");

    assert_eq!(program.declarations.len(), 2);
    match &program.declarations[0] {
        Declaration::Variables(decl) => {
            assert_eq!(decl.var_type, ScalarType::Int32);
            assert_eq!(decl.variables.len(), 2);
            assert_eq!(decl.variables[0].name, "a");
            assert_eq!(decl.variables[1].name, "b");
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
    match &program.declarations[1] {
        Declaration::Variables(decl) => {
            assert_eq!(decl.var_type, ScalarType::Float64);
            assert_eq!(decl.line, 2);
            assert_eq!(
                decl.variables[0].index(),
                Some(&Expr::Number {
                    value: Number::Int(10),
                    line: 2
                })
            );
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_global_initialization() {
    let program = parse_ok("inteiro: n\nn := 5");

    match &program.declarations[1] {
        Declaration::Initialization(assignment) => {
            assert_eq!(assignment.target.name, "n");
            assert_eq!(assignment.line, 2);
        }
        other => panic!("expected initialization, got {:?}", other),
    }
}

#[test]
fn test_parse_function_declaration() {
    let program = parse_ok(
        "inteiro soma(inteiro: a, flutuante: v[])\n  retorna(a)\nfim\nprincipal()\nfim",
    );

    let functions: Vec<_> = program.functions().collect();
    assert_eq!(functions.len(), 2);

    let soma = functions[0];
    assert_eq!(soma.name, "soma");
    assert_eq!(soma.return_type, Some(ScalarType::Int32));
    assert_eq!(soma.params.len(), 2);
    assert!(!soma.params[0].is_array);
    assert_eq!(soma.params[1].name, "v");
    assert_eq!(soma.params[1].param_type, ScalarType::Float64);
    assert!(soma.params[1].is_array);
    assert!(matches!(soma.body[0], Stmt::Return { .. }));

    let principal = functions[1];
    assert_eq!(principal.return_type, None);
    assert!(principal.params.is_empty());
    assert!(principal.body.is_empty());
    assert_eq!(principal.line, 4);
}

#[test]
fn test_parse_if_statement() {
    let program = parse_ok(
        "principal()\n  se x > 0 então\n    escreva(x)\n  senão\n    leia(x)\n  fim\nfim",
    );

    let function = program.functions().next().unwrap();
    match &function.body[0] {
        Stmt::If {
            condition,
            then_body,
            else_body,
            line,
        } => {
            assert!(matches!(
                condition,
                Expr::Binary {
                    op: BinaryOp::Greater,
                    ..
                }
            ));
            assert!(matches!(then_body[0], Stmt::Write { .. }));
            let else_body = else_body.as_ref().unwrap();
            assert!(matches!(else_body[0], Stmt::Read { .. }));
            assert_eq!(*line, 2);
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_parse_if_without_else() {
    let program = parse_ok("principal()\n  se x então\n    x := 1\n  fim\nfim");

    let function = program.functions().next().unwrap();
    assert!(matches!(
        function.body[0],
        Stmt::If {
            else_body: None,
            ..
        }
    ));
}

#[test]
fn test_parse_repeat_statement() {
    let program = parse_ok("principal()\n  repita\n    escreva(x)\n    x := x - 1\n  até x = 0\nfim");

    let function = program.functions().next().unwrap();
    match &function.body[0] {
        Stmt::Repeat {
            body, condition, ..
        } => {
            assert_eq!(body.len(), 2);
            assert!(matches!(
                condition,
                Expr::Binary {
                    op: BinaryOp::Equals,
                    ..
                }
            ));
        }
        other => panic!("expected repeat, got {:?}", other),
    }
}

#[test]
fn test_parse_statements_without_separators() {
    let program = parse_ok("principal()\n  a := 1 b := a f(a) escreva(b)\nfim");

    let function = program.functions().next().unwrap();
    assert_eq!(function.body.len(), 4);
    assert!(matches!(function.body[0], Stmt::Assignment(_)));
    assert!(matches!(function.body[1], Stmt::Assignment(_)));
    assert!(matches!(function.body[2], Stmt::Expression(Expr::Call { .. })));
    assert!(matches!(function.body[3], Stmt::Write { .. }));
}

#[test]
fn test_parse_indexed_assignment_and_read() {
    let program = parse_ok("principal()\n  v[i + 1] := v[i]\n  leia(v[0])\nfim");

    let function = program.functions().next().unwrap();
    match &function.body[0] {
        Stmt::Assignment(assignment) => {
            assert_eq!(assignment.target.name, "v");
            assert!(matches!(
                assignment.target.index(),
                Some(Expr::Binary {
                    op: BinaryOp::Add,
                    ..
                })
            ));
            match &assignment.value {
                Expr::Variable(var) => assert_eq!(var.indices.len(), 1),
                other => panic!("expected variable, got {:?}", other),
            }
        }
        other => panic!("expected assignment, got {:?}", other),
    }
    match &function.body[1] {
        Stmt::Read { target, .. } => assert_eq!(target.indices.len(), 1),
        other => panic!("expected read, got {:?}", other),
    }
}

#[test]
fn test_precedence_multiplicative_over_additive() {
    match parse_rhs("1 + 2 * 3") {
        Expr::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        )),
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_precedence_relational_over_logical() {
    match parse_rhs("a < b && c >= d") {
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOp::Less,
                    ..
                }
            ));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::GreaterEquals,
                    ..
                }
            ));
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_binary_operators_are_left_associative() {
    match parse_rhs("10 - 4 - 3") {
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOp::Sub,
                    ..
                }
            ));
            assert_eq!(
                *right,
                Expr::Number {
                    value: Number::Int(3),
                    line: 2
                }
            );
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_unary_binds_tighter_than_binary() {
    match parse_rhs("-a * b") {
        Expr::Binary {
            op: BinaryOp::Mul,
            left,
            ..
        } => assert!(matches!(
            *left,
            Expr::Unary {
                op: UnaryOp::Minus,
                ..
            }
        )),
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_grouping_and_calls() {
    match parse_rhs("(a + b) * f(1, g(2.5))") {
        Expr::Binary {
            op: BinaryOp::Mul,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            ));
            match *right {
                Expr::Call { name, args, .. } => {
                    assert_eq!(name, "f");
                    assert_eq!(args.len(), 2);
                    assert!(matches!(args[1], Expr::Call { .. }));
                }
                other => panic!("expected call, got {:?}", other),
            }
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_float_literal() {
    assert_eq!(
        parse_rhs("2.5e2"),
        Expr::Number {
            value: Number::Float(250.0),
            line: 2
        }
    );
}

#[test]
fn test_integer_literal_must_fit_32_bits() {
    assert_eq!(
        parse_rhs("2147483647"),
        Expr::Number {
            value: Number::Int(2147483647),
            line: 2
        }
    );

    let (_, errors) = parse_source("principal()\n  x := 3000000000\n  escreva(x)\nfim");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_line(), 2);
    assert_eq!(
        errors[0].get_kind(),
        &ErrorImpl::NumberParseError {
            token: "3000000000".to_string()
        }
    );
}

#[test]
fn test_syntax_error_recovery_reports_each_line() {
    let (program, errors) = parse_source(
        "principal()\n  x := * 2\n  y := 3\n  z := )\n  escreva(y)\nfim",
    );

    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e.get_kind(), ErrorImpl::UnexpectedToken { .. })));
    assert_eq!(errors[0].get_line(), 2);
    assert_eq!(errors[1].get_line(), 4);

    // The statements around the bad lines survive.
    let function = program.functions().next().unwrap();
    assert_eq!(function.body.len(), 2);
}

#[test]
fn test_missing_end() {
    let (_, errors) = parse_source("principal()\n  se x então\n    x := 1\n");

    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| matches!(
        e.get_kind(),
        ErrorImpl::MissingEnd { terminator: "fim", .. }
    )));
}

#[test]
fn test_missing_until() {
    let (_, errors) = parse_source("principal()\n  repita\n    x := 1\n");

    assert!(errors.iter().any(|e| matches!(
        e.get_kind(),
        ErrorImpl::MissingEnd { terminator: "até", .. }
    )));
}

#[test]
fn test_invalid_assignment_target() {
    let (_, errors) = parse_source("principal()\n  f(x) := 1\nfim");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get_kind(), &ErrorImpl::InvalidAssignmentTarget);
}

#[test]
fn test_unexpected_top_level_token() {
    let (program, errors) = parse_source("fim\nprincipal()\nfim");

    assert_eq!(errors.len(), 1);
    assert_eq!(program.functions().count(), 1);
}
