use crate::{
    ast::{
        expressions::{Expr, VarRef},
        statements::{Assignment, Declaration, FunctionDecl, Param, Stmt, VarDecl},
        types::ScalarType,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    expr::parse_expr,
    lookups::BindingPower,
    parser::Parser,
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let kind = parser.current_token_kind();
    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        return handler(parser);
    }

    let expression = parse_expr(parser, BindingPower::Default)?;

    if parser.current_token_kind() != TokenKind::Assignment {
        return Ok(Stmt::Expression(expression));
    }

    let line = parser.current_token().line;
    let target = match expression {
        Expr::Variable(var) => var,
        _ => return Err(Error::new(ErrorImpl::InvalidAssignmentTarget, line)),
    };
    parser.advance();
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Assignment(Assignment {
        line: target.line,
        target,
        value,
    }))
}

/// Parses statements until one of `terminators` is current. The terminator
/// itself is left for the caller to consume.
pub fn parse_body(
    parser: &mut Parser,
    terminators: &[TokenKind],
    construct: &str,
    terminator: &'static str,
) -> Result<Vec<Stmt>, Error> {
    let mut body = vec![];

    while !terminators.contains(&parser.current_token_kind()) {
        if !parser.has_tokens() {
            return Err(Error::new(
                ErrorImpl::MissingEnd {
                    construct: construct.to_string(),
                    terminator,
                },
                parser.current_token().line,
            ));
        }

        let start = parser.pos();
        match parse_stmt(parser) {
            Ok(stmt) => body.push(stmt),
            Err(error) => {
                parser.record(error);
                parser.synchronize(start);
            }
        }
    }

    Ok(body)
}

fn parse_type(parser: &mut Parser) -> Result<ScalarType, Error> {
    match parser.current_token_kind() {
        TokenKind::Int => {
            parser.advance();
            Ok(ScalarType::Int32)
        }
        TokenKind::Float => {
            parser.advance();
            Ok(ScalarType::Float64)
        }
        _ => Err(parser.unexpected()),
    }
}

/// `ident {'[' expr ']'}`
pub fn parse_var_ref(parser: &mut Parser) -> Result<VarRef, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    let mut var = VarRef::scalar(&token.value, token.line);

    while parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        var.indices.push(parse_expr(parser, BindingPower::Default)?);
        parser.expect(TokenKind::CloseBracket)?;
    }

    Ok(var)
}

fn parse_var_decl(parser: &mut Parser) -> Result<VarDecl, Error> {
    let line = parser.current_token().line;
    let var_type = parse_type(parser)?;
    parser.expect(TokenKind::Colon)?;

    let mut variables = vec![parse_var_ref(parser)?];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        variables.push(parse_var_ref(parser)?);
    }

    Ok(VarDecl {
        var_type,
        variables,
        line,
    })
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::VarDecl(parse_var_decl(parser)?))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let line = parser.advance().line;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;

    let then_body = parse_body(parser, &[TokenKind::Else, TokenKind::End], "'se'", "fim")?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(parse_body(parser, &[TokenKind::End], "'senão'", "fim")?)
    } else {
        None
    };
    parser.expect(TokenKind::End)?;

    Ok(Stmt::If {
        condition,
        then_body,
        else_body,
        line,
    })
}

pub fn parse_repeat_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let line = parser.advance().line;
    let body = parse_body(parser, &[TokenKind::Until], "'repita'", "até")?;
    parser.expect(TokenKind::Until)?;
    let condition = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Repeat {
        body,
        condition,
        line,
    })
}

pub fn parse_read_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let line = parser.advance().line;
    parser.expect(TokenKind::OpenParen)?;
    let target = parse_var_ref(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Stmt::Read { target, line })
}

pub fn parse_write_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let line = parser.advance().line;
    parser.expect(TokenKind::OpenParen)?;
    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Stmt::Write { value, line })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let line = parser.advance().line;
    parser.expect(TokenKind::OpenParen)?;
    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Stmt::Return { value, line })
}

/// `tipo ':' ident {'[' ']'}`
fn parse_param(parser: &mut Parser) -> Result<Param, Error> {
    let line = parser.current_token().line;
    let param_type = parse_type(parser)?;
    parser.expect(TokenKind::Colon)?;
    let name = parser.expect(TokenKind::Identifier)?.value;

    let mut is_array = false;
    while parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        parser.expect(TokenKind::CloseBracket)?;
        is_array = true;
    }

    Ok(Param {
        name,
        param_type,
        is_array,
        line,
    })
}

fn parse_function_decl(
    parser: &mut Parser,
    return_type: Option<ScalarType>,
    line: u32,
) -> Result<FunctionDecl, Error> {
    let name = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        params.push(parse_param(parser)?);
        while parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            params.push(parse_param(parser)?);
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let construct = format!("função '{}'", name);
    let body = parse_body(parser, &[TokenKind::End], &construct, "fim")?;
    parser.expect(TokenKind::End)?;

    Ok(FunctionDecl {
        name,
        return_type,
        params,
        body,
        line,
    })
}

/// Parses one top-level declaration: a variable declaration, a global
/// initialization or a function.
pub fn parse_declaration(parser: &mut Parser) -> Result<Declaration, Error> {
    let line = parser.current_token().line;

    match (parser.current_token_kind(), parser.peek_kind()) {
        (TokenKind::Int | TokenKind::Float, TokenKind::Colon) => {
            Ok(Declaration::Variables(parse_var_decl(parser)?))
        }
        (TokenKind::Int | TokenKind::Float, TokenKind::Identifier) => {
            let return_type = parse_type(parser)?;
            Ok(Declaration::Function(parse_function_decl(
                parser,
                Some(return_type),
                line,
            )?))
        }
        (TokenKind::Identifier, TokenKind::OpenParen) => {
            Ok(Declaration::Function(parse_function_decl(parser, None, line)?))
        }
        (TokenKind::Identifier, _) => {
            let target = parse_var_ref(parser)?;
            parser.expect(TokenKind::Assignment)?;
            let value = parse_expr(parser, BindingPower::Default)?;
            Ok(Declaration::Initialization(Assignment {
                target,
                value,
                line,
            }))
        }
        (TokenKind::Int | TokenKind::Float, _) => {
            parser.advance();
            Err(parser.unexpected())
        }
        _ => Err(parser.unexpected()),
    }
}
