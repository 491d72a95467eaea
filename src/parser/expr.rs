use crate::{
    ast::{
        expressions::{Expr, VarRef},
        types::{BinaryOp, Number, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While the next token binds tighter than `bp`, keep extending the lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };
        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();
    match token.kind {
        TokenKind::IntLiteral => {
            // Integers are 32 bits wide in the generated code.
            let value = token
                .value
                .parse::<i32>()
                .map(i64::from)
                .map_err(|_| {
                    Error::new(
                        ErrorImpl::NumberParseError {
                            token: token.value.clone(),
                        },
                        token.line,
                    )
                })?;
            parser.advance();
            Ok(Expr::Number {
                value: Number::Int(value),
                line: token.line,
            })
        }
        TokenKind::FloatLiteral => {
            let value = token.value.parse::<f64>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    token.line,
                )
            })?;
            parser.advance();
            Ok(Expr::Number {
                value: Number::Float(value),
                line: token.line,
            })
        }
        TokenKind::Identifier => {
            parser.advance();
            Ok(Expr::Variable(VarRef::scalar(&token.value, token.line)))
        }
        _ => Err(parser.unexpected()),
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::GreaterEquals => BinaryOp::GreaterEquals,
        TokenKind::LessEquals => BinaryOp::LessEquals,
        TokenKind::Equals => BinaryOp::Equals,
        TokenKind::NotEquals => BinaryOp::NotEquals,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let op = match binary_op(parser.current_token_kind()) {
        Some(op) => op,
        None => return Err(parser.unexpected()),
    };
    let line = parser.advance().line;

    let right = parse_expr(parser, bp)?;

    Ok(Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        line,
    })
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let op = if operator_token.kind == TokenKind::Dash {
        UnaryOp::Minus
    } else {
        UnaryOp::Plus
    };
    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
        line: operator_token.line,
    })
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// Parses a comma-separated argument list; the opening `(` is current.
pub fn parse_arguments(parser: &mut Parser) -> Result<Vec<Expr>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Default)?);
        while parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            args.push(parse_expr(parser, BindingPower::Default)?);
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(args)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let (name, line) = match left {
        Expr::Variable(VarRef { name, indices, line }) if indices.is_empty() => (name, line),
        _ => return Err(parser.unexpected()),
    };

    let args = parse_arguments(parser)?;

    Ok(Expr::Call { name, args, line })
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let mut var = match left {
        Expr::Variable(var) => var,
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;
    var.indices.push(index);

    Ok(Expr::Variable(var))
}
