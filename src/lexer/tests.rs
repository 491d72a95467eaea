//! Unit tests for the lexer module.
//!
//! Covers keywords and identifiers (including accented ones), numeric
//! literals, operators, nested comments, line tracking and error recovery.

use crate::errors::errors::ErrorImpl;

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = tokenize("se então senão fim repita até leia escreva retorna inteiro flutuante").tokens;

    assert_eq!(tokens[0].kind, TokenKind::If);
    assert_eq!(tokens[1].kind, TokenKind::Then);
    assert_eq!(tokens[2].kind, TokenKind::Else);
    assert_eq!(tokens[3].kind, TokenKind::End);
    assert_eq!(tokens[4].kind, TokenKind::Repeat);
    assert_eq!(tokens[5].kind, TokenKind::Until);
    assert_eq!(tokens[6].kind, TokenKind::Read);
    assert_eq!(tokens[7].kind, TokenKind::Write);
    assert_eq!(tokens[8].kind, TokenKind::Return);
    assert_eq!(tokens[9].kind, TokenKind::Int);
    assert_eq!(tokens[10].kind, TokenKind::Float);
    assert_eq!(tokens[11].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo baz_123 _x número seção").tokens;

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "baz_123");
    assert_eq!(tokens[2].value, "_x");
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].value, "número");
    assert_eq!(tokens[4].value, "seção");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_keyword_prefix_is_identifier() {
    let tokens = tokenize("sempre fimx").tokens;

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "sempre");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 .5 1e10 2.5E-3 0").tokens;

    assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[2].value, ".5");
    assert_eq!(tokens[3].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[3].value, "1e10");
    assert_eq!(tokens[4].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[4].value, "2.5E-3");
    assert_eq!(tokens[5].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[6].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * / := = : > < >= <= <> , && ||"),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Assignment,
            TokenKind::Equals,
            TokenKind::Colon,
            TokenKind::Greater,
            TokenKind::Less,
            TokenKind::GreaterEquals,
            TokenKind::LessEquals,
            TokenKind::NotEquals,
            TokenKind::Comma,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_operators_without_spaces() {
    assert_eq!(
        kinds("a:=b<>c"),
        vec![
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Identifier,
            TokenKind::NotEquals,
            TokenKind::Identifier,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    assert_eq!(
        kinds("( ) [ ]"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_comments() {
    let output = tokenize("inteiro: x { um comentário\n { aninhado } }\nx := 1");

    assert!(!output.has_errors());
    let tokens = output.tokens;
    assert_eq!(tokens[0].kind, TokenKind::Int);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].value, "x");
    // Newlines inside the comment still count.
    assert_eq!(tokens[3].line, 3);
    assert_eq!(tokens[4].kind, TokenKind::Assignment);
}

#[test]
fn test_line_numbers() {
    let tokens = tokenize("a\nb\n\nc").tokens;

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 4);
    assert_eq!(tokens[3].kind, TokenKind::EOF);
    assert_eq!(tokens[3].line, 4);
}

#[test]
fn test_tokenize_function_header() {
    let tokens = tokenize("inteiro soma(inteiro: a, flutuante: v[])").tokens;

    assert_eq!(tokens[0].kind, TokenKind::Int);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "soma");
    assert_eq!(tokens[2].kind, TokenKind::OpenParen);
    assert_eq!(tokens[3].kind, TokenKind::Int);
    assert_eq!(tokens[4].kind, TokenKind::Colon);
    assert_eq!(tokens[5].value, "a");
    assert_eq!(tokens[6].kind, TokenKind::Comma);
    assert_eq!(tokens[7].kind, TokenKind::Float);
    assert_eq!(tokens[10].kind, TokenKind::OpenBracket);
    assert_eq!(tokens[11].kind, TokenKind::CloseBracket);
    assert_eq!(tokens[12].kind, TokenKind::CloseParen);
}

#[test]
fn test_invalid_character_is_recorded_and_skipped() {
    let output = tokenize("x := 1 @ 2\ny $");

    assert_eq!(output.errors.len(), 2);
    assert_eq!(
        output.errors[0].get_kind(),
        &ErrorImpl::InvalidCharacter { character: '@' }
    );
    assert_eq!(output.errors[0].get_line(), 1);
    assert_eq!(
        output.errors[1].get_kind(),
        &ErrorImpl::InvalidCharacter { character: '$' }
    );
    assert_eq!(output.errors[1].get_line(), 2);

    // Scanning continued past both.
    let values: Vec<&str> = output.tokens.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["x", ":=", "1", "2", "y", "EOF"]);
}

#[test]
fn test_unmatched_close_brace() {
    let output = tokenize("x }\ny");

    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].get_kind(), &ErrorImpl::UnmatchedCloseBrace);
    assert_eq!(output.errors[0].get_line(), 1);
    assert_eq!(output.tokens.len(), 3);
}

#[test]
fn test_unclosed_comment_reports_opening_lines() {
    let output = tokenize("x\n{ aberto\n { outro\n");

    assert_eq!(output.errors.len(), 2);
    assert!(output
        .errors
        .iter()
        .all(|e| e.get_kind() == &ErrorImpl::UnclosedComment));
    assert_eq!(output.errors[0].get_line(), 2);
    assert_eq!(output.errors[1].get_line(), 3);
    assert_eq!(output.tokens.len(), 2);
}

#[test]
fn test_brace_errors_follow_lexical_errors() {
    let output = tokenize("} @");

    assert_eq!(output.errors.len(), 2);
    assert!(!output.errors[0].get_kind().is_brace_imbalance());
    assert!(output.errors[1].get_kind().is_brace_imbalance());
}

#[test]
fn test_empty_source() {
    let output = tokenize("");

    assert!(!output.has_errors());
    assert_eq!(output.tokens.len(), 1);
    assert_eq!(output.tokens[0].kind, TokenKind::EOF);
}
