use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("se", TokenKind::If);
        map.insert("então", TokenKind::Then);
        map.insert("senão", TokenKind::Else);
        map.insert("fim", TokenKind::End);
        map.insert("repita", TokenKind::Repeat);
        map.insert("até", TokenKind::Until);
        map.insert("leia", TokenKind::Read);
        map.insert("escreva", TokenKind::Write);
        map.insert("retorna", TokenKind::Return);
        map.insert("inteiro", TokenKind::Int);
        map.insert("flutuante", TokenKind::Float);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    IntLiteral,
    FloatLiteral,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,

    Assignment, // :=
    Equals,     // =
    NotEquals,  // <>

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,

    Colon,
    Comma,

    Plus,
    Dash,
    Slash,
    Star,

    // Reserved
    If,
    Then,
    Else,
    End,
    Repeat,
    Until,
    Read,
    Write,
    Return,
    Int,
    Float,
}

impl TokenKind {
    pub fn is_type(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: u32,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                write!(f, "{} ({}) line {}", self.kind, self.value, self.line)
            }
            _ => write!(f, "{} line {}", self.kind, self.line),
        }
    }
}
