//! Type system definitions for the AST.
//!
//! This module defines the type system used in the language, including:
//!
//! - The two scalar kinds a program can declare (`inteiro`, `flutuante`)
//! - The analyzer's view of a symbol's type (scalar kinds plus `vazio`)
//! - Numeric literal values and operator kinds
//! - The tagged leaf value of the generic tree view

use std::fmt::Display;

/// A type keyword written in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int32,
    Float64,
}

impl ScalarType {
    pub fn keyword(&self) -> &'static str {
        match self {
            ScalarType::Int32 => "inteiro",
            ScalarType::Float64 => "flutuante",
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// The type of a symbol as tracked by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int32,
    Float64,
    Void,
    /// Not (yet) known, e.g. an expression naming an undeclared symbol.
    Unresolved,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int32 | Type::Float64)
    }
}

impl From<ScalarType> for Type {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Int32 => Type::Int32,
            ScalarType::Float64 => Type::Float64,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int32 => write!(f, "inteiro"),
            Type::Float64 => write!(f, "flutuante"),
            Type::Void => write!(f, "vazio"),
            Type::Unresolved => write!(f, "indefinido"),
        }
    }
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn kind(&self) -> Type {
        match self {
            Number::Int(_) => Type::Int32,
            Number::Float(_) => Type::Float64,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{:?}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Greater,
    Less,
    GreaterEquals,
    LessEquals,
    Equals,
    NotEquals,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::GreaterEquals => ">=",
            BinaryOp::LessEquals => "<=",
            BinaryOp::Equals => "=",
            BinaryOp::NotEquals => "<>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Greater
                | BinaryOp::Less
                | BinaryOp::GreaterEquals
                | BinaryOp::LessEquals
                | BinaryOp::Equals
                | BinaryOp::NotEquals
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

/// The value carried by a leaf of the generic tree view.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Identifier(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    Operator(&'static str),
}

impl Display for LeafValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeafValue::Identifier(name) => write!(f, "{}", name),
            LeafValue::IntLiteral(value) => write!(f, "{}", value),
            LeafValue::FloatLiteral(value) => write!(f, "{:?}", value),
            LeafValue::Operator(symbol) => write!(f, "{}", symbol),
        }
    }
}
