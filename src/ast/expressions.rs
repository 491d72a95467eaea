use super::types::{BinaryOp, Number, UnaryOp};

/// A variable occurrence: a name plus the index expressions written after it.
///
/// Used both for declarations (`v[10]`) and for reads/writes (`v[i]`). Only
/// the first index is interpreted; arrays have a single dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub indices: Vec<Expr>,
    pub line: u32,
}

impl VarRef {
    pub fn scalar(name: &str, line: u32) -> Self {
        VarRef {
            name: name.to_string(),
            indices: vec![],
            line,
        }
    }

    pub fn index(&self) -> Option<&Expr> {
        self.indices.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: Number,
        line: u32,
    },
    Variable(VarRef),
    Call {
        name: String,
        args: Vec<Expr>,
        line: u32,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: u32,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: u32,
    },
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Expr::Number { line, .. }
            | Expr::Call { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. } => *line,
            Expr::Variable(var) => var.line,
        }
    }

    /// A numeric literal, possibly under unary signs.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Number { .. } => true,
            Expr::Unary { operand, .. } => operand.is_constant(),
            _ => false,
        }
    }

    /// Short source-like label used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expr::Number { value, .. } => value.to_string(),
            Expr::Variable(var) => var.name.clone(),
            Expr::Call { name, .. } => format!("{}(...)", name),
            Expr::Binary { op, .. } => format!("expressão '{}'", op.symbol()),
            Expr::Unary { op, operand, .. } => format!("{}{}", op.symbol(), operand.describe()),
        }
    }
}
