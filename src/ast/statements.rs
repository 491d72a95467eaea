use super::{
    expressions::{Expr, VarRef},
    types::ScalarType,
};

/// `tipo: a, b[10], c`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub var_type: ScalarType,
    pub variables: Vec<VarRef>,
    pub line: u32,
}

/// `alvo := valor`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: VarRef,
    pub value: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub param_type: ScalarType,
    pub is_array: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: Option<ScalarType>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDecl),
    Assignment(Assignment),
    Expression(Expr),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        line: u32,
    },
    Repeat {
        body: Vec<Stmt>,
        condition: Expr,
        line: u32,
    },
    Read {
        target: VarRef,
        line: u32,
    },
    Write {
        value: Expr,
        line: u32,
    },
    Return {
        value: Expr,
        line: u32,
    },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::VarDecl(decl) => decl.line,
            Stmt::Assignment(assignment) => assignment.line,
            Stmt::Expression(expr) => expr.line(),
            Stmt::If { line, .. }
            | Stmt::Repeat { line, .. }
            | Stmt::Read { line, .. }
            | Stmt::Write { line, .. }
            | Stmt::Return { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variables(VarDecl),
    Initialization(Assignment),
    Function(FunctionDecl),
}
