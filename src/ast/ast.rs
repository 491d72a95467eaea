use std::fmt::Write;

use super::{
    expressions::{Expr, VarRef},
    statements::{Assignment, Declaration, FunctionDecl, Param, Stmt, VarDecl},
    types::{LeafValue, Number, ScalarType},
};

/// Root of a parsed translation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.declarations.iter().filter_map(|declaration| match declaration {
            Declaration::Function(function) => Some(function),
            _ => None,
        })
    }
}

/// Generic, read-only view of the tree used for inspection and export.
///
/// Every node carries a kind tag, an optional leaf value and its ordered
/// children. The analyzer and the code generator never look at this view;
/// they match on the typed AST instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: &'static str,
    pub leaf: Option<LeafValue>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    fn new(kind: &'static str, leaf: Option<LeafValue>, children: Vec<AstNode>) -> Self {
        AstNode {
            kind,
            leaf,
            children,
        }
    }

    fn identifier(kind: &'static str, name: &str, children: Vec<AstNode>) -> Self {
        AstNode::new(kind, Some(LeafValue::Identifier(name.to_string())), children)
    }

    fn type_node(scalar: ScalarType) -> Self {
        AstNode::identifier("type", scalar.keyword(), vec![])
    }

    fn label(&self) -> String {
        match &self.leaf {
            Some(leaf) => format!("{}: {}", self.kind, leaf),
            None => self.kind.to_string(),
        }
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(AstNode::count).sum::<usize>()
    }

    /// Renders the tree with box-drawing guides, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.label());
        out.push('\n');
        self.render_children("", &mut out);
        out
    }

    fn render_children(&self, prefix: &str, out: &mut String) {
        let last_index = self.children.len().saturating_sub(1);
        for (i, child) in self.children.iter().enumerate() {
            let is_last = i == last_index;
            out.push_str(prefix);
            out.push_str(if is_last { "╚══ " } else { "╠══ " });
            out.push_str(&child.label());
            out.push('\n');
            let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "║   " });
            child.render_children(&next_prefix, out);
        }
    }

    /// Exports the tree as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph ast {\n");
        let mut counter = 0;
        self.write_dot(&mut out, &mut counter);
        out.push_str("}\n");
        out
    }

    fn write_dot(&self, out: &mut String, counter: &mut usize) -> usize {
        let id = *counter;
        *counter += 1;
        let label = self.label().replace('\\', "\\\\").replace('"', "\\\"");
        // Writing into a String cannot fail.
        let _ = writeln!(out, "  n{} [label=\"{}\"];", id, label);
        for child in &self.children {
            let child_id = child.write_dot(out, counter);
            let _ = writeln!(out, "  n{} -> n{};", id, child_id);
        }
        id
    }
}

impl From<&Program> for AstNode {
    fn from(program: &Program) -> Self {
        AstNode::new(
            "program",
            None,
            program.declarations.iter().map(declaration_node).collect(),
        )
    }
}

fn declaration_node(declaration: &Declaration) -> AstNode {
    match declaration {
        Declaration::Variables(decl) => var_decl_node(decl),
        Declaration::Initialization(assignment) => assignment_node(assignment),
        Declaration::Function(function) => function_node(function),
    }
}

fn var_decl_node(decl: &VarDecl) -> AstNode {
    let mut children = vec![AstNode::type_node(decl.var_type)];
    children.extend(decl.variables.iter().map(var_node));
    AstNode::new("variable_declaration", None, children)
}

fn var_node(var: &VarRef) -> AstNode {
    let children = var
        .indices
        .iter()
        .map(|index| AstNode::new("index", None, vec![expr_node(index)]))
        .collect();
    AstNode::identifier("variable", &var.name, children)
}

fn assignment_node(assignment: &Assignment) -> AstNode {
    AstNode::new(
        "assignment",
        None,
        vec![var_node(&assignment.target), expr_node(&assignment.value)],
    )
}

fn param_node(param: &Param) -> AstNode {
    let kind = if param.is_array {
        "array_parameter"
    } else {
        "parameter"
    };
    AstNode::identifier(kind, &param.name, vec![AstNode::type_node(param.param_type)])
}

fn body_node(body: &[Stmt]) -> AstNode {
    AstNode::new("body", None, body.iter().map(stmt_node).collect())
}

fn function_node(function: &FunctionDecl) -> AstNode {
    let mut children = vec![];
    if let Some(return_type) = function.return_type {
        children.push(AstNode::type_node(return_type));
    }
    children.push(AstNode::new(
        "parameters",
        None,
        function.params.iter().map(param_node).collect(),
    ));
    children.push(body_node(&function.body));
    AstNode::identifier("function_declaration", &function.name, children)
}

fn stmt_node(stmt: &Stmt) -> AstNode {
    match stmt {
        Stmt::VarDecl(decl) => var_decl_node(decl),
        Stmt::Assignment(assignment) => assignment_node(assignment),
        Stmt::Expression(expr) => expr_node(expr),
        Stmt::If {
            condition,
            then_body,
            else_body,
            ..
        } => {
            let mut children = vec![expr_node(condition), body_node(then_body)];
            if let Some(else_body) = else_body {
                children.push(body_node(else_body));
            }
            AstNode::new("if", None, children)
        }
        Stmt::Repeat {
            body, condition, ..
        } => AstNode::new("repeat", None, vec![body_node(body), expr_node(condition)]),
        Stmt::Read { target, .. } => AstNode::new("read", None, vec![var_node(target)]),
        Stmt::Write { value, .. } => AstNode::new("write", None, vec![expr_node(value)]),
        Stmt::Return { value, .. } => AstNode::new("return", None, vec![expr_node(value)]),
    }
}

fn expr_node(expr: &Expr) -> AstNode {
    match expr {
        Expr::Number { value, .. } => {
            let leaf = match value {
                Number::Int(value) => LeafValue::IntLiteral(*value),
                Number::Float(value) => LeafValue::FloatLiteral(*value),
            };
            AstNode::new("number", Some(leaf), vec![])
        }
        Expr::Variable(var) => var_node(var),
        Expr::Call { name, args, .. } => {
            AstNode::identifier("call", name, args.iter().map(expr_node).collect())
        }
        Expr::Binary {
            op, left, right, ..
        } => AstNode::new(
            "binary",
            Some(LeafValue::Operator(op.symbol())),
            vec![expr_node(left), expr_node(right)],
        ),
        Expr::Unary { op, operand, .. } => AstNode::new(
            "unary",
            Some(LeafValue::Operator(op.symbol())),
            vec![expr_node(operand)],
        ),
    }
}
