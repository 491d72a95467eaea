//! Scope resolution and the inline semantic checks.
//!
//! One top-down walk over the program builds the scope tree, tracks
//! initialization and usage of every symbol and reports redeclarations,
//! undeclared names, arity problems and assignment type mismatches.

use crate::{
    ast::{
        ast::Program,
        expressions::{Expr, VarRef},
        statements::{Assignment, Declaration, FunctionDecl, Stmt, VarDecl},
        types::{Number, Type},
    },
    errors::diagnostics::SemanticIssue,
};

use super::{
    context::{CompilationContext, ENTRY_POINT, RESERVED_NAMES},
    returns::check_returns,
    scope::{ScopeId, Symbol, SymbolId, GLOBAL_SCOPE},
};

/// Numeric kind of an expression, with names resolved through `lookup`.
///
/// Literals have their literal kind, names the type of their symbol and a
/// unary expression the kind of its operand. Arithmetic is `flutuante` when
/// either side is, `inteiro` when both are; comparisons and logical
/// operators yield `inteiro`.
pub fn expression_kind(expr: &Expr, lookup: &dyn Fn(&str) -> Option<Type>) -> Type {
    match expr {
        Expr::Number { value, .. } => value.kind(),
        Expr::Variable(var) => lookup(&var.name).unwrap_or(Type::Unresolved),
        Expr::Call { name, .. } => lookup(name).unwrap_or(Type::Unresolved),
        Expr::Unary { operand, .. } => expression_kind(operand, lookup),
        Expr::Binary {
            op, left, right, ..
        } => {
            if op.is_relational() || op.is_logical() {
                return Type::Int32;
            }
            match (expression_kind(left, lookup), expression_kind(right, lookup)) {
                (Type::Float64, _) | (_, Type::Float64) => Type::Float64,
                (Type::Int32, Type::Int32) => Type::Int32,
                _ => Type::Unresolved,
            }
        }
    }
}

pub struct TypeChecker<'a> {
    ctx: &'a mut CompilationContext,
    current: ScopeId,
}

impl<'a> TypeChecker<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        TypeChecker {
            ctx,
            current: GLOBAL_SCOPE,
        }
    }

    fn report(&mut self, issue: SemanticIssue, line: u32) {
        self.ctx.diagnostics.report(issue, Some(line));
    }

    fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ctx.scopes.lookup(self.current, name)
    }

    fn kind_of(&self, expr: &Expr) -> Type {
        let lookup = |name: &str| {
            self.lookup(name)
                .map(|id| self.ctx.scopes.get(id).declared_type)
        };
        expression_kind(expr, &lookup)
    }

    /// Runs `f` with a fresh child scope of the active one.
    fn with_child_scope(&mut self, name: &str, f: impl FnOnce(&mut Self)) {
        let parent = self.current;
        self.current = self.ctx.scopes.add_scope(name, parent);
        f(self);
        self.current = parent;
    }

    pub fn check_program(&mut self, program: &Program) {
        for declaration in &program.declarations {
            match declaration {
                Declaration::Variables(decl) => self.declare_variables(decl),
                Declaration::Initialization(assignment) => self.check_global_initializer(assignment),
                Declaration::Function(function) => self.check_function(function),
            }
        }

        let has_entry = self
            .ctx
            .scopes
            .lookup_local(GLOBAL_SCOPE, ENTRY_POINT)
            .map(|id| self.ctx.scopes.get(id).is_function)
            .unwrap_or(false);
        if !has_entry {
            self.ctx.diagnostics.report(
                SemanticIssue::MissingEntryPoint {
                    name: ENTRY_POINT.to_string(),
                },
                None,
            );
        }

        self.report_unused();
    }

    fn report_unused(&mut self) {
        let mut unused = vec![];
        for scope in self.ctx.scopes.preorder() {
            for symbol in self.ctx.scopes.scope(scope).symbols() {
                if symbol.used {
                    continue;
                }
                let issue = if symbol.is_function {
                    SemanticIssue::UnusedFunction {
                        name: symbol.name.clone(),
                    }
                } else {
                    SemanticIssue::UnusedVariable {
                        name: symbol.name.clone(),
                    }
                };
                unused.push((issue, symbol.line));
            }
        }

        for (issue, line) in unused {
            self.report(issue, line);
        }
    }

    fn check_function(&mut self, function: &FunctionDecl) {
        let return_type = function.return_type.map(Type::from).unwrap_or(Type::Void);
        let mut symbol = Symbol::function(
            &function.name,
            return_type,
            function.params.len() as u32,
            function.line,
        );
        symbol.used = function.name == ENTRY_POINT;
        self.declare(GLOBAL_SCOPE, symbol);

        let scope = self.ctx.scopes.add_scope(&function.name, GLOBAL_SCOPE);
        for param in &function.params {
            let mut symbol = Symbol::variable(&param.name, param.param_type.into(), param.line);
            symbol.initialized = true;
            if param.is_array {
                symbol.array_dims = 1;
            }
            if self.ctx.scopes.insert(scope, symbol).is_none() {
                self.report(
                    SemanticIssue::Redeclaration {
                        name: param.name.clone(),
                    },
                    param.line,
                );
            }
        }

        log::debug!("resolving function '{}'", function.name);
        self.current = scope;
        self.check_body(&function.body);
        self.current = GLOBAL_SCOPE;
    }

    /// Inserts `symbol` into `scope` unless its name is already visible
    /// from there. A visible name is a redeclaration: it is reported and the
    /// existing symbol takes the new type.
    ///
    /// At global level a variable and a function cannot share a name, and
    /// the names in [`RESERVED_NAMES`] cannot be taken at all.
    fn declare(&mut self, scope: ScopeId, symbol: Symbol) {
        if scope == GLOBAL_SCOPE && RESERVED_NAMES.contains(&symbol.name.as_str()) {
            self.report(
                SemanticIssue::ReservedName {
                    name: symbol.name.clone(),
                },
                symbol.line,
            );
        }

        if let Some(existing) = self.ctx.scopes.lookup(scope, &symbol.name) {
            let existing_is_function = self.ctx.scopes.get(existing).is_function;
            if scope == GLOBAL_SCOPE && existing_is_function != symbol.is_function {
                self.report(
                    SemanticIssue::NameClash {
                        name: symbol.name.clone(),
                        existing: if existing_is_function {
                            "função"
                        } else {
                            "variável"
                        },
                    },
                    symbol.line,
                );
                return;
            }
            self.report(
                SemanticIssue::Redeclaration {
                    name: symbol.name.clone(),
                },
                symbol.line,
            );
            self.ctx.scopes.retype(existing, symbol.declared_type);
            return;
        }
        self.ctx.scopes.insert(scope, symbol);
    }

    fn declare_variables(&mut self, decl: &VarDecl) {
        for var in &decl.variables {
            let mut symbol = Symbol::variable(&var.name, decl.var_type.into(), var.line);

            if let Some(size) = var.index() {
                symbol.array_dims = 1;
                match size {
                    Expr::Number {
                        value: Number::Int(n),
                        ..
                    } => symbol.size_1d = Some(Number::Int(*n)),
                    Expr::Number {
                        value: Number::Float(n),
                        ..
                    } => {
                        symbol.size_1d = Some(Number::Float(*n));
                        self.report(
                            SemanticIssue::ArrayIndexNotInteger {
                                name: var.name.clone(),
                            },
                            var.line,
                        );
                    }
                    other => {
                        self.check_expr(other);
                        self.report(
                            SemanticIssue::ArrayIndexNotInteger {
                                name: var.name.clone(),
                            },
                            var.line,
                        );
                    }
                }
            }

            self.declare(self.current, symbol);
        }
    }

    /// A top-level `x := ...`. Only a numeric literal can become a global's
    /// initial value.
    fn check_global_initializer(&mut self, assignment: &Assignment) {
        self.check_assignment(assignment);

        if !assignment.target.indices.is_empty() || !assignment.value.is_constant() {
            self.report(
                SemanticIssue::NonConstantInitializer {
                    name: assignment.target.name.clone(),
                },
                assignment.line,
            );
        }
    }

    fn check_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => self.declare_variables(decl),
            Stmt::Assignment(assignment) => self.check_assignment(assignment),
            Stmt::Expression(expr) => self.check_expr(expr),
            Stmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                self.check_expr(condition);
                self.with_child_scope("se", |checker| {
                    checker.check_body(then_body);
                    if let Some(else_body) = else_body {
                        checker.check_body(else_body);
                    }
                });
            }
            Stmt::Repeat {
                body, condition, ..
            } => {
                self.with_child_scope("repita", |checker| {
                    checker.check_body(body);
                    checker.check_expr(condition);
                });
            }
            Stmt::Read { target, .. } => {
                self.check_indices(target);
                match self.lookup(&target.name) {
                    Some(id) => {
                        self.ctx.scopes.mark_initialized(id);
                        self.ctx.scopes.mark_used(id);
                    }
                    None => self.report(
                        SemanticIssue::UndeclaredVariable {
                            name: target.name.clone(),
                        },
                        target.line,
                    ),
                }
            }
            Stmt::Write { value, .. } | Stmt::Return { value, .. } => self.check_expr(value),
        }
    }

    fn check_indices(&mut self, var: &VarRef) {
        for index in &var.indices {
            self.check_expr(index);
        }
    }

    fn check_assignment(&mut self, assignment: &Assignment) {
        let target = &assignment.target;
        self.check_indices(target);
        self.check_expr(&assignment.value);

        let id = match self.lookup(&target.name) {
            Some(id) => id,
            None => {
                self.report(
                    SemanticIssue::UndeclaredVariable {
                        name: target.name.clone(),
                    },
                    target.line,
                );
                return;
            }
        };
        self.ctx.scopes.mark_initialized(id);

        let target_type = self.ctx.scopes.get(id).declared_type;
        let value_type = self.kind_of(&assignment.value);
        if target_type.is_numeric() && value_type.is_numeric() && target_type != value_type {
            self.report(
                SemanticIssue::TypeMismatch {
                    target: target.name.clone(),
                    target_type,
                    value: assignment.value.describe(),
                    value_type,
                },
                assignment.line,
            );
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number { .. } => {}
            Expr::Variable(var) => {
                self.check_indices(var);
                let id = match self.lookup(&var.name) {
                    Some(id) => id,
                    None => {
                        self.report(
                            SemanticIssue::UndeclaredVariable {
                                name: var.name.clone(),
                            },
                            var.line,
                        );
                        return;
                    }
                };

                let symbol = self.ctx.scopes.get(id);
                if !symbol.initialized && !symbol.is_function && !symbol.used {
                    self.report(
                        SemanticIssue::UninitializedUse {
                            name: var.name.clone(),
                        },
                        var.line,
                    );
                }
                self.ctx.scopes.mark_used(id);
            }
            Expr::Call { name, args, line } => {
                self.check_call(name, args.len() as u32, *line);
                for arg in args {
                    self.check_expr(arg);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Unary { operand, .. } => self.check_expr(operand),
        }
    }

    fn check_call(&mut self, name: &str, received: u32, line: u32) {
        let id = match self.lookup(name) {
            Some(id) => id,
            None => {
                self.report(
                    SemanticIssue::UndeclaredFunction {
                        name: name.to_string(),
                    },
                    line,
                );
                return;
            }
        };

        let symbol = self.ctx.scopes.get(id);
        if !symbol.is_function {
            self.report(
                SemanticIssue::NotAFunction {
                    name: name.to_string(),
                },
                line,
            );
        } else {
            let expected = symbol.param_count;
            if name == ENTRY_POINT {
                self.report(
                    SemanticIssue::RecursiveEntryCall {
                        name: name.to_string(),
                    },
                    line,
                );
            }
            // Only missing arguments are an error; extra ones are ignored.
            if received < expected {
                self.report(
                    SemanticIssue::TooFewArguments {
                        name: name.to_string(),
                        expected,
                        received,
                    },
                    line,
                );
            }
        }
        self.ctx.scopes.mark_used(id);
    }
}

/// Builds the scope tree for `program` and records every semantic issue of
/// the resolution walk in `ctx`.
pub fn resolve(program: &Program, ctx: &mut CompilationContext) {
    TypeChecker::new(ctx).check_program(program);
    log::debug!(
        "resolution done: {} scopes, {} diagnostics",
        ctx.scopes.len(),
        ctx.diagnostics.messages().len()
    );
}

/// Runs resolution and return checking on a fresh context.
pub fn analyze(program: &Program) -> CompilationContext {
    let mut ctx = CompilationContext::new();
    resolve(program, &mut ctx);
    check_returns(program, &mut ctx);
    ctx
}
