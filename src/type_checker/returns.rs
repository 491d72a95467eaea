use crate::{
    ast::{
        ast::Program,
        expressions::Expr,
        statements::{FunctionDecl, Stmt},
        types::Type,
    },
    errors::diagnostics::SemanticIssue,
};

use super::{
    context::CompilationContext,
    scope::{ScopeTree, GLOBAL_SCOPE},
    type_checker::expression_kind,
};

/// First `retorna` in source order, descending into nested blocks.
fn first_return(body: &[Stmt]) -> Option<(&Expr, u32)> {
    body.iter().find_map(|stmt| match stmt {
        Stmt::Return { value, line } => Some((value, *line)),
        Stmt::If {
            then_body,
            else_body,
            ..
        } => first_return(then_body).or_else(|| else_body.as_deref().and_then(first_return)),
        Stmt::Repeat { body, .. } => first_return(body),
        _ => None,
    })
}

fn returned_kind(scopes: &ScopeTree, function: &FunctionDecl, value: &Expr) -> Type {
    let function_scope = scopes.function_scope(&function.name);
    let lookup = |name: &str| {
        function_scope
            .and_then(|scope| scopes.find_in_subtree(scope, name))
            .or_else(|| scopes.lookup_local(GLOBAL_SCOPE, name))
            .map(|id| scopes.get(id).declared_type)
    };
    expression_kind(value, &lookup)
}

/// Compares each function's declared return type with the kind of the
/// first value it returns. Runs after resolution, on the finished scope
/// tree.
pub fn check_returns(program: &Program, ctx: &mut CompilationContext) {
    for function in program.functions() {
        let declared = function.return_type.map(Type::from);

        let issue = match (declared, first_return(&function.body)) {
            (Some(expected), None) => Some((
                SemanticIssue::ReturnTypeMismatch {
                    name: function.name.clone(),
                    expected,
                    found: Type::Void,
                },
                function.line,
            )),
            (Some(expected), Some((value, line))) => {
                let found = returned_kind(&ctx.scopes, function, value);
                // An unresolved kind already produced an undeclared-name error.
                (found != Type::Unresolved && found != expected).then(|| {
                    (
                        SemanticIssue::ReturnTypeMismatch {
                            name: function.name.clone(),
                            expected,
                            found,
                        },
                        line,
                    )
                })
            }
            (None, Some((value, line))) => Some((
                SemanticIssue::ReturnTypeMismatch {
                    name: function.name.clone(),
                    expected: Type::Void,
                    found: returned_kind(&ctx.scopes, function, value),
                },
                line,
            )),
            (None, None) => None,
        };

        if let Some((issue, line)) = issue {
            ctx.diagnostics.report(issue, Some(line));
        }
    }
}
