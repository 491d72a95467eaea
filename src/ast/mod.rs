/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: The program root and the generic node view used for inspection
/// - expressions: Expression and variable-reference nodes
/// - statements: Declarations and statements
/// - types: Scalar kinds, analyzer types, literals and operators
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
