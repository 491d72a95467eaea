//! Main compiler module.
//!
//! This module contains the [`Compiler`] structure and drives lowering from
//! the checked AST to an IR [`Module`]: globals first in declaration order,
//! then one IR function per T++ function, then the C `main` wrapper around
//! the entry point.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::{
    ast::{
        ast::Program,
        expressions::Expr,
        statements::{Assignment, Declaration, FunctionDecl, VarDecl},
        types::{Number, ScalarType, UnaryOp},
    },
    ir::{
        builder::{FunctionBuilder, ModuleBuilder},
        CastOp, FunctionType, Initializer, IrError, IrType, Linkage, Module, Value,
    },
    type_checker::context::{CompilationContext, ENTRY_POINT, RESERVED_NAMES},
};

use super::stmt::gen_body;

/// Name of the C entry point wrapping the T++ entry function.
pub const C_ENTRY_POINT: &str = "main";

/// Internal faults of the code generator.
///
/// None of these are user diagnostics: a program that passed analysis
/// without fatal errors only reaches them through constructs the analyzer
/// does not reject (a scalar indexed like an array, a literal-free global
/// initializer) or when handed a context that never saw the program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("geração de código recusada: o programa tem erros semânticos")]
    FatalDiagnostics,
    #[error("linha {line}: nenhum armazenamento para '{name}'")]
    UnknownStorage { name: String, line: u32 },
    #[error("linha {line}: chamada a função desconhecida '{name}'")]
    UnknownFunction { name: String, line: u32 },
    #[error("linha {line}: função '{name}' espera {expected} argumento(s), recebeu {found}")]
    MissingArguments {
        name: String,
        expected: usize,
        found: usize,
        line: u32,
    },
    #[error("linha {line}: '{name}' não retorna valor, mas seu valor é usado")]
    VoidValueUsed { name: String, line: u32 },
    #[error("linha {line}: '{name}' não é um array")]
    NotAnArray { name: String, line: u32 },
    #[error("linha {line}: array '{name}' usado onde se espera um valor")]
    NotAScalar { name: String, line: u32 },
    #[error("linha {line}: tamanho do array '{name}' deve ser um número")]
    InvalidArrayLength { name: String, line: u32 },
    #[error("linha {line}: variável global '{name}' só pode ser inicializada com um número")]
    NonConstantGlobalInitializer { name: String, line: u32 },
    #[error("linha {line}: função '{name}' definida mais de uma vez")]
    DuplicateFunction { name: String, line: u32 },
    #[error("linha {line}: '{name}' já é usado por outra definição do módulo")]
    NameClash { name: String, line: u32 },
    #[error("linha {line}: não é possível converter {from} para {to}")]
    InvalidConversion { from: String, to: String, line: u32 },
    #[error("IR gerado malformado: {0}")]
    Ir(#[from] IrError),
}

/// Where a named variable lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    /// Address of a single value (`i32*` / `double*`).
    Scalar(Value),
    /// Address of a whole array (`[N x T]*`).
    Array(Value),
    /// Slot holding the element pointer an array parameter received (`T**`).
    ArrayParam(Value),
}

/// Maps a declared kind to its IR type.
pub fn scalar_type(scalar: ScalarType) -> IrType {
    match scalar {
        ScalarType::Int32 => IrType::I32,
        ScalarType::Float64 => IrType::Double,
    }
}

/// Array length from a declaration index. Float literals truncate.
pub fn literal_length(index: &Expr) -> Option<u64> {
    match index {
        Expr::Number {
            value: Number::Int(n),
            ..
        } if *n >= 0 => Some(*n as u64),
        Expr::Number {
            value: Number::Float(f),
            ..
        } if *f >= 0.0 => Some(f.trunc() as u64),
        _ => None,
    }
}

/// The code generator state for one compilation.
///
/// `scopes` mirrors the lexical blocks of the function being lowered; it is
/// searched innermost first and falls back to `globals`, so locals shadow
/// globals.
pub struct Compiler {
    /// The module under construction
    pub module: ModuleBuilder,
    /// Builder of the function currently being lowered
    pub function: Option<FunctionBuilder>,

    /// Storage of every global variable
    pub globals: HashMap<String, Storage>,
    /// Local storage, one map per open block
    pub scopes: Vec<HashMap<String, Storage>>,
    /// Signatures of the functions defined so far
    pub signatures: HashMap<String, FunctionType>,
    /// The `retorno` slot of the current typed function
    pub return_slot: Option<Value>,
}

impl Compiler {
    pub fn new(module_name: &str) -> Self {
        Compiler {
            module: ModuleBuilder::new(module_name),
            function: None,
            globals: HashMap::new(),
            scopes: vec![],
            signatures: HashMap::new(),
            return_slot: None,
        }
    }

    /// Lowers a whole program. Refuses to run when analysis was fatal.
    pub fn compile(
        mut self,
        program: &Program,
        ctx: &CompilationContext,
    ) -> Result<Module, CodegenError> {
        if ctx.is_fatal() {
            return Err(CodegenError::FatalDiagnostics);
        }

        for declaration in &program.declarations {
            match declaration {
                Declaration::Variables(decl) => self.gen_global_variables(decl)?,
                Declaration::Initialization(assignment) => {
                    self.gen_global_initializer(assignment)?
                }
                Declaration::Function(function) => self.gen_function(function)?,
            }
        }

        self.gen_entry_wrapper()?;

        let module = self.module.finish();
        module.verify()?;
        Ok(module)
    }

    /// The builder of the function being lowered.
    ///
    /// Statement and expression lowering only run inside [`gen_function`],
    /// which installs the builder first.
    ///
    /// [`gen_function`]: Compiler::gen_function
    pub fn builder(&mut self) -> &mut FunctionBuilder {
        self.function
            .as_mut()
            .unwrap_or_else(|| unreachable!("statement lowered outside of a function"))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare_local(&mut self, name: &str, storage: Storage) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), storage);
        }
    }

    pub fn lookup(&self, name: &str, line: u32) -> Result<Storage, CodegenError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .cloned()
            .ok_or_else(|| CodegenError::UnknownStorage {
                name: name.to_string(),
                line,
            })
    }

    fn gen_global_variables(&mut self, decl: &VarDecl) -> Result<(), CodegenError> {
        let element = scalar_type(decl.var_type);

        for var in &decl.variables {
            let ty = match var.index() {
                Some(index) => {
                    let len =
                        literal_length(index).ok_or_else(|| CodegenError::InvalidArrayLength {
                            name: var.name.clone(),
                            line: var.line,
                        })?;
                    element.array(len)
                }
                None => element.clone(),
            };

            if self.signatures.contains_key(&var.name)
                || RESERVED_NAMES.contains(&var.name.as_str())
            {
                return Err(CodegenError::NameClash {
                    name: var.name.clone(),
                    line: var.line,
                });
            }

            let pointer = self.define_global(&var.name, ty.clone());

            let storage = match ty {
                IrType::Array(..) => Storage::Array(pointer),
                _ => Storage::Scalar(pointer),
            };
            debug!("global '{}' as {}", var.name, ty);
            self.globals.insert(var.name.clone(), storage);
        }

        Ok(())
    }

    /// Module symbol currently bound to the global variable `name`.
    fn global_symbol(&self, name: &str) -> Option<String> {
        match self.globals.get(name)? {
            Storage::Scalar(Value::Global { name, .. })
            | Storage::Array(Value::Global { name, .. }) => Some(name.clone()),
            _ => None,
        }
    }

    /// Defines the global `name` or redefines it for a redeclaration.
    ///
    /// Before any function is lowered nothing refers to the global yet, so
    /// it keeps its single definition with the new type. Later, code
    /// already built points at the old definition: a redeclaration with a
    /// different type gets a new global `name.N` and the name is rebound to
    /// it.
    fn define_global(&mut self, name: &str, ty: IrType) -> Value {
        let Some(current) = self.global_symbol(name) else {
            return self.module.add_global(name, ty, Initializer::Zero);
        };

        let nothing_lowered = self.signatures.is_empty();
        if let Some(global) = self.module.get_global_mut(&current) {
            if global.ty == ty || nothing_lowered {
                global.ty = ty;
                global.initializer = Initializer::Zero;
                global.linkage = Linkage::Common;
                return global.pointer();
            }
        }

        let renamed = self.module.unique_global_name(name);
        debug!("global '{}' redeclared after use, now '{}'", name, renamed);
        self.module.add_global(&renamed, ty, Initializer::Zero)
    }

    fn gen_global_initializer(&mut self, assignment: &Assignment) -> Result<(), CodegenError> {
        let target = &assignment.target;
        let invalid = || CodegenError::NonConstantGlobalInitializer {
            name: target.name.clone(),
            line: assignment.line,
        };

        if !target.indices.is_empty() {
            return Err(invalid());
        }
        let literal = constant_value(&assignment.value).ok_or_else(invalid)?;

        let unknown = || CodegenError::UnknownStorage {
            name: target.name.clone(),
            line: assignment.line,
        };
        let symbol = self.global_symbol(&target.name).ok_or_else(unknown)?;
        let global = self.module.get_global_mut(&symbol).ok_or_else(unknown)?;

        global.initializer = match (&global.ty, literal) {
            (IrType::Double, Number::Int(n)) => Initializer::Float(n as f64),
            (IrType::Double, Number::Float(f)) => Initializer::Float(f),
            (IrType::I32, Number::Int(n)) => Initializer::Int(n),
            (IrType::I32, Number::Float(f)) => Initializer::Int(f.trunc() as i64),
            _ => return Err(invalid()),
        };
        global.linkage = Linkage::External;

        Ok(())
    }

    fn gen_function(&mut self, decl: &FunctionDecl) -> Result<(), CodegenError> {
        if self.signatures.contains_key(&decl.name) || RESERVED_NAMES.contains(&decl.name.as_str())
        {
            return Err(CodegenError::DuplicateFunction {
                name: decl.name.clone(),
                line: decl.line,
            });
        }
        if self.globals.contains_key(&decl.name) {
            return Err(CodegenError::NameClash {
                name: decl.name.clone(),
                line: decl.line,
            });
        }

        let return_type = decl.return_type.map(scalar_type).unwrap_or(IrType::Void);
        let params: Vec<(String, IrType)> = decl
            .params
            .iter()
            .map(|param| {
                let ty = scalar_type(param.param_type);
                let ty = if param.is_array { ty.ptr() } else { ty };
                (param.name.clone(), ty)
            })
            .collect();

        let builder = FunctionBuilder::new(&decl.name, return_type.clone(), params.clone());
        self.signatures.insert(
            decl.name.clone(),
            FunctionType {
                return_type: return_type.clone(),
                params: params.iter().map(|(_, ty)| ty.clone()).collect(),
                variadic: false,
            },
        );
        self.function = Some(builder);
        self.push_scope();

        for (index, (param, decl_param)) in params.iter().zip(&decl.params).enumerate() {
            let slot = self
                .builder()
                .build_alloca(param.1.clone(), &format!("{}.addr", param.0));
            if let Some(incoming) = self.builder().param_value(index) {
                self.builder().build_store(incoming, slot.clone());
            }
            let storage = if decl_param.is_array {
                Storage::ArrayParam(slot)
            } else {
                Storage::Scalar(slot)
            };
            self.declare_local(&param.0, storage);
        }

        self.return_slot = if return_type == IrType::Void {
            None
        } else {
            let slot = self.builder().build_alloca(return_type.clone(), "retorno");
            self.builder()
                .build_store(Value::zero(&return_type), slot.clone());
            Some(slot)
        };

        gen_body(self, &decl.body)?;

        let exit = self.builder().append_block("saida");
        self.builder().branch_if_open(&exit);
        self.builder().position_at_end(&exit);
        match self.return_slot.take() {
            Some(slot) => {
                let value = self.builder().build_load(slot);
                self.builder().build_return(Some(value));
            }
            None => self.builder().build_return(None),
        }

        self.pop_scope();
        if let Some(builder) = self.function.take() {
            debug!(
                "lowered function '{}' ({} blocks)",
                decl.name,
                builder.block_count()
            );
            self.module.add_function(builder.finish());
        }

        Ok(())
    }

    /// Defines `i32 main()` calling the entry point and returning its value
    /// as `i32` (or `0` when the entry point returns nothing).
    fn gen_entry_wrapper(&mut self) -> Result<(), CodegenError> {
        let signature = self.signatures.get(ENTRY_POINT).cloned().ok_or_else(|| {
            CodegenError::UnknownFunction {
                name: ENTRY_POINT.to_string(),
                line: 0,
            }
        })?;

        let mut builder = FunctionBuilder::new(C_ENTRY_POINT, IrType::I32, vec![]);
        let args = signature.params.iter().map(Value::zero).collect();
        let status = match builder.build_call(ENTRY_POINT, signature, args) {
            Some(value) if value.ty() == IrType::Double => {
                builder.build_cast(CastOp::FpToUi, value, IrType::I32)
            }
            Some(value) => value,
            None => Value::i32(0),
        };
        builder.build_return(Some(status));
        self.module.add_function(builder.finish());

        Ok(())
    }
}

/// A numeric literal, possibly under unary signs.
fn constant_value(expr: &Expr) -> Option<Number> {
    match expr {
        Expr::Number { value, .. } => Some(*value),
        Expr::Unary { op, operand, .. } => match (op, constant_value(operand)?) {
            (UnaryOp::Plus, value) => Some(value),
            (UnaryOp::Minus, Number::Int(n)) => Some(Number::Int(-n)),
            (UnaryOp::Minus, Number::Float(f)) => Some(Number::Float(-f)),
        },
        _ => None,
    }
}

/// Lowers a checked program into an IR module named `module`.
///
/// Fails with [`CodegenError::FatalDiagnostics`] when `ctx` carries a fatal
/// diagnostic.
pub fn generate(program: &Program, ctx: &CompilationContext) -> Result<Module, CodegenError> {
    Compiler::new("module").compile(program, ctx)
}
