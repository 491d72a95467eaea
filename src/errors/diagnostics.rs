//! Semantic diagnostic sink.
//!
//! The analyzer never stops on a semantic problem. Every issue it finds is
//! appended here, and errors additionally raise the `fatal` flag that gates
//! code generation.

use std::fmt::Display;

use thiserror::Error;

use crate::ast::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "AVISO"),
            Severity::Error => write!(f, "ERRO"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticIssue {
    #[error("Variavel '{name}' já declarada anteriormente")]
    Redeclaration { name: String },
    #[error("Variavel '{name}' declarada mas não utilizada")]
    UnusedVariable { name: String },
    #[error("Função '{name}' declarada mas não utilizada")]
    UnusedFunction { name: String },
    #[error("Variavel '{name}' declarada mas não inicializada")]
    UninitializedUse { name: String },
    #[error("Atribuição de tipos distintos: '{target}' {target_type} e '{value}' {value_type}")]
    TypeMismatch {
        target: String,
        target_type: Type,
        value: String,
        value_type: Type,
    },
    #[error("Indice de array '{name}' não inteiro")]
    ArrayIndexNotInteger { name: String },
    #[error("Chamada recursiva para a função '{name}'")]
    RecursiveEntryCall { name: String },
    #[error("Variavel global '{name}' só pode ser inicializada com um número")]
    NonConstantInitializer { name: String },
    #[error("Função {name} não foi declarada")]
    MissingEntryPoint { name: String },
    #[error("Variavel '{name}' não foi declarada")]
    UndeclaredVariable { name: String },
    #[error("Chamada a função '{name}' que não foi declarada")]
    UndeclaredFunction { name: String },
    #[error("'{name}' não é uma função")]
    NotAFunction { name: String },
    #[error("Chamada a função '{name}' com número de parâmetros menor que o declarado: esperava {expected}, recebeu {received}")]
    TooFewArguments {
        name: String,
        expected: u32,
        received: u32,
    },
    #[error("Função '{name}' deveria retornar {expected}, mas retorna {found}")]
    ReturnTypeMismatch {
        name: String,
        expected: Type,
        found: Type,
    },
    #[error("'{name}' já declarado como {existing}")]
    NameClash { name: String, existing: &'static str },
    #[error("'{name}' é um nome reservado")]
    ReservedName { name: String },
}

impl SemanticIssue {
    pub fn severity(&self) -> Severity {
        match self {
            SemanticIssue::Redeclaration { .. }
            | SemanticIssue::UnusedVariable { .. }
            | SemanticIssue::UnusedFunction { .. }
            | SemanticIssue::UninitializedUse { .. }
            | SemanticIssue::TypeMismatch { .. }
            | SemanticIssue::ArrayIndexNotInteger { .. }
            | SemanticIssue::RecursiveEntryCall { .. }
            | SemanticIssue::NonConstantInitializer { .. } => Severity::Warning,
            SemanticIssue::MissingEntryPoint { .. }
            | SemanticIssue::UndeclaredVariable { .. }
            | SemanticIssue::UndeclaredFunction { .. }
            | SemanticIssue::NotAFunction { .. }
            | SemanticIssue::TooFewArguments { .. }
            | SemanticIssue::ReturnTypeMismatch { .. }
            | SemanticIssue::NameClash { .. }
            | SemanticIssue::ReservedName { .. } => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub issue: SemanticIssue,
    /// Source line, `None` for whole-program checks.
    pub line: Option<u32>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] linha {}: {}", self.severity, line, self.issue),
            None => write!(f, "[{}]: {}", self.severity, self.issue),
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    fatal: bool,
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, issue: SemanticIssue, line: Option<u32>) {
        let severity = issue.severity();
        if severity == Severity::Error {
            self.fatal = true;
        }
        log::debug!("diagnostic: {} {}", severity, issue);
        self.messages.push(Diagnostic {
            severity,
            issue,
            line,
        });
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Counts the diagnostics whose issue satisfies `predicate`.
    pub fn count(&self, predicate: impl Fn(&SemanticIssue) -> bool) -> usize {
        self.messages.iter().filter(|d| predicate(&d.issue)).count()
    }
}
