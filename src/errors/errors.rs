use std::fmt::Display;

use thiserror::Error;

/// A front-end error (lexical, brace imbalance or syntax) tied to a source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    line: u32,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, line: u32) -> Self {
        Error {
            internal_error: error_impl,
            line,
        }
    }

    pub fn get_line(&self) -> u32 {
        self.line
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::InvalidCharacter { .. } => "InvalidCharacter",
            ErrorImpl::UnclosedComment => "UnclosedComment",
            ErrorImpl::UnmatchedCloseBrace => "UnmatchedCloseBrace",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::MissingEnd { .. } => "MissingEnd",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::InvalidCharacter { .. } => ErrorTip::None,
            ErrorImpl::UnclosedComment => ErrorTip::Suggestion(String::from(
                "`{` abre um comentário que nunca é fechado com `}`",
            )),
            ErrorImpl::UnmatchedCloseBrace => ErrorTip::Suggestion(String::from(
                "`}` fecha um comentário que nunca foi aberto",
            )),
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Token inesperado: `{}`", token))
            }
            ErrorImpl::MissingEnd {
                construct,
                terminator,
            } => ErrorTip::Suggestion(format!(
                "a entrada terminou antes de fechar {}, falta um `{}`?",
                construct, terminator
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Número inválido: `{}`, ele passa do limite de inteiro?",
                token
            )),
            ErrorImpl::InvalidAssignmentTarget => ErrorTip::Suggestion(String::from(
                "só variáveis e elementos de array recebem `:=`",
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.internal_error)
        } else {
            write!(f, "{} na linha {}", self.internal_error, self.line)
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("Caractere inválido {character:?}")]
    InvalidCharacter { character: char },
    #[error("'{{' aberto mas nunca fechado")]
    UnclosedComment,
    #[error("'}}' fechado mas nunca aberto")]
    UnmatchedCloseBrace,
    #[error("Erro sintatico: {token:?}")]
    UnexpectedToken { token: String },
    #[error("Erro sintatico: falta '{terminator}' para fechar {construct}")]
    MissingEnd {
        construct: String,
        terminator: &'static str,
    },
    #[error("Número inválido: {token:?}")]
    NumberParseError { token: String },
    #[error("lado esquerdo de ':=' não é uma variável")]
    InvalidAssignmentTarget,
}

impl ErrorImpl {
    /// Brace errors are reported in their own batch once scanning completes.
    pub fn is_brace_imbalance(&self) -> bool {
        matches!(self, ErrorImpl::UnclosedComment | ErrorImpl::UnmatchedCloseBrace)
    }
}
