//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the `parse` entry point.
//! Expressions go through a Pratt parser driven by NUD/LED lookup tables;
//! statements are dispatched on their leading keyword.
//!
//! The parser never stops at the first syntax error. Each error is recorded,
//! the parser skips ahead to the next statement or declaration start and
//! carries on, so one run reports every independent mistake.

use std::collections::HashMap;

use crate::{
    ast::ast::Program,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    MK_TOKEN,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_declaration,
};

/// Tokens a statement or declaration can start with; error recovery stops here.
const SYNC_TOKENS: [TokenKind; 11] = [
    TokenKind::If,
    TokenKind::Repeat,
    TokenKind::Read,
    TokenKind::Write,
    TokenKind::Return,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::End,
    TokenKind::Else,
    TokenKind::Until,
    TokenKind::EOF,
];

/// The main parser structure that maintains parsing state.
pub struct Parser {
    /// The list of tokens to parse, always terminated by `EOF`
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
    /// Syntax errors recorded so far
    errors: Vec<Error>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), line));
        }

        Parser {
            tokens,
            pos: 0,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            errors: vec![],
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Returns the kind of the token after the current one.
    pub fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EOF)
    }

    /// Advances to the next token and returns the previous token. Never
    /// moves past `EOF`.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.tokens[index].kind != TokenKind::EOF {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Builds an `UnexpectedToken` error for the current token.
    pub fn unexpected(&self) -> Error {
        let token = self.current_token();
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: token.value.clone(),
            },
            token.line,
        )
    }

    /// Expects a token of the specified kind and consumes it.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            Err(self.unexpected())
        } else {
            Ok(self.advance().clone())
        }
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// Prefix-only tokens get no binding power: statements are not
    /// separated, so an identifier or literal after a complete expression
    /// must end it instead of continuing it.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Records a syntax error without aborting the parse.
    pub fn record(&mut self, error: Error) {
        log::debug!("syntax error: {}", error);
        self.errors.push(error);
    }

    /// Skips ahead after an error raised by the statement that started at
    /// `start`. Consumes at least one token, then stops at the next
    /// statement keyword or at the first token on a later line.
    pub fn synchronize(&mut self, start: usize) {
        let line = self.current_token().line;
        if self.pos == start {
            self.advance();
        }
        while !SYNC_TOKENS.contains(&self.current_token_kind())
            && self.current_token().line <= line
        {
            self.advance();
        }
    }
}

/// Parses a stream of tokens into a [`Program`].
///
/// Returns the (possibly partial) program together with every syntax error
/// found. A non-empty error list means the parse failed.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Error>) {
    let mut parser = Parser::new(tokens);
    create_token_lookups(&mut parser);

    let mut declarations = vec![];

    while parser.has_tokens() {
        let start = parser.pos();
        match parse_declaration(&mut parser) {
            Ok(declaration) => declarations.push(declaration),
            Err(error) => {
                parser.record(error);
                parser.synchronize(start);
            }
        }
    }

    log::debug!(
        "parser produced {} declarations and {} errors",
        declarations.len(),
        parser.errors.len()
    );

    (Program { declarations }, parser.errors)
}
