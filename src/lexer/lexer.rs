use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &str);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Order matters: the first pattern matching at the cursor wins, so
    // longer operators come before their prefixes and floats before ints.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: whitespace_handler },
        RegexPattern { regex: Regex::new(r"^\{").unwrap(), handler: comment_handler },
        RegexPattern { regex: Regex::new(r"^\}").unwrap(), handler: stray_close_handler },
        RegexPattern { regex: Regex::new(r"^(\d*\.\d+([eE][-+]?\d+)?|\d+[eE][-+]?\d+)").unwrap(), handler: float_handler },
        RegexPattern { regex: Regex::new(r"^\d+").unwrap(), handler: int_handler },
        RegexPattern { regex: Regex::new(r"^[a-zA-ZÀ-ÿ_][a-zA-ZÀ-ÿ_0-9]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new(r"^:=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assignment, ":=") },
        RegexPattern { regex: Regex::new(r"^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new(r"^<>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "<>") },
        RegexPattern { regex: Regex::new(r"^<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=") },
        RegexPattern { regex: Regex::new(r"^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
        RegexPattern { regex: Regex::new(r"^>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=") },
        RegexPattern { regex: Regex::new(r"^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
        RegexPattern { regex: Regex::new(r"^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "=") },
        RegexPattern { regex: Regex::new(r"^&&").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::And, "&&") },
        RegexPattern { regex: Regex::new(r"^\|\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Or, "||") },
        RegexPattern { regex: Regex::new(r"^\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[") },
        RegexPattern { regex: Regex::new(r"^\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]") },
        RegexPattern { regex: Regex::new(r"^\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new(r"^\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new(r"^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new(r"^\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+") },
        RegexPattern { regex: Regex::new(r"^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dash, "-") },
        RegexPattern { regex: Regex::new(r"^\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Star, "*") },
        RegexPattern { regex: Regex::new(r"^/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Slash, "/") },
    ];
}

/// Result of scanning one source text.
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    /// Lexical errors in source order, followed by brace imbalance errors.
    pub errors: Vec<Error>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct Lexer {
    tokens: Vec<Token>,
    errors: Vec<Error>,
    brace_errors: Vec<Error>,
    source: String,
    pos: usize,
    line: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            tokens: vec![],
            errors: vec![],
            brace_errors: vec![],
            source: source.to_string(),
            pos: 0,
            line: 1,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn finish(mut self) -> LexOutput {
        self.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), self.line));
        self.errors.append(&mut self.brace_errors);
        LexOutput {
            tokens: self.tokens,
            errors: self.errors,
        }
    }
}

fn count_newlines(text: &str) -> u32 {
    text.matches('\n').count() as u32
}

fn whitespace_handler(lexer: &mut Lexer, matched: &str) {
    lexer.line += count_newlines(matched);
    lexer.advance_n(matched.len());
}

/// Consumes a `{ ... }` comment, honoring nesting.
fn comment_handler(lexer: &mut Lexer, _matched: &str) {
    let mut open_lines: Vec<u32> = vec![];
    let mut line = lexer.line;
    let mut consumed = 0;

    for ch in lexer.remainder().chars() {
        consumed += ch.len_utf8();
        match ch {
            '{' => open_lines.push(line),
            '}' => {
                open_lines.pop();
            }
            '\n' => line += 1,
            _ => {}
        }
        if open_lines.is_empty() {
            break;
        }
    }

    for opened_at in open_lines {
        lexer
            .brace_errors
            .push(Error::new(ErrorImpl::UnclosedComment, opened_at));
    }

    lexer.line = line;
    lexer.advance_n(consumed);
}

fn stray_close_handler(lexer: &mut Lexer, matched: &str) {
    let line = lexer.line;
    lexer
        .brace_errors
        .push(Error::new(ErrorImpl::UnmatchedCloseBrace, line));
    lexer.advance_n(matched.len());
}

fn float_handler(lexer: &mut Lexer, matched: &str) {
    lexer.push(MK_TOKEN!(TokenKind::FloatLiteral, matched.to_string(), lexer.line));
    lexer.advance_n(matched.len());
}

fn int_handler(lexer: &mut Lexer, matched: &str) {
    lexer.push(MK_TOKEN!(TokenKind::IntLiteral, matched.to_string(), lexer.line));
    lexer.advance_n(matched.len());
}

fn symbol_handler(lexer: &mut Lexer, matched: &str) {
    let kind = RESERVED_LOOKUP
        .get(matched)
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push(MK_TOKEN!(kind, matched.to_string(), lexer.line));
    lexer.advance_n(matched.len());
}

/// Scans `source` into tokens. Never fails: invalid characters and brace
/// imbalances are collected in [`LexOutput::errors`] and scanning continues.
pub fn tokenize(source: &str) -> LexOutput {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let found = PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .find(lex.remainder())
                .map(|m| (pattern.handler, m.as_str().to_string()))
        });

        match found {
            Some((handler, matched)) => handler(&mut lex, &matched),
            None => {
                // The remainder is non-empty here, so there is a next char.
                let character = lex.remainder().chars().next().unwrap_or('\0');
                let line = lex.line;
                lex.errors
                    .push(Error::new(ErrorImpl::InvalidCharacter { character }, line));
                lex.advance_n(character.len_utf8().max(1));
            }
        }
    }

    log::debug!(
        "lexer produced {} tokens and {} errors",
        lex.tokens.len() + 1,
        lex.errors.len() + lex.brace_errors.len()
    );
    lex.finish()
}
