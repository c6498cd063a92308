//! # Parser Token Cursor
//!
//! The shared token cursor used by the statement and expression parsers:
//! peeking, consuming, and `expect`-style checks that build the
//! start-of-expected parse errors.

use crate::compiler::error::CompileError;
use crate::compiler::lexer::{Token, TokenKind};

/// A cursor over the lexer's token stream.
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    /// The current token, if any.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    /// Looks ahead without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    /// True when the current token has the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind) == Some(kind)
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Consumes and returns the current token.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Consumes the current token if it has the given kind; otherwise builds
    /// an `Expected <what>` error.
    pub fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.expected(what))
    }

    /// Builds an `Expected <what>` parse error at the start-of-expected
    /// position: the previous token's location, falling back to the current
    /// token at the beginning of input.
    pub fn expected(&self, what: &str) -> CompileError {
        let (line, col) = self.error_position();
        CompileError::parse(format!("Expected {}", what), line, col)
    }

    fn error_position(&self) -> (usize, usize) {
        if self.index > 0 {
            let prev = &self.tokens[self.index - 1];
            (prev.line, prev.col)
        } else if let Some(current) = self.tokens.first() {
            (current.line, current.col)
        } else {
            (1, 1)
        }
    }
}
