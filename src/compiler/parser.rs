//! # Parser Module
//!
//! This module serves as the primary interface for the syntactic analysis
//! (parsing) phase of the Whacky compiler. It converts the linear token
//! stream produced by the lexer into an arena-backed Abstract Syntax Tree.

// Sub-modules containing the core parsing logic.
pub mod common;
pub mod expression_parser;
pub mod statement_parser;

use crate::ast::arena::Arena;
use crate::ast::nodes::Program;
use crate::compiler::error::CompileError;
use crate::compiler::lexer::Token;
use statement_parser::StatementParser;

/// The main entry point for the parsing phase.
///
/// Statements are parsed until the token stream is exhausted; every parse
/// error is fatal.
///
/// # Arguments
///
/// * `tokens` - The vector of tokens received from the lexer, including
///   positional information.
///
/// # Returns
///
/// A `Result` containing the root [`Program`] (arena plus top-level
/// statement list) or a [`CompileError`].
pub fn parse(tokens: Vec<Token>) -> Result<Program, CompileError> {
    let mut parser = common::Parser::new(tokens);
    let mut arena = Arena::new();
    let mut statements = Vec::new();

    while !parser.is_at_end() {
        statements.push(StatementParser::parse_statement(&mut parser, &mut arena)?);
    }

    Ok(Program { arena, statements })
}
