//! # Expression Parser
//!
//! This module defines the [`ExpressionParser`], which implements the logic
//! for parsing expressions in Whacky. It uses **precedence climbing** (Pratt
//! parsing) for binary operations, respecting the operator precedence table
//! and left-associativity.

use super::common::Parser;
use crate::ast::arena::{Arena, ExprId, TermId};
use crate::ast::nodes::{BinOp, Expr, Term};
use crate::compiler::error::CompileError;
use crate::compiler::lexer::TokenKind;

/// A static utility struct dedicated to parsing expressions and building
/// expression AST nodes in the arena.
pub struct ExpressionParser;

impl ExpressionParser {
    /// The entry point for parsing any expression.
    ///
    /// Returns `Ok(None)` when the current token does not start an
    /// expression; the caller decides whether that is an error.
    pub fn parse_expression(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<Option<ExprId>, CompileError> {
        Self::parse_binary_expression(parser, arena, 0)
    }

    /// Precedence climbing over binary operators.
    ///
    /// Parses a term as the left operand, then loops: while the current
    /// token is an operator whose precedence is at least `min_prec`, the
    /// right side is parsed with `min_prec` one higher (left-associative)
    /// and folded into a new binary node.
    fn parse_binary_expression(
        parser: &mut Parser,
        arena: &mut Arena,
        min_prec: u8,
    ) -> Result<Option<ExprId>, CompileError> {
        let Some(term) = Self::parse_term(parser, arena)? else {
            return Ok(None);
        };
        let mut left = arena.alloc_expr(Expr::Term(term))?;

        while let Some(op) = Self::parse_operator(parser) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }

            parser.advance(); // the operator token

            let right = Self::parse_binary_expression(parser, arena, prec + 1)?
                .ok_or_else(|| parser.expected("expression"))?;

            left = arena.alloc_expr(Expr::Binary { op, left, right })?;
        }

        Ok(Some(left))
    }

    /// Maps the current token to a [`BinOp`] without consuming it.
    fn parse_operator(parser: &Parser) -> Option<BinOp> {
        match parser.peek()?.kind {
            TokenKind::Or => Some(BinOp::Or),
            TokenKind::And => Some(BinOp::And),
            TokenKind::Band => Some(BinOp::Band),
            TokenKind::Bor => Some(BinOp::Bor),
            TokenKind::Xor => Some(BinOp::Xor),
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::Neq => Some(BinOp::Neq),
            TokenKind::Le => Some(BinOp::Le),
            TokenKind::Ge => Some(BinOp::Ge),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            _ => None,
        }
    }

    /// Parses one atom: a literal, an identifier or call, or a
    /// parenthesised expression. Returns `Ok(None)` if the current token
    /// starts none of these.
    fn parse_term(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<Option<TermId>, CompileError> {
        let Some(token) = parser.peek() else {
            return Ok(None);
        };

        let term = match token.kind {
            TokenKind::IntLit => {
                let lexeme = parser.advance().and_then(|t| t.lexeme).unwrap_or_default();
                Term::IntLit(lexeme)
            }
            TokenKind::BoolLit => {
                let lexeme = parser.advance().and_then(|t| t.lexeme).unwrap_or_default();
                Term::BoolLit(lexeme == "1")
            }
            TokenKind::StringLit => {
                let lexeme = parser.advance().and_then(|t| t.lexeme).unwrap_or_default();
                Term::StringLit(lexeme)
            }
            TokenKind::Ident => {
                let name = parser.advance().and_then(|t| t.lexeme).unwrap_or_default();
                if parser.check(TokenKind::OpenParen) {
                    let args = Self::parse_call_args(parser, arena)?;
                    Term::Call { name, args }
                } else {
                    Term::Ident(name)
                }
            }
            TokenKind::OpenParen => {
                parser.advance(); // '('
                let inner = Self::parse_expression(parser, arena)?
                    .ok_or_else(|| parser.expected("expression"))?;
                parser.expect(TokenKind::CloseParen, "')'")?;
                Term::Paren(inner)
            }
            _ => return Ok(None),
        };

        Ok(Some(arena.alloc_term(term)?))
    }

    /// Parses the argument list of a call: `( expr, expr, … )`. The list may
    /// be empty; a trailing comma is not permitted.
    fn parse_call_args(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<Vec<ExprId>, CompileError> {
        parser.advance(); // '('
        let mut args = Vec::new();

        if !parser.check(TokenKind::CloseParen) {
            loop {
                let arg = Self::parse_expression(parser, arena)?
                    .ok_or_else(|| parser.expected("expression"))?;
                args.push(arg);

                if parser.check(TokenKind::Comma) {
                    parser.advance();
                } else {
                    break;
                }
            }
        }

        parser.expect(TokenKind::CloseParen, "')'")?;
        Ok(args)
    }
}
