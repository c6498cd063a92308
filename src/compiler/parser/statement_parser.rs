//! # Statement Parser
//!
//! This module defines the [`StatementParser`], responsible for parsing the
//! Whacky statement forms: `bye`, `gimme` declarations, assignments, scopes,
//! `maybe`/`but`/`nah` chains, `yell`, `thingy` definitions, `gimmeback`,
//! `roundandround` range loops and `keepgoing` while loops.
//!
//! Token consumption happens here; expression parsing is delegated to the
//! [`ExpressionParser`].

use super::common::Parser;
use super::expression_parser::ExpressionParser;
use crate::ast::arena::{Arena, ExprId, PredId, ScopeId, StmtId};
use crate::ast::nodes::{Param, Pred, Scope, Stmt};
use crate::ast::types::{ReturnType, VarType};
use crate::compiler::error::CompileError;
use crate::compiler::lexer::TokenKind;

/// A static utility struct dedicated to parsing statements and building
/// statement AST nodes in the arena.
pub struct StatementParser;

impl StatementParser {
    /// Parses exactly one statement, dispatched on the leading token(s).
    pub fn parse_statement(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<StmtId, CompileError> {
        let Some(token) = parser.peek() else {
            return Err(parser.expected("statement"));
        };

        match token.kind {
            TokenKind::Bye => Self::parse_bye(parser, arena),
            TokenKind::Gimme => Self::parse_gimme(parser, arena),
            TokenKind::Ident if parser.peek_at(1).map(|t| t.kind) == Some(TokenKind::Eq) => {
                Self::parse_assignment(parser, arena)
            }
            TokenKind::OpenBrace => {
                let body = Self::parse_scope(parser, arena)?;
                arena.alloc_stmt(Stmt::Scope { body })
            }
            TokenKind::Maybe => Self::parse_maybe(parser, arena),
            TokenKind::Yell => Self::parse_yell(parser, arena),
            TokenKind::Thingy => Self::parse_thingy(parser, arena),
            TokenKind::Gimmeback => Self::parse_gimmeback(parser, arena),
            TokenKind::RoundAndRound => Self::parse_round_and_round(parser, arena),
            TokenKind::KeepGoing => Self::parse_keep_going(parser, arena),
            _ => Err(parser.expected("statement")),
        }
    }

    /// Parses a braced scope: `{ stmt* }`.
    pub fn parse_scope(parser: &mut Parser, arena: &mut Arena) -> Result<ScopeId, CompileError> {
        parser.expect(TokenKind::OpenBrace, "'{'")?;

        let mut statements = Vec::new();
        while !parser.check(TokenKind::CloseBrace) && !parser.is_at_end() {
            statements.push(Self::parse_statement(parser, arena)?);
        }

        parser.expect(TokenKind::CloseBrace, "'}'")?;
        arena.alloc_scope(Scope { statements })
    }

    /// `bye ( expr ) ;`
    fn parse_bye(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // bye
        parser.expect(TokenKind::OpenParen, "'('")?;
        let value = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::CloseParen, "')'")?;
        parser.expect(TokenKind::Semi, "';'")?;
        arena.alloc_stmt(Stmt::Bye { value })
    }

    /// `gimme ident : type = expr ;`
    fn parse_gimme(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // gimme
        let name = Self::expect_identifier(parser)?;
        parser.expect(TokenKind::Colon, "':'")?;
        let ty = Self::parse_var_type(parser)?;
        parser.expect(TokenKind::Eq, "'='")?;
        let value = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::Semi, "';'")?;
        arena.alloc_stmt(Stmt::Gimme { name, ty, value })
    }

    /// `ident = expr ;`
    fn parse_assignment(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        let name = Self::expect_identifier(parser)?;
        parser.advance(); // '='
        let value = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::Semi, "';'")?;
        arena.alloc_stmt(Stmt::Assign { name, value })
    }

    /// `maybe ( expr ) scope pred?`
    fn parse_maybe(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // maybe
        parser.expect(TokenKind::OpenParen, "'('")?;
        let condition = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::CloseParen, "')'")?;
        let body = Self::parse_scope(parser, arena)?;
        let pred = Self::parse_pred(parser, arena)?;
        arena.alloc_stmt(Stmt::Maybe {
            condition,
            body,
            pred,
        })
    }

    /// The optional `but ( expr ) scope pred?` / `nah scope` chain. A `nah`
    /// terminates the chain.
    fn parse_pred(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<Option<PredId>, CompileError> {
        if parser.check(TokenKind::But) {
            parser.advance(); // but
            parser.expect(TokenKind::OpenParen, "'('")?;
            let condition = Self::parse_required_expression(parser, arena)?;
            parser.expect(TokenKind::CloseParen, "')'")?;
            let body = Self::parse_scope(parser, arena)?;
            let next = Self::parse_pred(parser, arena)?;
            Ok(Some(arena.alloc_pred(Pred::But {
                condition,
                body,
                next,
            })?))
        } else if parser.check(TokenKind::Nah) {
            parser.advance(); // nah
            let body = Self::parse_scope(parser, arena)?;
            Ok(Some(arena.alloc_pred(Pred::Nah { body })?))
        } else {
            Ok(None)
        }
    }

    /// `yell ( expr ) ;`
    fn parse_yell(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // yell
        parser.expect(TokenKind::OpenParen, "'('")?;
        let value = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::CloseParen, "')'")?;
        parser.expect(TokenKind::Semi, "';'")?;
        arena.alloc_stmt(Stmt::Yell { value })
    }

    /// `thingy ident ( paramList ) : type scope`
    fn parse_thingy(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // thingy
        let name = Self::expect_identifier(parser)?;
        parser.expect(TokenKind::OpenParen, "'('")?;

        let mut params = Vec::new();
        if !parser.check(TokenKind::CloseParen) {
            loop {
                let param_name = Self::expect_identifier(parser)?;
                parser.expect(TokenKind::Colon, "':'")?;
                let ty = Self::parse_var_type(parser)?;
                params.push(Param {
                    name: param_name,
                    ty,
                });

                if parser.check(TokenKind::Comma) {
                    parser.advance();
                } else {
                    break;
                }
            }
        }

        parser.expect(TokenKind::CloseParen, "')'")?;
        parser.expect(TokenKind::Colon, "':'")?;
        let return_type = Self::parse_return_type(parser)?;
        let body = Self::parse_scope(parser, arena)?;
        arena.alloc_stmt(Stmt::Thingy {
            name,
            params,
            return_type,
            body,
        })
    }

    /// `gimmeback expr ;`
    fn parse_gimmeback(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // gimmeback
        let value = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::Semi, "';'")?;
        arena.alloc_stmt(Stmt::Gimmeback { value })
    }

    /// `roundandround ( ident in expr .. expr ) scope`
    fn parse_round_and_round(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<StmtId, CompileError> {
        parser.advance(); // roundandround
        parser.expect(TokenKind::OpenParen, "'('")?;
        let var = Self::expect_identifier(parser)?;
        parser.expect(TokenKind::In, "'in'")?;
        let start = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::Dot, "'..'")?;
        parser.expect(TokenKind::Dot, "'..'")?;
        let end = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::CloseParen, "')'")?;
        let body = Self::parse_scope(parser, arena)?;
        arena.alloc_stmt(Stmt::RoundAndRound {
            var,
            start,
            end,
            body,
        })
    }

    /// `keepgoing ( expr ) scope`
    fn parse_keep_going(parser: &mut Parser, arena: &mut Arena) -> Result<StmtId, CompileError> {
        parser.advance(); // keepgoing
        parser.expect(TokenKind::OpenParen, "'('")?;
        let condition = Self::parse_required_expression(parser, arena)?;
        parser.expect(TokenKind::CloseParen, "')'")?;
        let body = Self::parse_scope(parser, arena)?;
        arena.alloc_stmt(Stmt::KeepGoing { condition, body })
    }

    fn parse_required_expression(
        parser: &mut Parser,
        arena: &mut Arena,
    ) -> Result<ExprId, CompileError> {
        ExpressionParser::parse_expression(parser, arena)?
            .ok_or_else(|| parser.expected("expression"))
    }

    fn expect_identifier(parser: &mut Parser) -> Result<String, CompileError> {
        let token = parser.expect(TokenKind::Ident, "identifier")?;
        Ok(token.lexeme.unwrap_or_default())
    }

    fn parse_var_type(parser: &mut Parser) -> Result<VarType, CompileError> {
        let ty = match parser.peek().map(|t| t.kind) {
            Some(TokenKind::Number) => VarType::Number,
            Some(TokenKind::Str) => VarType::String,
            Some(TokenKind::Bool) => VarType::Bool,
            _ => return Err(parser.expected("type")),
        };
        parser.advance();
        Ok(ty)
    }

    /// A return type is a value type or `nothin`.
    fn parse_return_type(parser: &mut Parser) -> Result<ReturnType, CompileError> {
        if parser.check(TokenKind::Nothin) {
            parser.advance();
            Ok(ReturnType::Nothin)
        } else {
            Ok(ReturnType::Value(Self::parse_var_type(parser)?))
        }
    }
}
