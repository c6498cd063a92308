//! # Type Checker
//!
//! A pure, read-only walker over expression trees. The generator hands it a
//! borrowed view of the scope stack and asks for the type of an expression
//! at the points where one is needed (variable initialisers, assignment
//! right-hand sides, binary operands, `bye`, `yell`, call arguments); every
//! rule violation comes back as an error the generator reports.

use crate::ast::arena::{ExprId, TermId};
use crate::ast::nodes::{BinOp, Expr, Program, Term};
use crate::ast::types::{ReturnType, VarType};
use crate::codegen::common::{lookup_function, lookup_var, ScopeFrame};
use crate::compiler::error::CompileError;

/// The expression type checker. Holds nothing but a read-only view of the
/// generator's scope stack.
pub struct TypeChecker<'a> {
    scopes: &'a [ScopeFrame],
}

impl<'a> TypeChecker<'a> {
    pub fn new(scopes: &'a [ScopeFrame]) -> Self {
        Self { scopes }
    }

    /// Determines the type of an expression, or the first rule violation
    /// inside it.
    pub fn check_expr(&self, program: &Program, expr: ExprId) -> Result<VarType, CompileError> {
        match program.arena.expr(expr) {
            Expr::Term(term) => self.check_term(program, *term),
            Expr::Binary { op, left, right } => self.check_binary(program, *op, *left, *right),
        }
    }

    fn check_term(&self, program: &Program, term: TermId) -> Result<VarType, CompileError> {
        match program.arena.term(term) {
            Term::IntLit(_) => Ok(VarType::Number),
            Term::BoolLit(_) => Ok(VarType::Bool),
            Term::StringLit(_) => Ok(VarType::String),
            Term::Ident(name) => lookup_var(self.scopes, name)
                .map(|var| var.ty)
                .ok_or_else(|| {
                    CompileError::generator(format!("Undeclared identifier: {}", name))
                }),
            Term::Paren(inner) => self.check_expr(program, *inner),
            Term::Call { name, args } => self.check_call(program, name, args),
        }
    }

    fn check_call(
        &self,
        program: &Program,
        name: &str,
        args: &[ExprId],
    ) -> Result<VarType, CompileError> {
        let Some(function) = lookup_function(self.scopes, name) else {
            return Err(CompileError::generator(format!(
                "Undeclared function: {}",
                name
            )));
        };

        if args.len() != function.param_types.len() {
            return Err(CompileError::generator(format!(
                "Argument count mismatch for function: {}. Expected: {}. Got: {}",
                name,
                function.param_types.len(),
                args.len()
            )));
        }

        for (i, (&arg, &expected)) in args.iter().zip(&function.param_types).enumerate() {
            let found = self.check_expr(program, arg)?;
            if found != expected {
                return Err(CompileError::generator(format!(
                    "Type mismatch in argument {} of function '{}'. Expected {}, got {}",
                    i, name, expected, found
                )));
            }
        }

        match function.return_type {
            ReturnType::Value(ty) => Ok(ty),
            ReturnType::Nothin => Err(CompileError::generator(format!(
                "Function '{}' returns nothin and cannot be used in an expression",
                name
            ))),
        }
    }

    /// The binary operator rules. `+` concatenates when either side is a
    /// string; `*` repeats a string by a number (either order); `==`/`!=`
    /// accept anything; orderings and bitwise operators reject strings.
    pub fn check_binary(
        &self,
        program: &Program,
        op: BinOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<VarType, CompileError> {
        let left_type = self.check_expr(program, left)?;
        let right_type = self.check_expr(program, right)?;

        match op {
            BinOp::Add => {
                if left_type == VarType::String || right_type == VarType::String {
                    return Ok(VarType::String);
                }
                if left_type == VarType::Number && right_type == VarType::Number {
                    return Ok(VarType::Number);
                }
                Err(CompileError::generator(format!(
                    "Invalid types for addition: cannot add {} and {}",
                    left_type, right_type
                )))
            }
            BinOp::Mul => {
                if (left_type == VarType::String && right_type == VarType::Number)
                    || (left_type == VarType::Number && right_type == VarType::String)
                {
                    return Ok(VarType::String);
                }
                if left_type == VarType::Number && right_type == VarType::Number {
                    return Ok(VarType::Number);
                }
                Err(CompileError::generator(format!(
                    "Invalid types for multiplication: cannot multiply {} and {}",
                    left_type, right_type
                )))
            }
            BinOp::Sub | BinOp::Div => {
                if left_type != VarType::Number || right_type != VarType::Number {
                    return Err(CompileError::generator(
                        "Arithmetic operations require numbers",
                    ));
                }
                Ok(VarType::Number)
            }
            BinOp::Eq | BinOp::Neq => Ok(VarType::Bool),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if left_type == VarType::String || right_type == VarType::String {
                    return Err(CompileError::generator(
                        "Comparison operations not supported on strings",
                    ));
                }
                Ok(VarType::Bool)
            }
            BinOp::And | BinOp::Or => Ok(VarType::Bool),
            BinOp::Band | BinOp::Bor | BinOp::Xor => {
                if left_type == VarType::String || right_type == VarType::String {
                    return Err(CompileError::generator(
                        "Bitwise operations not supported on strings",
                    ));
                }
                Ok(VarType::Number)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::arena::Arena;
    use crate::codegen::common::{Function, Variable};
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::common::Parser;
    use crate::compiler::parser::expression_parser::ExpressionParser;

    /// Parses a bare expression into a throwaway program.
    fn expr_program(source: &str) -> (Program, ExprId) {
        let mut parser = Parser::new(tokenize(source).unwrap());
        let mut arena = Arena::new();
        let expr = ExpressionParser::parse_expression(&mut parser, &mut arena)
            .unwrap()
            .expect("expression expected");
        (
            Program {
                arena,
                statements: Vec::new(),
            },
            expr,
        )
    }

    /// A scope with `n: number`, `b: bool`, `s: str` and a couple of
    /// functions to call.
    fn scopes() -> Vec<ScopeFrame> {
        let mut frame = ScopeFrame::default();
        for (name, ty, loc) in [
            ("n", VarType::Number, 8),
            ("b", VarType::Bool, 16),
            ("s", VarType::String, 32),
        ] {
            frame.vars.insert(
                name.to_string(),
                Variable {
                    ty,
                    size: ty.size(),
                    stack_loc: loc,
                    is_param: false,
                },
            );
        }
        frame.functions.insert(
            "add".to_string(),
            Function {
                param_types: vec![VarType::Number, VarType::Number],
                return_type: ReturnType::Value(VarType::Number),
                label: "add0".to_string(),
            },
        );
        frame.functions.insert(
            "noop".to_string(),
            Function {
                param_types: Vec::new(),
                return_type: ReturnType::Nothin,
                label: "noop1".to_string(),
            },
        );
        vec![frame]
    }

    fn check(source: &str) -> Result<VarType, CompileError> {
        let (program, expr) = expr_program(source);
        let scopes = scopes();
        TypeChecker::new(&scopes).check_expr(&program, expr)
    }

    #[test]
    fn test_literals() {
        assert_eq!(check("1").unwrap(), VarType::Number);
        assert_eq!(check("yep").unwrap(), VarType::Bool);
        assert_eq!(check("\"hi\"").unwrap(), VarType::String);
    }

    #[test]
    fn test_identifier_types() {
        assert_eq!(check("n").unwrap(), VarType::Number);
        assert_eq!(check("s").unwrap(), VarType::String);
        assert_eq!(check("(b)").unwrap(), VarType::Bool);
    }

    #[test]
    fn test_undeclared_identifier() {
        let err = check("missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Generator Error] Undeclared identifier: missing"
        );
    }

    #[test]
    fn test_addition_rules() {
        assert_eq!(check("1 + 2").unwrap(), VarType::Number);
        assert_eq!(check("s + s").unwrap(), VarType::String);
        assert_eq!(check("s + 1").unwrap(), VarType::String);
        assert!(check("b + 1").is_err());
    }

    #[test]
    fn test_multiplication_rules() {
        assert_eq!(check("2 * 3").unwrap(), VarType::Number);
        assert_eq!(check("s * 2").unwrap(), VarType::String);
        assert_eq!(check("2 * s").unwrap(), VarType::String);
        assert!(check("s * s").is_err());
    }

    #[test]
    fn test_sub_div_require_numbers() {
        assert_eq!(check("4 - 2").unwrap(), VarType::Number);
        assert_eq!(check("4 / 2").unwrap(), VarType::Number);
        let err = check("s - s").unwrap_err();
        assert!(err.to_string().contains("Arithmetic operations require numbers"));
        assert!(check("b / 1").is_err());
    }

    #[test]
    fn test_equality_accepts_any_operands() {
        assert_eq!(check("1 == 2").unwrap(), VarType::Bool);
        assert_eq!(check("s != s").unwrap(), VarType::Bool);
        assert_eq!(check("s == 1").unwrap(), VarType::Bool);
    }

    #[test]
    fn test_ordering_rejects_strings() {
        assert_eq!(check("1 < 2").unwrap(), VarType::Bool);
        assert_eq!(check("n >= 2").unwrap(), VarType::Bool);
        let err = check("s < s").unwrap_err();
        assert!(err
            .to_string()
            .contains("Comparison operations not supported on strings"));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(check("yep and nope").unwrap(), VarType::Bool);
        assert_eq!(check("1 or 0").unwrap(), VarType::Bool);
    }

    #[test]
    fn test_bitwise_rules() {
        assert_eq!(check("6 band 3").unwrap(), VarType::Number);
        assert_eq!(check("6 bor 3").unwrap(), VarType::Number);
        assert_eq!(check("6 xor 3").unwrap(), VarType::Number);
        let err = check("s xor 1").unwrap_err();
        assert!(err
            .to_string()
            .contains("Bitwise operations not supported on strings"));
    }

    #[test]
    fn test_call_typing() {
        assert_eq!(check("add(1, 2)").unwrap(), VarType::Number);
    }

    #[test]
    fn test_call_arity_mismatch() {
        let err = check("add(1)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Generator Error] Argument count mismatch for function: add. Expected: 2. Got: 1"
        );
    }

    #[test]
    fn test_call_argument_type_mismatch() {
        let err = check("add(1, s)").unwrap_err();
        assert!(err
            .to_string()
            .contains("Type mismatch in argument 1 of function 'add'. Expected number, got str"));
    }

    #[test]
    fn test_undeclared_function() {
        let err = check("ghost()").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Generator Error] Undeclared function: ghost"
        );
    }

    #[test]
    fn test_nothin_call_in_expression() {
        let err = check("noop()").unwrap_err();
        assert!(err.to_string().contains("returns nothin"));
    }
}
