//! # Expression Code Generator
//!
//! This module defines the [`ExpressionGenerator`], which lowers expression
//! trees onto the native stack: every evaluation leaves its result on top of
//! the stack, one qword for numbers and booleans, pointer then length
//! (length on top) for strings.
//!
//! Binary expressions emit the **right** operand first, then the left, so
//! the left operand's bytes end up on top when the operands are popped.

use super::common::CodeGenCommon;
use super::operation_generator::OperationGenerator;
use crate::ast::arena::{ExprId, TermId};
use crate::ast::nodes::{BinOp, Expr, Program, Term};
use crate::ast::types::{ReturnType, VarType};
use crate::compiler::error::CompileError;
use crate::compiler::typechecker::TypeChecker;

/// A static utility struct for lowering expressions.
pub struct ExpressionGenerator;

impl ExpressionGenerator {
    /// Lowers any expression; the result ends up on the stack machine.
    pub fn generate_expression(
        common: &mut CodeGenCommon,
        program: &Program,
        expr: ExprId,
    ) -> Result<String, CompileError> {
        match program.arena.expr(expr) {
            Expr::Term(term) => Self::generate_term(common, program, *term),
            Expr::Binary { op, left, right } => {
                Self::generate_binary(common, program, *op, *left, *right)
            }
        }
    }

    fn generate_term(
        common: &mut CodeGenCommon,
        program: &Program,
        term: TermId,
    ) -> Result<String, CompileError> {
        match program.arena.term(term) {
            Term::IntLit(value) => Ok(common.push(value)),
            Term::BoolLit(value) => Ok(common.push(if *value { "1" } else { "0" })),
            Term::StringLit(text) => {
                let label = common.intern_string(text);
                let mut asm = format!("    mov rax, {}\n", label);
                asm.push_str(&common.push("rax"));
                asm.push_str(&common.push(&format!("{}_len", label)));
                Ok(asm)
            }
            Term::Ident(name) => Self::generate_variable_load(common, name),
            Term::Paren(inner) => Self::generate_expression(common, program, *inner),
            Term::Call { name, args } => Self::generate_call(common, program, name, args),
        }
    }

    /// Pushes a variable's value onto the stack machine.
    ///
    /// Numbers and booleans are a single qword. Strings push pointer then
    /// length; the slots sit at `[rbp - loc]` / `[rbp - loc + 8]` for locals
    /// and at `[rbp + loc + 8]` / `[rbp + loc]` for parameters, whose layout
    /// the caller's argument pushes dictate.
    pub fn generate_variable_load(
        common: &mut CodeGenCommon,
        name: &str,
    ) -> Result<String, CompileError> {
        let Some(var) = common.lookup_var(name) else {
            return Err(CompileError::generator(format!(
                "Undeclared identifier: {}",
                name
            )));
        };
        let (ty, loc, is_param) = (var.ty, var.stack_loc, var.is_param);

        let mut asm = String::new();
        match (ty, is_param) {
            (VarType::String, false) => {
                asm.push_str(&common.push_qword(&format!("[rbp - {}]", loc)));
                asm.push_str(&common.push_qword(&format!("[rbp - {}]", loc - 8)));
            }
            (VarType::String, true) => {
                asm.push_str(&common.push_qword(&format!("[rbp + {}]", loc + 8)));
                asm.push_str(&common.push_qword(&format!("[rbp + {}]", loc)));
            }
            (_, false) => asm.push_str(&common.push_qword(&format!("[rbp - {}]", loc))),
            (_, true) => asm.push_str(&common.push_qword(&format!("[rbp + {}]", loc))),
        }
        Ok(asm)
    }

    /// Lowers a call: arguments are evaluated and pushed right-to-left so
    /// argument 0 ends up at the lowest address, the callee is invoked, the
    /// arguments are discarded, and the result is pushed.
    fn generate_call(
        common: &mut CodeGenCommon,
        program: &Program,
        name: &str,
        args: &[ExprId],
    ) -> Result<String, CompileError> {
        let Some(function) = common.lookup_function(name) else {
            return Err(CompileError::generator(format!(
                "Undeclared function: {}",
                name
            )));
        };
        let label = function.label.clone();
        let param_types = function.param_types.clone();
        let return_type = function.return_type;

        if args.len() != param_types.len() {
            return Err(CompileError::generator(format!(
                "Argument count mismatch for function: {}. Expected: {}. Got: {}",
                name,
                param_types.len(),
                args.len()
            )));
        }

        {
            let checker = TypeChecker::new(&common.scopes);
            for (i, (&arg, &expected)) in args.iter().zip(&param_types).enumerate() {
                let found = checker.check_expr(program, arg)?;
                if found != expected {
                    return Err(CompileError::generator(format!(
                        "Type mismatch in argument {} of function '{}'. Expected {}, got {}",
                        i, name, expected, found
                    )));
                }
            }
        }

        let mut asm = String::new();
        for &arg in args.iter().rev() {
            asm.push_str(&Self::generate_expression(common, program, arg)?);
        }

        asm.push_str(&format!("    call {}\n", label));

        let param_bytes: usize = param_types.iter().map(|ty| ty.size()).sum();
        asm.push_str(&common.discard(param_bytes));

        match return_type {
            ReturnType::Value(VarType::String) => {
                asm.push_str(&common.push("rax"));
                asm.push_str(&common.push("rdx"));
            }
            ReturnType::Value(_) => asm.push_str(&common.push("rax")),
            ReturnType::Nothin => {
                return Err(CompileError::generator(format!(
                    "Function '{}' returns nothin and cannot be used in an expression",
                    name
                )));
            }
        }

        Ok(asm)
    }

    /// Lowers a binary expression: type-check both sides, emit right then
    /// left, pop the operands into registers by type, and hand off to the
    /// [`OperationGenerator`].
    fn generate_binary(
        common: &mut CodeGenCommon,
        program: &Program,
        op: BinOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<String, CompileError> {
        let (left_type, right_type) = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_binary(program, op, left, right)?;
            (
                checker.check_expr(program, left)?,
                checker.check_expr(program, right)?,
            )
        };

        let mut asm = String::new();
        asm.push_str(&Self::generate_expression(common, program, right)?);
        asm.push_str(&Self::generate_expression(common, program, left)?);
        asm.push_str(&Self::pop_operands(common, op, left_type, right_type));
        asm.push_str(&OperationGenerator::generate_operation(
            common, op, left_type, right_type,
        )?);
        Ok(asm)
    }

    /// Pops the operands into the registers the operation expects. The left
    /// operand is on top of the stack; a string operand takes two pops,
    /// length then pointer.
    fn pop_operands(
        common: &mut CodeGenCommon,
        op: BinOp,
        left: VarType,
        right: VarType,
    ) -> String {
        let mut asm = String::new();

        if op == BinOp::Add && left == VarType::String && right == VarType::String {
            // __whacky_strcat(left ptr, left len, right ptr, right len, out)
            asm.push_str(&common.pop("rsi"));
            asm.push_str(&common.pop("rdi"));
            asm.push_str(&common.pop("rcx"));
            asm.push_str(&common.pop("rdx"));
            return asm;
        }

        if op == BinOp::Mul && left == VarType::String && right == VarType::Number {
            // __whacky_strmul(ptr, len, count, out)
            asm.push_str(&common.pop("rsi"));
            asm.push_str(&common.pop("rdi"));
            asm.push_str(&common.pop("rdx"));
            return asm;
        }

        if op == BinOp::Mul && left == VarType::Number && right == VarType::String {
            asm.push_str(&common.pop("rdx"));
            asm.push_str(&common.pop("rsi"));
            asm.push_str(&common.pop("rdi"));
            return asm;
        }

        // Generic form: left into rax, right into rbx. For a string operand
        // the first pop discards the length and the second leaves the
        // pointer in the register.
        asm.push_str(&common.pop("rax"));
        if left == VarType::String {
            asm.push_str(&common.pop("rax"));
        }
        asm.push_str(&common.pop("rbx"));
        if right == VarType::String {
            asm.push_str(&common.pop("rbx"));
        }
        asm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::arena::Arena;
    use crate::ast::types::VarType;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::common::Parser;
    use crate::compiler::parser::expression_parser::ExpressionParser;

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

    fn generate(source: &str) -> String {
        let (program, expr) = expr_program(source);
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        ExpressionGenerator::generate_expression(&mut common, &program, expr).unwrap()
    }

    #[test]
    fn test_int_literal_pushes_value() {
        assert_eq!(generate("42"), "    push 42\n");
    }

    #[test]
    fn test_bool_literal_pushes_bit() {
        assert_eq!(generate("yep"), "    push 1\n");
        assert_eq!(generate("nope"), "    push 0\n");
    }

    #[test]
    fn test_string_literal_pushes_pointer_then_length() {
        let asm = generate("\"hi\"");
        assert_eq!(
            asm,
            "    mov rax, str0\n    push rax\n    push str0_len\n"
        );
    }

    #[test]
    fn test_binary_emits_right_operand_first() {
        // 1 - 2: the right operand (2) must be pushed before the left (1)
        let asm = generate("1 - 2");
        let first_push = asm.find("push 2").expect("right operand push");
        let second_push = asm.find("push 1").expect("left operand push");
        assert!(first_push < second_push);
        assert!(asm.contains("    pop rax\n    pop rbx\n    sub rax, rbx\n"));
    }

    #[test]
    fn test_binary_result_left_on_stack() {
        let (program, expr) = expr_program("2 + 3 * 4");
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let _ = ExpressionGenerator::generate_expression(&mut common, &program, expr).unwrap();
        assert_eq!(common.stack_size(), 8);
    }

    #[test]
    fn test_local_number_load() {
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let _ = common.declare_var("x", VarType::Number).unwrap();
        let asm = ExpressionGenerator::generate_variable_load(&mut common, "x").unwrap();
        assert_eq!(asm, "    push qword [rbp - 8]\n");
    }

    #[test]
    fn test_local_string_load_pushes_pointer_then_length() {
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let _ = common.declare_var("s", VarType::String).unwrap();
        let asm = ExpressionGenerator::generate_variable_load(&mut common, "s").unwrap();
        assert_eq!(
            asm,
            "    push qword [rbp - 16]\n    push qword [rbp - 8]\n"
        );
    }

    #[test]
    fn test_param_loads() {
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        common.declare_param("a", VarType::Number, 16).unwrap();
        common.declare_param("s", VarType::String, 24).unwrap();

        let asm = ExpressionGenerator::generate_variable_load(&mut common, "a").unwrap();
        assert_eq!(asm, "    push qword [rbp + 16]\n");

        let asm = ExpressionGenerator::generate_variable_load(&mut common, "s").unwrap();
        assert_eq!(
            asm,
            "    push qword [rbp + 32]\n    push qword [rbp + 24]\n"
        );
    }

    #[test]
    fn test_undeclared_identifier_load() {
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let err = ExpressionGenerator::generate_variable_load(&mut common, "ghost").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Generator Error] Undeclared identifier: ghost"
        );
    }

    #[test]
    fn test_string_concat_sequence() {
        let asm = generate("\"a\" + \"b\"");
        // left operand pops land in rsi/rdi, right in rcx/rdx
        assert!(asm.contains("    pop rsi\n    pop rdi\n    pop rcx\n    pop rdx\n"));
        assert!(asm.contains("call __whacky_strcat"));
    }

    #[test]
    fn test_string_repetition_either_order() {
        let asm = generate("\"ab\" * 3");
        assert!(asm.contains("    pop rsi\n    pop rdi\n    pop rdx\n"));
        assert!(asm.contains("call __whacky_strmul"));

        let asm = generate("3 * \"ab\"");
        assert!(asm.contains("    pop rdx\n    pop rsi\n    pop rdi\n"));
        assert!(asm.contains("call __whacky_strmul"));
    }

    #[test]
    fn test_string_equality_compares_pointers() {
        let asm = generate("\"a\" == \"a\"");
        // each string operand takes two pops; the pointer survives
        assert!(asm.contains("    pop rax\n    pop rax\n    pop rbx\n    pop rbx\n"));
        assert!(asm.contains("sete al"));
    }
}
