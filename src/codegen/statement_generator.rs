//! # Statement Code Generator
//!
//! This module defines the [`StatementGenerator`], the core component
//! responsible for lowering Whacky statements into sequential x86-64
//! assembly: declarations, assignments, control flow, loops, function
//! definitions and returns.
//!
//! Control-flow labels come from the shared label mint; variables live in
//! frame-pointer-relative slots managed through the scope stack.

use super::common::{CodeGenCommon, Function};
use super::expression_generator::ExpressionGenerator;
use crate::ast::arena::{ExprId, PredId, ScopeId, StmtId};
use crate::ast::nodes::{Pred, Program, Stmt};
use crate::ast::types::{ReturnType, VarType};
use crate::compiler::error::CompileError;
use crate::compiler::typechecker::TypeChecker;

/// A static utility struct for lowering statements.
pub struct StatementGenerator;

impl StatementGenerator {
    /// The dispatcher for a single statement.
    ///
    /// Function definitions are not accepted here: the top-level emitter
    /// handles them in its own pass, so any `thingy` reaching this point is
    /// nested inside another statement.
    pub fn generate_statement(
        common: &mut CodeGenCommon,
        program: &Program,
        stmt: StmtId,
    ) -> Result<String, CompileError> {
        match program.arena.stmt(stmt) {
            Stmt::Bye { value } => Self::generate_bye(common, program, *value),
            Stmt::Gimme { name, ty, value } => {
                Self::generate_gimme(common, program, name, *ty, *value)
            }
            Stmt::Assign { name, value } => Self::generate_assign(common, program, name, *value),
            Stmt::Scope { body } => Self::generate_scope(common, program, *body),
            Stmt::Maybe {
                condition,
                body,
                pred,
            } => Self::generate_maybe(common, program, *condition, *body, *pred),
            Stmt::Yell { value } => Self::generate_yell(common, program, *value),
            Stmt::Thingy { .. } => Err(CompileError::generator(
                "Function definitions are only allowed at top level",
            )),
            Stmt::Gimmeback { value } => Self::generate_gimmeback(common, program, *value),
            Stmt::RoundAndRound {
                var,
                start,
                end,
                body,
            } => Self::generate_round_and_round(common, program, var, *start, *end, *body),
            Stmt::KeepGoing { condition, body } => {
                Self::generate_keep_going(common, program, *condition, *body)
            }
        }
    }

    /// Enters a frame, lowers the scope's statements, and restores the
    /// stack pointer to the frame's watermark on the way out.
    pub fn generate_scope(
        common: &mut CodeGenCommon,
        program: &Program,
        scope: ScopeId,
    ) -> Result<String, CompileError> {
        common.enter_scope();
        let mut asm = String::new();
        for &stmt in &program.arena.scope(scope).statements {
            asm.push_str(&Self::generate_statement(common, program, stmt)?);
        }
        asm.push_str(&common.leave_scope());
        Ok(asm)
    }

    /// `bye(e)`: exit the process with status `e`.
    fn generate_bye(
        common: &mut CodeGenCommon,
        program: &Program,
        value: ExprId,
    ) -> Result<String, CompileError> {
        let ty = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_expr(program, value)?
        };
        if ty != VarType::Number {
            return Err(CompileError::generator(format!(
                "Invalid type for bye: expected number, got {}",
                ty
            )));
        }

        let mut asm = ExpressionGenerator::generate_expression(common, program, value)?;
        asm.push_str(&common.pop("rdi"));
        asm.push_str("    mov rax, 60\n    syscall\n");
        Ok(asm)
    }

    /// `yell(e)`: write the string to stdout via the `write` syscall.
    fn generate_yell(
        common: &mut CodeGenCommon,
        program: &Program,
        value: ExprId,
    ) -> Result<String, CompileError> {
        let ty = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_expr(program, value)?
        };
        if ty != VarType::String {
            return Err(CompileError::generator(format!(
                "Invalid type for yell: expected str, got {}",
                ty
            )));
        }

        let mut asm = ExpressionGenerator::generate_expression(common, program, value)?;
        asm.push_str("    mov rax, 1\n    mov rdi, 1\n");
        asm.push_str(&common.pop("rdx"));
        asm.push_str(&common.pop("rsi"));
        asm.push_str("    syscall\n");
        Ok(asm)
    }

    /// `gimme x: T = e`: reserve the slot, evaluate, store.
    fn generate_gimme(
        common: &mut CodeGenCommon,
        program: &Program,
        name: &str,
        ty: VarType,
        value: ExprId,
    ) -> Result<String, CompileError> {
        let found = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_expr(program, value)?
        };
        if found != ty {
            return Err(CompileError::generator(format!(
                "Type mismatch in declaration of '{}': expected {}, got {}",
                name, ty, found
            )));
        }

        let mut asm = common.declare_var(name, ty)?;
        asm.push_str(&ExpressionGenerator::generate_expression(
            common, program, value,
        )?);
        asm.push_str(&Self::generate_variable_store(common, name)?);
        Ok(asm)
    }

    /// `x = e`: evaluate and store into the existing slot.
    fn generate_assign(
        common: &mut CodeGenCommon,
        program: &Program,
        name: &str,
        value: ExprId,
    ) -> Result<String, CompileError> {
        let Some(var) = common.lookup_var(name) else {
            return Err(CompileError::generator(format!(
                "Assignment to undeclared variable: {}",
                name
            )));
        };
        let expected = var.ty;

        let found = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_expr(program, value)?
        };
        if found != expected {
            return Err(CompileError::generator(format!(
                "Type mismatch in assignment to '{}': expected {}, got {}",
                name, expected, found
            )));
        }

        let mut asm = ExpressionGenerator::generate_expression(common, program, value)?;
        asm.push_str(&Self::generate_variable_store(common, name)?);
        Ok(asm)
    }

    /// Pops a value off the stack machine into a variable's slot, the
    /// inverse of the load in the expression generator.
    pub fn generate_variable_store(
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
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp - {}], rax\n", loc - 8));
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp - {}], rax\n", loc));
            }
            (VarType::String, true) => {
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp + {}], rax\n", loc));
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp + {}], rax\n", loc + 8));
            }
            (_, false) => {
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp - {}], rax\n", loc));
            }
            (_, true) => {
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    mov [rbp + {}], rax\n", loc));
            }
        }
        Ok(asm)
    }

    /// `maybe (e) S pred?`: zero test with a fall-through label, optional
    /// `but`/`nah` chain sharing one end label.
    fn generate_maybe(
        common: &mut CodeGenCommon,
        program: &Program,
        condition: ExprId,
        body: ScopeId,
        pred: Option<PredId>,
    ) -> Result<String, CompileError> {
        Self::check_condition(common, program, condition)?;

        let false_label = common.next_label("maybe");
        let mut asm = ExpressionGenerator::generate_expression(common, program, condition)?;
        asm.push_str(&common.pop("rax"));
        asm.push_str(&format!("    cmp rax, 0\n    jz {}\n", false_label));
        asm.push_str(&Self::generate_scope(common, program, body)?);

        if let Some(pred) = pred {
            let end_label = common.next_label("maybe_end");
            asm.push_str(&format!("    jmp {}\n", end_label));
            asm.push_str(&format!("{}:\n", false_label));
            asm.push_str(&Self::generate_pred(common, program, pred, &end_label)?);
            asm.push_str(&format!("{}:\n", end_label));
        } else {
            asm.push_str(&format!("{}:\n", false_label));
        }
        Ok(asm)
    }

    /// One link of the `but`/`nah` chain.
    fn generate_pred(
        common: &mut CodeGenCommon,
        program: &Program,
        pred: PredId,
        end_label: &str,
    ) -> Result<String, CompileError> {
        match program.arena.pred(pred) {
            Pred::But {
                condition,
                body,
                next,
            } => {
                Self::check_condition(common, program, *condition)?;

                let false_label = common.next_label("but");
                let mut asm =
                    ExpressionGenerator::generate_expression(common, program, *condition)?;
                asm.push_str(&common.pop("rax"));
                asm.push_str(&format!("    cmp rax, 0\n    jz {}\n", false_label));
                asm.push_str(&Self::generate_scope(common, program, *body)?);
                asm.push_str(&format!("    jmp {}\n", end_label));
                asm.push_str(&format!("{}:\n", false_label));
                if let Some(next) = next {
                    asm.push_str(&Self::generate_pred(common, program, *next, end_label)?);
                }
                Ok(asm)
            }
            Pred::Nah { body } => Self::generate_scope(common, program, *body),
        }
    }

    /// `keepgoing (e) S`: test at the top, jump back after the body.
    fn generate_keep_going(
        common: &mut CodeGenCommon,
        program: &Program,
        condition: ExprId,
        body: ScopeId,
    ) -> Result<String, CompileError> {
        Self::check_condition(common, program, condition)?;

        let start_label = common.next_label("why_start");
        let end_label = common.next_label("why_end");

        let mut asm = format!("{}:\n", start_label);
        asm.push_str(&ExpressionGenerator::generate_expression(
            common, program, condition,
        )?);
        asm.push_str(&common.pop("rax"));
        asm.push_str(&format!("    cmp rax, 0\n    jz {}\n", end_label));
        asm.push_str(&Self::generate_scope(common, program, body)?);
        asm.push_str(&format!("    jmp {}\n{}:\n", start_label, end_label));
        Ok(asm)
    }

    /// `roundandround (i in a .. b) S`: `i` is a fresh number local; the
    /// end bound is re-evaluated every iteration and the loop runs while
    /// `i < b`.
    fn generate_round_and_round(
        common: &mut CodeGenCommon,
        program: &Program,
        var: &str,
        start: ExprId,
        end: ExprId,
        body: ScopeId,
    ) -> Result<String, CompileError> {
        {
            let checker = TypeChecker::new(&common.scopes);
            for bound in [start, end] {
                let ty = checker.check_expr(program, bound)?;
                if ty != VarType::Number {
                    return Err(CompileError::generator(format!(
                        "Invalid type for loop bound: expected number, got {}",
                        ty
                    )));
                }
            }
        }

        common.enter_scope();
        let mut asm = common.declare_var(var, VarType::Number)?;
        let loc = common
            .lookup_var(var)
            .map(|v| v.stack_loc)
            .unwrap_or_default();

        asm.push_str(&ExpressionGenerator::generate_expression(
            common, program, start,
        )?);
        asm.push_str(&Self::generate_variable_store(common, var)?);

        let start_label = common.next_label("loop_start");
        let end_label = common.next_label("loop_end");

        asm.push_str(&format!("{}:\n", start_label));
        asm.push_str(&ExpressionGenerator::generate_expression(
            common, program, end,
        )?);
        asm.push_str(&common.pop("rax"));
        asm.push_str(&format!(
            "    cmp rax, [rbp - {}]\n    jle {}\n",
            loc, end_label
        ));
        asm.push_str(&Self::generate_scope(common, program, body)?);
        asm.push_str(&format!("    add qword [rbp - {}], 1\n", loc));
        asm.push_str(&format!("    jmp {}\n{}:\n", start_label, end_label));
        asm.push_str(&common.leave_scope());
        Ok(asm)
    }

    /// `gimmeback e`: pop the result into the return registers, unwind the
    /// whole frame against the function's entry watermark, and return.
    fn generate_gimmeback(
        common: &mut CodeGenCommon,
        program: &Program,
        value: ExprId,
    ) -> Result<String, CompileError> {
        let Some(return_type) = common.current_return else {
            return Err(CompileError::generator(
                "gimmeback is only allowed inside a thingy",
            ));
        };

        let expected = match return_type {
            ReturnType::Nothin => {
                return Err(CompileError::generator(
                    "Type mismatch in gimmeback: function returns nothin",
                ));
            }
            ReturnType::Value(ty) => ty,
        };

        let found = {
            let checker = TypeChecker::new(&common.scopes);
            checker.check_expr(program, value)?
        };
        if found != expected {
            return Err(CompileError::generator(format!(
                "Type mismatch in gimmeback: expected {}, got {}",
                expected, found
            )));
        }

        let mut asm = ExpressionGenerator::generate_expression(common, program, value)?;
        if expected == VarType::String {
            asm.push_str(&common.pop("rdx"));
            asm.push_str(&common.pop("rax"));
        } else {
            asm.push_str(&common.pop("rax"));
        }

        // Unwind everything the frame accumulated, not just the innermost
        // scope. The counter itself is untouched: emission continues after
        // the ret for any statements that follow.
        let cleanup = common.stack_size();
        if cleanup > 0 {
            asm.push_str(&format!("    add rsp, {}\n", cleanup));
        }
        asm.push_str("    pop rbp\n    ret\n");
        Ok(asm)
    }

    /// `thingy name(params): T S`: label, prologue, parameter slots above
    /// the frame pointer, body, epilogue. Only the top-level emitter calls
    /// this.
    pub fn generate_thingy(
        common: &mut CodeGenCommon,
        program: &Program,
        stmt: StmtId,
    ) -> Result<String, CompileError> {
        let Stmt::Thingy {
            name,
            params,
            return_type,
            body,
        } = program.arena.stmt(stmt)
        else {
            return Err(CompileError::generator("Expected a function definition"));
        };

        let label = common.next_label(name);
        common.declare_function(
            name,
            Function {
                param_types: params.iter().map(|p| p.ty).collect(),
                return_type: *return_type,
                label: label.clone(),
            },
        )?;

        let mut asm = format!("{}:\n    push rbp\n    mov rbp, rsp\n", label);

        let saved = common.begin_function(*return_type);
        common.enter_scope();

        // Parameters start at rbp+16, above the saved rbp and return
        // address; each one advances the next slot by its size.
        let mut offset = 16;
        for param in params {
            common.declare_param(&param.name, param.ty, offset)?;
            offset += param.ty.size();
        }

        for &stmt in &program.arena.scope(*body).statements {
            asm.push_str(&Self::generate_statement(common, program, stmt)?);
        }

        asm.push_str(&common.leave_scope());
        common.end_function(saved);

        asm.push_str("    pop rbp\n    ret\n");
        Ok(asm)
    }

    /// Conditions are zero-tested in a single register, so strings are
    /// rejected; numbers and booleans pass.
    fn check_condition(
        common: &CodeGenCommon,
        program: &Program,
        condition: ExprId,
    ) -> Result<(), CompileError> {
        let ty = TypeChecker::new(&common.scopes).check_expr(program, condition)?;
        if ty == VarType::String {
            return Err(CompileError::generator(
                "Invalid type for condition: expected number or bool, got str",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;

    /// Lowers the top-level statements of `source` inside one scope,
    /// treating every statement as non-function code.
    fn generate(source: &str) -> String {
        let program = parse(tokenize(source).unwrap()).unwrap();
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let mut asm = String::new();
        for &stmt in &program.statements {
            asm.push_str(
                &StatementGenerator::generate_statement(&mut common, &program, stmt).unwrap(),
            );
        }
        asm
    }

    fn generate_err(source: &str) -> String {
        let program = parse(tokenize(source).unwrap()).unwrap();
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let mut result = Ok(String::new());
        for &stmt in &program.statements {
            result = StatementGenerator::generate_statement(&mut common, &program, stmt);
            if result.is_err() {
                break;
            }
        }
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_bye_emits_exit_syscall() {
        let asm = generate("bye(42);");
        assert_eq!(asm, "    push 42\n    pop rdi\n    mov rax, 60\n    syscall\n");
    }

    #[test]
    fn test_bye_requires_number() {
        let err = generate_err("bye(\"hi\");");
        assert_eq!(
            err,
            "[Generator Error] Invalid type for bye: expected number, got str"
        );
    }

    #[test]
    fn test_yell_emits_write_syscall() {
        let asm = generate("yell(\"hi\");");
        assert!(asm.contains("    mov rax, 1\n    mov rdi, 1\n    pop rdx\n    pop rsi\n    syscall\n"));
    }

    #[test]
    fn test_yell_requires_string() {
        let err = generate_err("yell(1);");
        assert_eq!(
            err,
            "[Generator Error] Invalid type for yell: expected str, got number"
        );
    }

    #[test]
    fn test_gimme_reserves_evaluates_stores() {
        let asm = generate("gimme x: number = 7;");
        assert_eq!(
            asm,
            "    sub rsp, 8\n    push 7\n    pop rax\n    mov [rbp - 8], rax\n"
        );
    }

    #[test]
    fn test_gimme_string_stores_both_qwords() {
        let asm = generate("gimme s: str = \"hi\";");
        assert!(asm.starts_with("    sub rsp, 16\n"));
        assert!(asm.contains("    mov [rbp - 8], rax\n")); // length slot
        assert!(asm.contains("    mov [rbp - 16], rax\n")); // pointer slot
    }

    #[test]
    fn test_gimme_type_mismatch() {
        let err = generate_err("gimme x: number = \"hi\";");
        assert!(err.contains("Type mismatch in declaration of 'x': expected number, got str"));
    }

    #[test]
    fn test_assignment_to_undeclared_variable() {
        let err = generate_err("x = 1;");
        assert_eq!(
            err,
            "[Generator Error] Assignment to undeclared variable: x"
        );
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let err = generate_err("gimme x: number = 1; x = yep;");
        assert!(err.contains("Type mismatch in assignment to 'x': expected number, got bool"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let err = generate_err("gimme x: number = 1; gimme x: number = 2;");
        assert_eq!(err, "[Generator Error] Identifier already declared: x");
    }

    #[test]
    fn test_scope_balances_stack() {
        let asm = generate("{ gimme x: number = 1; }");
        assert!(asm.contains("    sub rsp, 8\n"));
        assert!(asm.ends_with("    add rsp, 8\n"));
    }

    #[test]
    fn test_maybe_without_pred() {
        let asm = generate("maybe (1) { bye(0); }");
        assert!(asm.contains("    cmp rax, 0\n    jz maybe0\n"));
        assert!(asm.ends_with("maybe0:\n"));
    }

    #[test]
    fn test_maybe_but_nah_chain_labels() {
        let asm = generate("maybe (1 == 2) { bye(1); } but (3 > 2) { bye(2); } nah { bye(3); }");
        assert!(asm.contains("jz maybe0"));
        assert!(asm.contains("jmp maybe_end1"));
        assert!(asm.contains("jz but2"));
        assert!(asm.contains("maybe_end1:\n"));
    }

    #[test]
    fn test_condition_rejects_strings() {
        let err = generate_err("maybe (\"hi\") { }");
        assert!(err.contains("Invalid type for condition"));
    }

    #[test]
    fn test_keep_going_shape() {
        let asm = generate("keepgoing (1) { }");
        assert!(asm.starts_with("why_start0:\n"));
        assert!(asm.contains("    cmp rax, 0\n    jz why_end1\n"));
        assert!(asm.contains("    jmp why_start0\nwhy_end1:\n"));
    }

    #[test]
    fn test_round_and_round_shape() {
        let asm = generate("roundandround (i in 0 .. 3) { }");
        assert!(asm.contains("    sub rsp, 8\n"));
        assert!(asm.contains("loop_start0:\n"));
        assert!(asm.contains("    cmp rax, [rbp - 8]\n    jle loop_end1\n"));
        assert!(asm.contains("    add qword [rbp - 8], 1\n"));
        assert!(asm.ends_with("    add rsp, 8\n")); // loop variable released
    }

    #[test]
    fn test_round_and_round_bounds_must_be_numbers() {
        let err = generate_err("roundandround (i in 0 .. \"x\") { }");
        assert!(err.contains("Invalid type for loop bound"));
    }

    #[test]
    fn test_gimmeback_outside_function() {
        let err = generate_err("gimmeback 1;");
        assert_eq!(
            err,
            "[Generator Error] gimmeback is only allowed inside a thingy"
        );
    }

    #[test]
    fn test_nested_thingy_rejected() {
        let err = generate_err("{ thingy f(): nothin { } }");
        assert!(err.contains("only allowed at top level"));
    }

    #[test]
    fn test_thingy_prologue_params_epilogue() {
        let program =
            parse(tokenize("thingy add(a: number, b: number): number { gimmeback a + b; }").unwrap())
                .unwrap();
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let asm =
            StatementGenerator::generate_thingy(&mut common, &program, program.statements[0])
                .unwrap();

        assert!(asm.starts_with("add0:\n    push rbp\n    mov rbp, rsp\n"));
        assert!(asm.contains("push qword [rbp + 16]")); // a
        assert!(asm.contains("push qword [rbp + 24]")); // b
        assert!(asm.ends_with("    pop rbp\n    ret\n"));
        // the function is now callable from the enclosing scope
        assert!(common.lookup_function("add").is_some());
        assert_eq!(common.stack_size(), 0);
    }

    #[test]
    fn test_gimmeback_unwinds_nested_scopes() {
        let source = "thingy f(): number { gimme x: number = 1; { gimme y: number = 2; gimmeback x; } }";
        let program = parse(tokenize(source).unwrap()).unwrap();
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let asm =
            StatementGenerator::generate_thingy(&mut common, &program, program.statements[0])
                .unwrap();
        // x and y are both live at the return: 16 bytes unwound
        assert!(asm.contains("    add rsp, 16\n    pop rbp\n    ret\n"));
    }

    #[test]
    fn test_param_redeclaration_rejected() {
        let program = parse(tokenize("thingy f(a: number): nothin { gimme a: number = 1; }").unwrap())
            .unwrap();
        let mut common = CodeGenCommon::new();
        common.enter_scope();
        let err = StatementGenerator::generate_thingy(&mut common, &program, program.statements[0])
            .unwrap_err();
        assert!(err.to_string().contains("already declared"));
    }
}
