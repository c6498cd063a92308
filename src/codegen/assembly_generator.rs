//! # Assembly Generator
//!
//! The top-level orchestrator of code generation. It owns the shared
//! [`CodeGenCommon`] context and assembles the final NASM translation unit:
//!
//! 1. the `.text` header with `global _start` and the runtime externs,
//! 2. every function definition, in source order,
//! 3. `_start` with the non-function top-level statements and the exit
//!    epilogue,
//! 4. the `.data` section with the pooled string literals, concatenated in
//!    front of the text.

use super::common::CodeGenCommon;
use super::statement_generator::StatementGenerator;
use crate::ast::nodes::{Program, Stmt};
use crate::compiler::error::CompileError;

/// Drives the whole code generation phase for one program.
pub struct AssemblyGenerator {
    common: CodeGenCommon,
}

impl AssemblyGenerator {
    pub fn new() -> Self {
        Self {
            common: CodeGenCommon::new(),
        }
    }

    /// Generates the complete assembly text for a program.
    ///
    /// Function definitions are emitted first in code-section order; the
    /// remaining top-level statements run under `_start` in source order.
    /// The same source always produces byte-identical output.
    pub fn generate(&mut self, program: &Program) -> Result<String, CompileError> {
        let mut text = String::from(
            "section .text\nglobal _start\nextern __whacky_strcat\nextern __whacky_strmul\n\n",
        );

        self.common.enter_scope();

        for &stmt in &program.statements {
            if let Stmt::Thingy { .. } = program.arena.stmt(stmt) {
                text.push_str(&StatementGenerator::generate_thingy(
                    &mut self.common,
                    program,
                    stmt,
                )?);
                text.push('\n');
            }
        }

        text.push_str("_start:\n    push rbp\n    mov rbp, rsp\n");

        for &stmt in &program.statements {
            if let Stmt::Thingy { .. } = program.arena.stmt(stmt) {
                continue;
            }
            text.push_str(&StatementGenerator::generate_statement(
                &mut self.common,
                program,
                stmt,
            )?);
        }

        text.push_str(&self.common.leave_scope());
        text.push_str("    pop rbp\n    mov rax, 60\n    mov rdi, 0\n    syscall\n");

        let data = self.common.generate_data_section();
        Ok(format!("{}\n{}", data, text))
    }
}

impl Default for AssemblyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;
    use std::collections::HashSet;

    fn generate(source: &str) -> String {
        let program = parse(tokenize(source).unwrap()).unwrap();
        AssemblyGenerator::new().generate(&program).unwrap()
    }

    fn generate_err(source: &str) -> String {
        let program = parse(tokenize(source).unwrap()).unwrap();
        AssemblyGenerator::new()
            .generate(&program)
            .unwrap_err()
            .to_string()
    }

    /// Collects every label definition in the output.
    fn labels(asm: &str) -> Vec<String> {
        asm.lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                if trimmed.ends_with(':') && !trimmed.starts_with("section") {
                    Some(trimmed.trim_end_matches(':').to_string())
                } else if let Some((label, rest)) = trimmed.split_once(':') {
                    // e.g. "str0_len: equ $- str0"
                    rest.trim().starts_with("equ").then(|| label.to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    #[test]
    fn test_sections_and_entry() {
        let asm = generate("bye(0);");
        assert!(asm.starts_with("section .data\n"));
        assert!(asm.contains("section .text\nglobal _start\n"));
        assert!(asm.contains("extern __whacky_strcat\nextern __whacky_strmul\n"));
        assert!(asm.contains("_start:\n    push rbp\n    mov rbp, rsp\n"));
        assert!(asm.ends_with("    pop rbp\n    mov rax, 60\n    mov rdi, 0\n    syscall\n"));
    }

    #[test]
    fn test_exit_status_scenario() {
        let asm = generate("bye(42);");
        assert!(asm.contains("    push 42\n    pop rdi\n    mov rax, 60\n    syscall\n"));
    }

    #[test]
    fn test_precedence_scenario() {
        // 2 + 3 * 4: the multiplication happens before the addition
        let asm = generate("gimme x: number = 2 + 3 * 4; bye(x);");
        let mul = asm.find("mul rbx").expect("multiplication emitted");
        let add = asm.find("add rax, rbx").expect("addition emitted");
        assert!(mul < add);
    }

    #[test]
    fn test_string_scenario() {
        let asm = generate("gimme s: str = \"hi\"; yell(s + \" there\\n\");");
        assert!(asm.contains("str0 db \"hi\", 0"));
        assert!(asm.contains("str1 db \" there\", 10, 0"));
        assert!(asm.contains("call __whacky_strcat"));
        assert!(asm.contains("    mov rax, 1\n    mov rdi, 1\n    pop rdx\n    pop rsi\n    syscall\n"));
    }

    #[test]
    fn test_function_scenario() {
        let asm =
            generate("thingy add(a: number, b: number): number { gimmeback a + b; } bye(add(7, 8));");
        // definition precedes _start
        let def = asm.find("add0:").expect("function label");
        let start = asm.find("_start:").expect("start label");
        assert!(def < start);
        // args pushed right-to-left: 8 before 7
        let call_site = &asm[start..];
        let eight = call_site.find("push 8").expect("second arg");
        let seven = call_site.find("push 7").expect("first arg");
        assert!(eight < seven);
        assert!(call_site.contains("    call add0\n    add rsp, 16\n    push rax\n"));
    }

    #[test]
    fn test_range_loop_scenario() {
        let asm = generate("roundandround (i in 0 .. 3) { yell(\"x\"); } bye(0);");
        assert!(asm.contains("loop_start"));
        assert!(asm.contains("jle loop_end"));
        assert!(asm.contains("add qword [rbp - 8], 1"));
    }

    #[test]
    fn test_maybe_chain_scenario() {
        let asm = generate(
            "maybe (1 == 2) { bye(1); } but (3 > 2) { bye(2); } nah { bye(3); }",
        );
        assert!(asm.contains("sete al"));
        assert!(asm.contains("setg al"));
        assert!(asm.contains("jz maybe0"));
        assert!(asm.contains("jz but"));
    }

    #[test]
    fn test_determinism() {
        let source = "thingy twice(n: number): number { gimmeback n * 2; }\n\
                      gimme s: str = \"loop\";\n\
                      roundandround (i in 0 .. twice(2)) { yell(s); }\n\
                      bye(0);";
        assert_eq!(generate(source), generate(source));
    }

    #[test]
    fn test_label_uniqueness() {
        let source = "maybe (1) { } but (2) { } nah { }\n\
                      maybe (3) { } nah { }\n\
                      keepgoing (0) { }\n\
                      roundandround (i in 0 .. 2) { }\n\
                      bye(0);";
        let asm = generate(source);
        let all = labels(&asm);
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), unique.len(), "duplicate labels in {:?}", all);
    }

    #[test]
    fn test_string_literal_dedup() {
        let asm = generate("yell(\"same\"); yell(\"same\");");
        assert_eq!(asm.matches("db \"same\", 0").count(), 1);
        assert!(!asm.contains("str1"));
    }

    #[test]
    fn test_scope_balance() {
        let asm = generate("{ gimme a: number = 1; { gimme s: str = \"x\"; } } bye(0);");
        let subs: usize = asm
            .lines()
            .filter_map(|l| l.trim().strip_prefix("sub rsp, "))
            .map(|n| n.parse::<usize>().unwrap_or_default())
            .sum();
        let adds: usize = asm
            .lines()
            .filter_map(|l| l.trim().strip_prefix("add rsp, "))
            .map(|n| n.parse::<usize>().unwrap_or_default())
            .sum();
        assert_eq!(subs, adds);
    }

    #[test]
    fn test_top_level_statements_keep_source_order() {
        let asm = generate("yell(\"a\"); thingy f(): nothin { } yell(\"b\");");
        let start = asm.find("_start:").expect("start label");
        let a = asm.find("mov rax, str0").expect("first yell");
        let b = asm.find("mov rax, str1").expect("second yell");
        assert!(start < a && a < b);
    }

    #[test]
    fn test_top_level_call_may_precede_definition_in_source() {
        // functions are all emitted (and declared) before _start runs
        let asm = generate("bye(later()); thingy later(): number { gimmeback 1; }");
        assert!(asm.contains("call later0"));
    }

    #[test]
    fn test_forward_call_between_functions_is_undeclared() {
        // during the function pass, b is not yet declared while a is emitted
        let err = generate_err(
            "thingy a(): number { gimmeback b(); } thingy b(): number { gimmeback 1; }",
        );
        assert!(err.contains("Undeclared function: b"));
    }

    #[test]
    fn test_duplicate_function_name() {
        let err = generate_err("thingy f(): nothin { } thingy f(): nothin { }");
        assert!(err.contains("already declared"));
    }

    #[test]
    fn test_call_arity_checked_at_emission() {
        let err = generate_err("thingy f(a: number): number { gimmeback a; } bye(f());");
        assert!(err.contains("Argument count mismatch for function: f. Expected: 1. Got: 0"));
    }
}
