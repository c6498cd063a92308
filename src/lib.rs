//! # Whacky Compiler Crate
//!
//! This crate contains the core implementation of the Whacky compiler: a
//! whole-program, ahead-of-time compiler that lowers Whacky source text to
//! x86-64 NASM assembly targeting Linux. The pipeline is
//! lex → parse → type-check → emit; the driver then assembles and links the
//! result with a tiny C runtime providing the string helpers.

// --- Core Modules ---
/// The arena-backed Abstract Syntax Tree and its node/type definitions.
pub mod ast;
/// The code generation phase.
pub mod codegen;
/// The pipeline phases and the `Compiler` driver.
pub mod compiler;
/// Env-gated logging and timing utilities.
pub mod debug;

// --- Public Re-exports (The Compiler API) ---
/// Re-exports the driver managing build and run lifecycles.
pub use compiler::Compiler;
/// Re-exports the front-end error type.
pub use compiler::error::CompileError;
/// Re-exports the parsing function.
pub use compiler::parse;
/// Re-exports the lexical analysis (tokenization) function.
pub use compiler::tokenize;

// Re-exports the code generator for users who need direct access to the
// generated assembly.
pub use crate::codegen::assembly_generator::AssemblyGenerator;

// --- Convenience Functions ---

/// Compiles a source string straight to assembly text.
///
/// This performs: Lexing -> Parsing -> Code Generation (the type checker
/// runs inside the generator). It does **not** assemble or link.
///
/// # Arguments
///
/// * `source` - The raw Whacky source code string.
///
/// # Returns
///
/// The NASM translation unit, or the first [`CompileError`] in the
/// pipeline.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = tokenize(source)?;
    let program = parse(tokens)?;
    let mut generator = AssemblyGenerator::new();
    generator.generate(&program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_end_to_end() {
        let asm = compile("gimme x: number = 2 + 3 * 4; bye(x);").unwrap();
        assert!(asm.contains("_start:"));
        assert!(asm.contains("mul rbx"));
        assert!(asm.contains("mov rax, 60"));
    }

    #[test]
    fn test_compile_surfaces_each_phase_error() {
        assert!(compile("@")
            .unwrap_err()
            .to_string()
            .starts_with("[Tokenize Error]"));
        assert!(compile("bye(")
            .unwrap_err()
            .to_string()
            .starts_with("[Parse Error]"));
        assert!(compile("bye(x);")
            .unwrap_err()
            .to_string()
            .starts_with("[Generator Error]"));
    }
}
