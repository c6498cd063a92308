//! # Compiler Module
//!
//! This module acts as the core entry point and orchestrator for the Whacky
//! compiler. It aggregates the pipeline phases (lexer, parser, type checker,
//! codegen) and defines the [`Compiler`] driver that turns a `.wy` source
//! file into a linked executable.

// Publicly exposes the compiler phases.
pub mod error;
pub mod lexer;
pub mod parser;
pub mod typechecker;

// Re-exports essential functions for external use.
pub use lexer::tokenize;
pub use parser::parse;

use crate::codegen::assembly_generator::AssemblyGenerator;
use crate::debug::{log_codegen, log_compiler, log_lexer, log_parser, PerfTimer};
use error::CompileError;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

/// The driver managing compilation, assembly and linking of a Whacky
/// program.
///
/// The front-end writes `out.asm` into the current directory; `nasm` and
/// `ld` then produce `out.o` and the final `out` binary, linked against the
/// static runtime archive that provides the string helpers.
pub struct Compiler {
    /// The `.wy` source file to compile.
    pub source_path: PathBuf,
    /// The static runtime archive handed to the linker.
    pub runtime_path: PathBuf,
    /// Print the generated assembly to stdout instead of assembling it.
    pub show_asm: bool,
    /// Phase-by-phase progress messages.
    pub verbose: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            source_path: PathBuf::from("."),
            runtime_path: PathBuf::from("libwhacky_runtime.a"),
            show_asm: false,
            verbose: false,
        }
    }

    /// Runs the full pipeline for the configured source file:
    /// read → tokenize → parse → generate → assemble → link.
    pub fn build(&self) -> Result<(), CompileError> {
        let timer = PerfTimer::new("build");
        self.log(&format!("Compiling {:?}", self.source_path));

        let source = std::fs::read_to_string(&self.source_path)?;

        let tokens = tokenize(&source)?;
        log_lexer(&format!("{} tokens", tokens.len()));

        let program = parse(tokens)?;
        log_parser(&format!("{} top-level statements", program.statements.len()));

        let mut generator = AssemblyGenerator::new();
        let asm = generator.generate(&program)?;
        log_codegen(&format!("{} lines of assembly", asm.lines().count()));

        if self.show_asm {
            println!("{}", asm);
            timer.finish();
            return Ok(());
        }

        std::fs::write("out.asm", &asm)?;
        self.assemble_and_link()?;

        timer.finish();
        Ok(())
    }

    /// Builds, then executes `./out` and reports its exit status. A Whacky
    /// program picks its own status via `bye`, so a non-zero exit is not a
    /// driver failure.
    pub fn run(&self) -> Result<ExitStatus, CompileError> {
        self.build()?;
        Command::new("./out")
            .status()
            .map_err(CompileError::ExecutionError)
    }

    /// Invokes `nasm` on `out.asm` and links `out.o` with the runtime.
    fn assemble_and_link(&self) -> Result<(), CompileError> {
        self.log("Assembling out.asm");
        let assemble_status = Command::new("nasm")
            .arg("-felf64")
            .arg("out.asm")
            .status()
            .map_err(CompileError::ExecutionError)?;

        if !assemble_status.success() {
            return Err(CompileError::AssemblerFailed(assemble_status));
        }

        self.log("Linking out");
        let link_status = Command::new("ld")
            .arg("-o")
            .arg("out")
            .arg("out.o")
            .arg(&self.runtime_path)
            .arg("-lc")
            .arg("-dynamic-linker")
            .arg("/lib64/ld-linux-x86-64.so.2")
            .status()
            .map_err(CompileError::ExecutionError)?;

        if !link_status.success() {
            return Err(CompileError::LinkerFailed(link_status));
        }

        Ok(())
    }

    fn log(&self, message: &str) {
        if self.verbose {
            println!("{}", message);
        }
        log_compiler(message);
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let compiler = Compiler::new();
        assert_eq!(compiler.runtime_path, PathBuf::from("libwhacky_runtime.a"));
        assert!(!compiler.show_asm);
        assert!(!compiler.verbose);
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let mut compiler = Compiler::new();
        compiler.source_path = PathBuf::from("definitely_not_here.wy");
        let err = compiler.build().unwrap_err();
        assert!(matches!(err, CompileError::IoError(_)));
    }

    #[test]
    fn test_build_show_asm_stops_before_assembler() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "bye(7);").unwrap();

        let mut compiler = Compiler::new();
        compiler.source_path = file.path().to_path_buf();
        compiler.show_asm = true;
        // with --show-asm no external tool runs, so this succeeds anywhere
        compiler.build().unwrap();
    }

    #[test]
    fn test_front_end_error_surfaces() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "bye(42)").unwrap();

        let mut compiler = Compiler::new();
        compiler.source_path = file.path().to_path_buf();
        compiler.show_asm = true;
        let err = compiler.build().unwrap_err();
        assert_eq!(err.to_string(), "[Parse Error] Expected ';' at 1:7");
    }
}
