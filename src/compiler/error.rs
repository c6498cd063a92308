//! # Compiler Error Definitions
//!
//! This module centralizes all custom error types that can occur during the
//! entire compilation pipeline of Whacky programs.
//!
//! It leverages the `thiserror` crate to simplify error reporting. Front-end
//! errors carry their phase in the rendered message (`[Tokenize Error]`,
//! `[Parse Error]`, `[Generator Error]`); the type checker reports through
//! the generator. Every error is fatal: the driver prints the single
//! rendered line to stderr and exits non-zero.

use std::process::ExitStatus;
use thiserror::Error;

/// The primary error enumeration for the Whacky compiler.
#[derive(Error, Debug)]
pub enum CompileError {
    /// Lexer errors: unrecognised bytes, unterminated strings or block
    /// comments. Positions are 1-based line and column of the offending byte.
    #[error("[Tokenize Error] {message} at {line}:{col}")]
    Tokenize {
        message: String,
        line: usize,
        col: usize,
    },

    /// Parser errors, reported at the start-of-expected position.
    #[error("[Parse Error] {message} at {line}:{col}")]
    Parse {
        message: String,
        line: usize,
        col: usize,
    },

    /// AST arena exhaustion while parsing.
    #[error("[Parse Error] {message}")]
    AstAlloc { message: String },

    /// Generator errors: type, scope, name and return-semantics problems.
    #[error("[Generator Error] {message}")]
    Generator { message: String },

    /// Wrong command-line invocation.
    #[error("Incorrect usage. Correct usage is ...\nwhacky <input.wy>")]
    Usage,

    /// Wrapper for standard I/O errors (e.g., file reading/writing).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// `nasm` exited with a non-zero status.
    #[error("Assembler failed with status: {0}")]
    AssemblerFailed(ExitStatus),

    /// `ld` exited with a non-zero status.
    #[error("Linker failed with status: {0}")]
    LinkerFailed(ExitStatus),

    /// Error raised while spawning an external tool or the produced binary.
    #[error("Execution error: {0}")]
    ExecutionError(#[source] std::io::Error),
}

impl CompileError {
    /// Constructs a **Tokenize**-phase error with positional information.
    pub fn tokenize(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::Tokenize {
            message: message.into(),
            line,
            col,
        }
    }

    /// Constructs a **Parse**-phase error with positional information.
    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            col,
        }
    }

    /// Constructs an arena-exhaustion error.
    pub fn ast_alloc(message: impl Into<String>) -> Self {
        Self::AstAlloc {
            message: message.into(),
        }
    }

    /// Constructs a **Generator**-phase error (also used by the type
    /// checker, which reports through the generator).
    pub fn generator(message: impl Into<String>) -> Self {
        Self::Generator {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_forms() {
        let err = CompileError::tokenize("Unrecognised character '@'", 3, 7);
        assert_eq!(
            err.to_string(),
            "[Tokenize Error] Unrecognised character '@' at 3:7"
        );

        let err = CompileError::parse("Expected ';'", 1, 8);
        assert_eq!(err.to_string(), "[Parse Error] Expected ';' at 1:8");

        let err = CompileError::generator("Undeclared identifier: x");
        assert_eq!(
            err.to_string(),
            "[Generator Error] Undeclared identifier: x"
        );
    }

    #[test]
    fn test_usage_display() {
        let rendered = CompileError::Usage.to_string();
        assert!(rendered.starts_with("Incorrect usage"));
        assert!(rendered.contains("whacky <input.wy>"));
    }
}
