//! # Code Generation Module
//!
//! This module orchestrates the translation of the Abstract Syntax Tree
//! into x86-64 NASM assembly.
//!
//! Key components:
//! - **Common Context**: scope stack, stack-size mirror, string pool and
//!   label mint shared by all generators.
//! - **Generators**: specialized lowering for expressions, single binary
//!   operations, and statements.
//! - **Assembly Generator**: the entry point producing the final
//!   `.data` + `.text` translation unit.

pub mod assembly_generator;
pub mod common;
pub mod expression_generator;
pub mod operation_generator;
pub mod statement_generator;
