//! # Abstract Syntax Tree (AST) for Whacky
//!
//! This module defines the core structures for the Abstract Syntax Tree (AST)
//! of the Whacky language. The AST is an intermediate representation of the
//! source code used for subsequent phases like type checking and code
//! generation.
//!
//! It includes:
//! - [`arena`]: The bump allocator that owns every node for the duration of a compile.
//! - [`nodes`]: Definitions for the statement, expression, and program nodes.
//! - [`types`]: Definitions for the basic data types and type-related utilities.

pub mod arena;
pub mod nodes;
pub mod types;
