//! # Code Generation Common Utilities
//!
//! This module defines the central context structure, [`CodeGenCommon`],
//! which manages the shared state of the code generation phase:
//!
//! - the **scope stack** with per-frame variable and function tables and the
//!   stack-size watermark recorded on entry,
//! - the logical **stack-size counter** mirroring every push and pop,
//! - the **string-literal pool** deduplicating `.data` entries,
//! - the monotonic **label mint** for control-flow labels.

use crate::ast::types::{ReturnType, VarType};
use crate::compiler::error::CompileError;
use std::collections::HashMap;

/// A declared variable and where its bytes live relative to `rbp`.
///
/// Locals sit below the frame pointer (`[rbp - stack_loc]`), parameters
/// above it (`[rbp + stack_loc]`).
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: VarType,
    pub size: usize,
    pub stack_loc: usize,
    pub is_param: bool,
}

/// A declared function: parameter types, return type and its unique label.
#[derive(Debug, Clone)]
pub struct Function {
    pub param_types: Vec<VarType>,
    pub return_type: ReturnType,
    pub label: String,
}

/// One frame of the scope stack.
#[derive(Debug, Default)]
pub struct ScopeFrame {
    pub vars: HashMap<String, Variable>,
    pub functions: HashMap<String, Function>,
    /// The logical stack size at the moment this frame was entered.
    pub watermark: usize,
}

/// Walks the scope stack innermost-first for a variable.
pub fn lookup_var<'a>(scopes: &'a [ScopeFrame], name: &str) -> Option<&'a Variable> {
    scopes.iter().rev().find_map(|frame| frame.vars.get(name))
}

/// Walks the scope stack innermost-first for a function.
pub fn lookup_function<'a>(scopes: &'a [ScopeFrame], name: &str) -> Option<&'a Function> {
    scopes
        .iter()
        .rev()
        .find_map(|frame| frame.functions.get(name))
}

/// A central struct for shared state and utilities during code generation.
#[derive(Debug)]
pub struct CodeGenCommon {
    /// The scope stack; lookups walk innermost-first.
    pub scopes: Vec<ScopeFrame>,
    /// Bytes pushed since the current frame's entry. Every push/pop goes
    /// through the helpers below so this mirror stays exact.
    stack_size: usize,
    /// Counter behind [`Self::next_label`].
    label_counter: usize,
    /// Maps literal text to its `.data` label.
    string_pool: HashMap<String, String>,
    /// Literal texts in first-seen order, for deterministic emission.
    string_order: Vec<String>,
    /// Return type of the function currently being emitted, if any.
    pub current_return: Option<ReturnType>,
}

impl CodeGenCommon {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            stack_size: 0,
            label_counter: 0,
            string_pool: HashMap::new(),
            string_order: Vec::new(),
            current_return: None,
        }
    }

    /// The logical stack size in bytes, relative to the current frame's
    /// entry.
    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    // --- Stack mirroring -------------------------------------------------

    /// Emits `push <operand>` and advances the logical stack size.
    pub fn push(&mut self, operand: &str) -> String {
        self.stack_size += 8;
        format!("    push {}\n", operand)
    }

    /// Emits `push qword <operand>` for memory operands.
    pub fn push_qword(&mut self, operand: &str) -> String {
        self.stack_size += 8;
        format!("    push qword {}\n", operand)
    }

    /// Emits `pop <reg>` and shrinks the logical stack size.
    pub fn pop(&mut self, reg: &str) -> String {
        self.stack_size -= 8;
        format!("    pop {}\n", reg)
    }

    /// Emits `add rsp, <bytes>` to discard values the stack machine no
    /// longer needs (e.g. call arguments after the call returns).
    pub fn discard(&mut self, bytes: usize) -> String {
        if bytes == 0 {
            return String::new();
        }
        self.stack_size -= bytes;
        format!("    add rsp, {}\n", bytes)
    }

    // --- Scopes ----------------------------------------------------------

    /// Pushes a new frame whose watermark is the current stack size.
    pub fn enter_scope(&mut self) {
        self.scopes.push(ScopeFrame {
            watermark: self.stack_size,
            ..ScopeFrame::default()
        });
    }

    /// Pops the innermost frame, emitting the `add rsp, N` that returns the
    /// stack pointer to the frame's watermark.
    pub fn leave_scope(&mut self) -> String {
        let Some(frame) = self.scopes.pop() else {
            return String::new();
        };
        let bytes = self.stack_size - frame.watermark;
        self.stack_size = frame.watermark;
        if bytes == 0 {
            String::new()
        } else {
            format!("    add rsp, {}\n", bytes)
        }
    }

    // --- Declarations and lookups ---------------------------------------

    /// Reserves stack space for a local in the current frame and records it.
    ///
    /// # Returns
    ///
    /// The emitted `sub rsp, SIZE`, or an error if the name already exists
    /// in the current frame.
    pub fn declare_var(&mut self, name: &str, ty: VarType) -> Result<String, CompileError> {
        self.check_redeclaration(name)?;

        let size = ty.size();
        self.stack_size += size;
        let variable = Variable {
            ty,
            size,
            stack_loc: self.stack_size,
            is_param: false,
        };
        if let Some(frame) = self.scopes.last_mut() {
            frame.vars.insert(name.to_string(), variable);
        }
        Ok(format!("    sub rsp, {}\n", size))
    }

    /// Records a parameter in the current frame at a caller-assigned offset
    /// above the frame pointer. No code is emitted.
    pub fn declare_param(
        &mut self,
        name: &str,
        ty: VarType,
        offset: usize,
    ) -> Result<(), CompileError> {
        self.check_redeclaration(name)?;

        let variable = Variable {
            ty,
            size: ty.size(),
            stack_loc: offset,
            is_param: true,
        };
        if let Some(frame) = self.scopes.last_mut() {
            frame.vars.insert(name.to_string(), variable);
        }
        Ok(())
    }

    /// Records a function in the current frame.
    pub fn declare_function(
        &mut self,
        name: &str,
        function: Function,
    ) -> Result<(), CompileError> {
        self.check_redeclaration(name)?;

        if let Some(frame) = self.scopes.last_mut() {
            frame.functions.insert(name.to_string(), function);
        }
        Ok(())
    }

    /// A name may not be redeclared inside the same scope, variable or
    /// function alike.
    fn check_redeclaration(&self, name: &str) -> Result<(), CompileError> {
        if let Some(frame) = self.scopes.last() {
            if frame.vars.contains_key(name) || frame.functions.contains_key(name) {
                return Err(CompileError::generator(format!(
                    "Identifier already declared: {}",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn lookup_var(&self, name: &str) -> Option<&Variable> {
        lookup_var(&self.scopes, name)
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Function> {
        lookup_function(&self.scopes, name)
    }

    // --- Function frames -------------------------------------------------

    /// Switches the context into a fresh function frame: the logical stack
    /// size restarts at zero behind the callee's `push rbp ; mov rbp, rsp`.
    ///
    /// # Returns
    ///
    /// The caller-side stack size, to be handed back to
    /// [`Self::end_function`].
    pub fn begin_function(&mut self, return_type: ReturnType) -> usize {
        let saved = self.stack_size;
        self.stack_size = 0;
        self.current_return = Some(return_type);
        saved
    }

    /// Restores the caller-side stack size after a function body.
    pub fn end_function(&mut self, saved: usize) {
        self.stack_size = saved;
        self.current_return = None;
    }

    // --- Labels ----------------------------------------------------------

    /// Mints a unique label from the monotonic counter, with a readable
    /// prefix (`maybe`, `loop_start`, `why_end`, the function name, ...).
    pub fn next_label(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.label_counter);
        self.label_counter += 1;
        label
    }

    // --- String literals -------------------------------------------------

    /// Adds a string literal to the pool if it is not already there and
    /// returns its `.data` label. Repeated literals share one label.
    pub fn intern_string(&mut self, text: &str) -> String {
        if let Some(label) = self.string_pool.get(text) {
            return label.clone();
        }

        let label = format!("str{}", self.string_order.len());
        self.string_pool.insert(text.to_string(), label.clone());
        self.string_order.push(text.to_string());
        label
    }

    /// Generates the `.data` section with every pooled literal in
    /// first-seen order, each followed by its `_len` assembler constant.
    pub fn generate_data_section(&self) -> String {
        let mut asm = String::from("section .data\n");

        for text in &self.string_order {
            if let Some(label) = self.string_pool.get(text) {
                asm.push_str(&format!("{} db {}\n", label, Self::escape_to_db(text)));
                asm.push_str(&format!("{}_len: equ $- {}\n", label, label));
            }
        }

        asm
    }

    /// Expands the raw literal text into a NASM `db` byte list, splitting
    /// the escape sequences `\n \t \r \\ \"` out as numeric bytes. A NUL
    /// terminator is always appended.
    fn escape_to_db(text: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut run = String::new();
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == '\\' {
                let byte = match chars.peek() {
                    Some('n') => Some(10),
                    Some('t') => Some(9),
                    Some('r') => Some(13),
                    Some('\\') => Some(92),
                    Some('"') => Some(34),
                    _ => None,
                };
                if let Some(byte) = byte {
                    chars.next();
                    if !run.is_empty() {
                        parts.push(format!("\"{}\"", run));
                        run.clear();
                    }
                    parts.push(byte.to_string());
                    continue;
                }
            }
            run.push(ch);
        }

        if !run.is_empty() {
            parts.push(format!("\"{}\"", run));
        }
        parts.push("0".to_string());
        parts.join(", ")
    }
}

impl Default for CodeGenCommon {
    fn default() -> Self {
        Self::new()
    }
}
