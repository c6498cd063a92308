//! # Operation Code Generator
//!
//! Emits the assembly fragment for a single binary operator once the
//! operands have been popped into their registers. Numeric operands arrive
//! in `rax` (left) and `rbx` (right); the string forms of `+` and `*` get
//! their pointer/length pairs in the runtime call registers instead (see
//! [`ExpressionGenerator`]).
//!
//! Every fragment ends by pushing the result back onto the stack machine:
//! one qword for numbers and booleans, pointer then length for strings.
//!
//! [`ExpressionGenerator`]: crate::codegen::expression_generator::ExpressionGenerator

use super::common::CodeGenCommon;
use crate::ast::nodes::BinOp;
use crate::ast::types::VarType;
use crate::compiler::error::CompileError;

/// A static utility struct emitting per-operator fragments.
pub struct OperationGenerator;

impl OperationGenerator {
    /// Dispatches on the operator category.
    pub fn generate_operation(
        common: &mut CodeGenCommon,
        op: BinOp,
        left: VarType,
        right: VarType,
    ) -> Result<String, CompileError> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                Self::generate_arithmetic(common, op, left, right)
            }
            BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                Ok(Self::generate_comparison(common, op))
            }
            BinOp::And | BinOp::Or => Ok(Self::generate_logical(common, op)),
            BinOp::Band | BinOp::Bor | BinOp::Xor => Ok(Self::generate_bitwise(common, op)),
        }
    }

    fn generate_arithmetic(
        common: &mut CodeGenCommon,
        op: BinOp,
        left: VarType,
        right: VarType,
    ) -> Result<String, CompileError> {
        match op {
            BinOp::Add => {
                if left == VarType::String && right == VarType::String {
                    return Ok(Self::generate_runtime_call(common, "__whacky_strcat", "r8"));
                }
                if left == VarType::String || right == VarType::String {
                    // The checker types mixed + as a string, but there is no
                    // number-to-string conversion to concatenate with.
                    return Err(CompileError::generator(format!(
                        "String addition requires two strings, got {} and {}",
                        left, right
                    )));
                }
                let mut asm = String::from("    add rax, rbx\n");
                asm.push_str(&common.push("rax"));
                Ok(asm)
            }
            BinOp::Sub => {
                let mut asm = String::from("    sub rax, rbx\n");
                asm.push_str(&common.push("rax"));
                Ok(asm)
            }
            BinOp::Mul => {
                if left == VarType::String || right == VarType::String {
                    return Ok(Self::generate_runtime_call(common, "__whacky_strmul", "rcx"));
                }
                let mut asm = String::from("    mul rbx\n");
                asm.push_str(&common.push("rax"));
                Ok(asm)
            }
            BinOp::Div => {
                let mut asm = String::from("    xor rdx, rdx\n    div rbx\n");
                asm.push_str(&common.push("rax"));
                Ok(asm)
            }
            _ => Err(CompileError::generator("Unknown arithmetic operator")),
        }
    }

    /// Calls a runtime string helper. The value arguments are already in
    /// place; an out-length qword is reserved on the stack and its address
    /// passed in `out_reg`. The helper returns the result pointer in `rax`
    /// and stores the length into the out slot.
    fn generate_runtime_call(common: &mut CodeGenCommon, helper: &str, out_reg: &str) -> String {
        let mut asm = common.push("0");
        asm.push_str(&format!("    mov {}, rsp\n", out_reg));
        asm.push_str(&format!("    call {}\n", helper));
        asm.push_str("    mov rbx, rax\n");
        asm.push_str(&common.pop("rax"));
        asm.push_str(&common.push("rbx"));
        asm.push_str(&common.push("rax"));
        asm
    }

    fn generate_comparison(common: &mut CodeGenCommon, op: BinOp) -> String {
        let set = match op {
            BinOp::Eq => "sete",
            BinOp::Neq => "setne",
            BinOp::Lt => "setl",
            BinOp::Le => "setle",
            BinOp::Gt => "setg",
            _ => "setge",
        };
        let mut asm = format!("    cmp rax, rbx\n    {} al\n    movzx rax, al\n", set);
        asm.push_str(&common.push("rax"));
        asm
    }

    /// Logical `and`/`or`: both operands are coerced to 0/1 first. Not
    /// short-circuiting.
    fn generate_logical(common: &mut CodeGenCommon, op: BinOp) -> String {
        let word = if op == BinOp::And { "and" } else { "or" };
        let mut asm = String::from(
            "    cmp rax, 0\n    setne al\n    movzx rax, al\n    cmp rbx, 0\n    setne bl\n    movzx rbx, bl\n",
        );
        asm.push_str(&format!("    {} rax, rbx\n", word));
        asm.push_str(&common.push("rax"));
        asm
    }

    fn generate_bitwise(common: &mut CodeGenCommon, op: BinOp) -> String {
        let word = match op {
            BinOp::Band => "and",
            BinOp::Bor => "or",
            _ => "xor",
        };
        let mut asm = format!("    {} rax, rbx\n", word);
        asm.push_str(&common.push("rax"));
        asm
    }
}
