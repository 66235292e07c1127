//! Instruction-set definition for the VM16, a 16-bit virtual CPU.
//!
//! This crate holds the static tables that parameterize the
//! [vm16asm](../vm16asm/index.html) assembler: the opcode set with its
//! operand-class markers, the operand encoding table, the operand classes
//! themselves and the word-packing helpers.
//!
//! Instructions are one or two words long. The first word packs the opcode
//! and up to two operand codes:
//!
//! ```text
//!          +--------+---------+---------+
//!          |15    10|9       5|4       0|
//!          +--------+---------+---------+
//! Normal   | opcode | operand | operand |
//! Short    | opcode |  10-bit constant  |
//!          +--------+---------+---------+
//! ```
//!
//! Operand codes 16..=19 (`IMM`, `IND`, `REL`, `[SP+n]`) carry their value in
//! a second word following the instruction word. The short form exists for
//! the opcodes below [`constants::SHORT_FORM_OPCODES`] when they are given a
//! single literal constant.

pub mod constants;
pub mod instructions;

pub use crate::instructions::*;

/// Machine word. All addresses, opcodes and data values are 16-bit words.
pub type Word = u16;
