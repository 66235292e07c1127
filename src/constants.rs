use crate::Word;

pub const WORD_BYTES: usize = std::mem::size_of::<Word>();
pub const WORD_WIDTH: u32 = 16;

pub const OPCODE_OFFSET: u32 = 10;
pub const OPND1_OFFSET: u32 = 5;
pub const OPND2_OFFSET: u32 = 0;

pub const OPCODE_MASK: Word = 0b1111_1100_0000_0000;
pub const OPND1_MASK: Word = 0b0000_0011_1110_0000;
pub const OPND2_MASK: Word = 0b0000_0000_0001_1111;

/// Mask for the constant carried in a short-form instruction word.
pub const SHORT_CONST_MASK: Word = 0b0000_0011_1111_1111;

/// Opcodes with a numeric value below this encode a single literal operand
/// in short form.
pub const SHORT_FORM_OPCODES: Word = 4;
