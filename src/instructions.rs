use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;
use util::EnumFromStr;
use util_derive::EnumFromStr;

use crate::constants;
use crate::Word;

/// VM16 instruction set. The variant order is the encoding order: the
/// numeric value of a variant is the opcode field of its instruction word.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr,
)]
pub enum Opcode {
    /// No-op.
    ///
    /// Operands: none.
    /// Does nothing.
    NOP,
    /// Break.
    ///
    /// Operands: `CNST`.
    /// Stops execution and hands the 10-bit code to the debugger.
    BRK,
    /// System call.
    ///
    /// Operands: `CNST`.
    /// Calls the host function selected by the 10-bit code.
    SYS,
    /// Reserved trap slot.
    ///
    /// Operands: `CNST`.
    /// Currently not used.
    RES2,
    /// Jump.
    ///
    /// Operands: `ADR`.
    /// Continues execution at the branch target.
    JUMP,
    /// Call.
    ///
    /// Operands: `ADR`.
    /// Pushes the return address and jumps to the branch target.
    CALL,
    /// Return.
    ///
    /// Operands: none.
    /// Pops the return address pushed by `call` and jumps to it.
    RET,
    /// Halt.
    ///
    /// Operands: none.
    /// Stops the CPU.
    HALT,
    /// Move.
    ///
    /// Operands: `DST`, `SRC`.
    /// Copies the source value to the destination.
    MOVE,
    /// Exchange.
    ///
    /// Operands: `DST`, `DST`.
    /// Swaps the two values.
    XCHG,
    /// Increment.
    ///
    /// Operands: `DST`.
    /// Adds one to the destination.
    INC,
    /// Decrement.
    ///
    /// Operands: `DST`.
    /// Subtracts one from the destination.
    DEC,
    /// Add.
    ///
    /// Operands: `DST`, `SRC`.
    /// Adds the source to the destination.
    ADD,
    /// Subtract.
    ///
    /// Operands: `DST`, `SRC`.
    /// Subtracts the source from the destination.
    SUB,
    /// Multiply.
    ///
    /// Operands: `DST`, `SRC`.
    /// Multiplies the destination by the source.
    MUL,
    /// Divide.
    ///
    /// Operands: `DST`, `SRC`.
    /// Divides the destination by the source.
    DIV,
    /// Bitwise and.
    ///
    /// Operands: `DST`, `SRC`.
    /// Ands the source into the destination.
    AND,
    /// Bitwise or.
    ///
    /// Operands: `DST`, `SRC`.
    /// Ors the source into the destination.
    OR,
    /// Bitwise exclusive-or.
    ///
    /// Operands: `DST`, `SRC`.
    /// Exclusive-ors the source into the destination.
    XOR,
    /// Bitwise complement.
    ///
    /// Operands: `DST`.
    /// Inverts every bit of the destination.
    NOT,
    /// Branch if not zero.
    ///
    /// Operands: `DST`, `ADR`.
    /// Branches to the target if the operand is not zero.
    BNZE,
    /// Branch if zero.
    ///
    /// Operands: `DST`, `ADR`.
    /// Branches to the target if the operand is zero.
    BZE,
    /// Branch if positive.
    ///
    /// Operands: `DST`, `ADR`.
    /// Branches to the target if the operand is positive.
    BPOS,
    /// Branch if negative.
    ///
    /// Operands: `DST`, `ADR`.
    /// Branches to the target if the operand is negative.
    BNEG,
    /// Input.
    ///
    /// Operands: `DST`, `CNST`.
    /// Reads the I/O port selected by the constant into the destination.
    IN,
    /// Output.
    ///
    /// Operands: `CNST`, `SRC`.
    /// Writes the source value to the I/O port selected by the constant.
    OUT,
    /// Push.
    ///
    /// Operands: `SRC`.
    /// Pushes the value onto the stack.
    PUSH,
    /// Pop.
    ///
    /// Operands: `DST`.
    /// Pops the top of the stack into the destination.
    POP,
    /// Swap bytes.
    ///
    /// Operands: `DST`.
    /// Exchanges the high and low byte of the destination.
    SWAP,
    /// Decrement and branch if not zero.
    ///
    /// Operands: `DST`, `ADR`.
    /// Subtracts one and branches to the target while the result is not
    /// zero.
    DBNZ,
    /// Remainder.
    ///
    /// Operands: `DST`, `SRC`.
    /// Stores the remainder of dividing the destination by the source.
    MOD,
    /// Shift left.
    ///
    /// Operands: `DST`, `SRC`.
    /// Shifts the destination left by the source amount.
    SHL,
    /// Shift right.
    ///
    /// Operands: `DST`, `SRC`.
    /// Shifts the destination right by the source amount.
    SHR,
    /// Add with carry.
    ///
    /// Operands: `DST`, `SRC`.
    /// Adds the source and keeps the carry word.
    ADDC,
    /// Multiply with carry.
    ///
    /// Operands: `DST`, `SRC`.
    /// Multiplies by the source and keeps the high word.
    MULC,
    /// Skip if not equal.
    ///
    /// Operands: `SRC`, `SRC`.
    /// Skips the next instruction if the operands differ.
    SKNE,
    /// Skip if equal.
    ///
    /// Operands: `SRC`, `SRC`.
    /// Skips the next instruction if the operands are equal.
    SKEQ,
    /// Skip if less than.
    ///
    /// Operands: `SRC`, `SRC`.
    /// Skips the next instruction if the first operand is smaller.
    SKLT,
    /// Skip if greater than.
    ///
    /// Operands: `SRC`, `SRC`.
    /// Skips the next instruction if the first operand is greater.
    SKGT,
}

impl Opcode {
    /// The opcode field value of this instruction.
    #[inline]
    pub fn code(self) -> Word {
        enum_code(self)
    }

    /// Operand-class markers for the two operand positions. `None` means the
    /// position is unused.
    pub fn operands(self) -> (Option<OperandClass>, Option<OperandClass>) {
        use OperandClass::*;
        match self {
            Opcode::NOP | Opcode::RET | Opcode::HALT => (None, None),
            Opcode::BRK | Opcode::SYS | Opcode::RES2 => (Some(CNST), None),
            Opcode::JUMP | Opcode::CALL => (Some(ADR), None),
            Opcode::MOVE
            | Opcode::ADD
            | Opcode::SUB
            | Opcode::MUL
            | Opcode::DIV
            | Opcode::AND
            | Opcode::OR
            | Opcode::XOR
            | Opcode::MOD
            | Opcode::SHL
            | Opcode::SHR
            | Opcode::ADDC
            | Opcode::MULC => (Some(DST), Some(SRC)),
            Opcode::XCHG => (Some(DST), Some(DST)),
            Opcode::INC | Opcode::DEC | Opcode::NOT | Opcode::POP | Opcode::SWAP => {
                (Some(DST), None)
            }
            Opcode::BNZE | Opcode::BZE | Opcode::BPOS | Opcode::BNEG | Opcode::DBNZ => {
                (Some(DST), Some(ADR))
            }
            Opcode::IN => (Some(DST), Some(CNST)),
            Opcode::OUT => (Some(CNST), Some(SRC)),
            Opcode::PUSH => (Some(SRC), None),
            Opcode::SKNE | Opcode::SKEQ | Opcode::SKLT | Opcode::SKGT => (Some(SRC), Some(SRC)),
        }
    }

    /// Number of operands this opcode requires.
    pub fn operand_count(self) -> usize {
        let (first, second) = self.operands();
        first.iter().count() + second.iter().count()
    }

    /// Whether a bare branch target written after this mnemonic is treated
    /// as immediate.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::JUMP
                | Opcode::CALL
                | Opcode::BNZE
                | Opcode::BZE
                | Opcode::BPOS
                | Opcode::BNEG
                | Opcode::DBNZ
        )
    }

    /// Whether this opcode can pack a single 10-bit constant into one word.
    pub fn has_short_form(self) -> bool {
        self.code() < constants::SHORT_FORM_OPCODES
    }
}

/// Operand encodings in wire order: the numeric value of a variant is the
/// operand code packed into the instruction word.
///
/// Codes 0..=13 are written literally in source (`A`..`SP`, `[X]`, `[Y]`,
/// `[X]+`, `[Y]+`, `#0`, `#1`); 14 and 15 are unused; 16..=19 are the
/// suffixed modes that carry their value in an extra word.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum Operand {
    A,
    B,
    C,
    D,
    X,
    Y,
    PC,
    SP,
    XIND,
    YIND,
    XINC,
    YINC,
    ZERO,
    ONE,
    RES0,
    RES1,
    IMM,
    IND,
    REL,
    SPREL,
}

impl Operand {
    /// The operand field value of this encoding.
    #[inline]
    pub fn code(self) -> Word {
        enum_code(self)
    }

    /// Looks up an operand written literally in source (register, indirect
    /// mode or short constant). Matching ignores ASCII case.
    pub fn from_symbol(s: &str) -> Option<Operand> {
        let symbol = s.to_ascii_uppercase();
        let operand = match symbol.as_str() {
            "A" => Operand::A,
            "B" => Operand::B,
            "C" => Operand::C,
            "D" => Operand::D,
            "X" => Operand::X,
            "Y" => Operand::Y,
            "PC" => Operand::PC,
            "SP" => Operand::SP,
            "[X]" => Operand::XIND,
            "[Y]" => Operand::YIND,
            "[X]+" => Operand::XINC,
            "[Y]+" => Operand::YINC,
            "#0" => Operand::ZERO,
            "#1" => Operand::ONE,
            _ => return None,
        };
        Some(operand)
    }

    /// The source spelling of this encoding, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            Operand::A => "A",
            Operand::B => "B",
            Operand::C => "C",
            Operand::D => "D",
            Operand::X => "X",
            Operand::Y => "Y",
            Operand::PC => "PC",
            Operand::SP => "SP",
            Operand::XIND => "[X]",
            Operand::YIND => "[Y]",
            Operand::XINC => "[X]+",
            Operand::YINC => "[Y]+",
            Operand::ZERO => "#0",
            Operand::ONE => "#1",
            Operand::RES0 | Operand::RES1 => "-",
            Operand::IMM => "IMM",
            Operand::IND => "IND",
            Operand::REL => "REL",
            Operand::SPREL => "[SP+n]",
        }
    }

    /// Whether this encoding carries its value in an extra word.
    pub fn takes_value(self) -> bool {
        matches!(
            self,
            Operand::IMM | Operand::IND | Operand::REL | Operand::SPREL
        )
    }
}

/// Named operand sets used to validate instruction operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandClass {
    /// General registers.
    REG,
    /// Memory-addressing modes.
    MEM,
    /// Branch targets.
    ADR,
    /// Immediate constants.
    CNST,
    /// Anything writable: `REG` or `MEM`.
    DST,
    /// Anything readable: `DST` or `CNST`.
    SRC,
}

impl OperandClass {
    /// Whether `operand` belongs to this class.
    pub fn contains(self, operand: Operand) -> bool {
        use Operand::*;
        match self {
            OperandClass::REG => matches!(operand, A | B | C | D | X | Y | PC | SP),
            OperandClass::MEM => matches!(operand, XIND | YIND | XINC | YINC | IND | SPREL),
            OperandClass::ADR => matches!(operand, IMM | REL | ZERO | ONE),
            OperandClass::CNST => matches!(operand, ZERO | ONE | IMM),
            OperandClass::DST => {
                OperandClass::REG.contains(operand) || OperandClass::MEM.contains(operand)
            }
            OperandClass::SRC => {
                OperandClass::DST.contains(operand) || OperandClass::CNST.contains(operand)
            }
        }
    }
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl std::fmt::Display for $e {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(Opcode);
impl_enum_display!(Operand);
impl_enum_display!(OperandClass);

#[inline]
pub fn enum_code<T: ToPrimitive + Copy>(val: T) -> Word {
    val.to_u16().unwrap()
}

/// Packs a normal-form instruction word from an opcode and two operand
/// field values (0 for unused positions).
#[inline]
pub fn make_instruction(oc: Opcode, opnd1: Word, opnd2: Word) -> Word {
    ((oc.code() << constants::OPCODE_OFFSET) & constants::OPCODE_MASK)
        | ((opnd1 << constants::OPND1_OFFSET) & constants::OPND1_MASK)
        | ((opnd2 << constants::OPND2_OFFSET) & constants::OPND2_MASK)
}

/// Packs a short-form instruction word: opcode plus a 10-bit constant.
#[inline]
pub fn make_short_instruction(oc: Opcode, value: Word) -> Word {
    ((oc.code() << constants::OPCODE_OFFSET) & constants::OPCODE_MASK)
        | (value & constants::SHORT_CONST_MASK)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opcode_encoding_order() {
        assert_eq!(Opcode::NOP.code(), 0);
        assert_eq!(Opcode::SYS.code(), 2);
        assert_eq!(Opcode::JUMP.code(), 4);
        assert_eq!(Opcode::MOVE.code(), 8);
        assert_eq!(Opcode::DBNZ.code(), 29);
        assert_eq!(Opcode::SKGT.code(), 38);
    }

    #[test]
    fn operand_encoding_order() {
        assert_eq!(Operand::A.code(), 0);
        assert_eq!(Operand::SP.code(), 7);
        assert_eq!(Operand::XIND.code(), 8);
        assert_eq!(Operand::ONE.code(), 13);
        assert_eq!(Operand::IMM.code(), 16);
        assert_eq!(Operand::SPREL.code(), 19);
    }

    #[test]
    fn mnemonics_parse_case_insensitively() {
        assert_eq!("move".parse::<Opcode>().unwrap(), Opcode::MOVE);
        assert_eq!("DbNz".parse::<Opcode>().unwrap(), Opcode::DBNZ);
        assert!("frobnicate".parse::<Opcode>().is_err());
    }

    #[test]
    fn operand_symbols() {
        assert_eq!(Operand::from_symbol("[X]+"), Some(Operand::XINC));
        assert_eq!(Operand::from_symbol("#1"), Some(Operand::ONE));
        assert_eq!(Operand::from_symbol("pc"), Some(Operand::PC));
        assert_eq!(Operand::from_symbol("[SP+2]"), None);
        assert_eq!(Operand::from_symbol("label"), None);
    }

    #[test]
    fn class_membership() {
        assert!(OperandClass::REG.contains(Operand::PC));
        assert!(OperandClass::MEM.contains(Operand::IND));
        assert!(OperandClass::DST.contains(Operand::XINC));
        assert!(!OperandClass::DST.contains(Operand::IMM));
        assert!(OperandClass::SRC.contains(Operand::IMM));
        assert!(OperandClass::ADR.contains(Operand::ZERO));
        assert!(!OperandClass::ADR.contains(Operand::IND));
        assert!(OperandClass::CNST.contains(Operand::ONE));
        assert!(!OperandClass::CNST.contains(Operand::REL));
    }

    #[test]
    fn operand_counts() {
        assert_eq!(Opcode::NOP.operand_count(), 0);
        assert_eq!(Opcode::SYS.operand_count(), 1);
        assert_eq!(Opcode::JUMP.operand_count(), 1);
        assert_eq!(Opcode::MOVE.operand_count(), 2);
        assert_eq!(Opcode::BZE.operand_count(), 2);
    }

    #[test]
    fn jump_set() {
        for oc in &[
            Opcode::JUMP,
            Opcode::CALL,
            Opcode::BNZE,
            Opcode::BZE,
            Opcode::BPOS,
            Opcode::BNEG,
            Opcode::DBNZ,
        ] {
            assert!(oc.is_jump());
        }
        assert!(!Opcode::MOVE.is_jump());
        assert!(!Opcode::RET.is_jump());
    }

    #[test]
    fn pack_normal_form() {
        let word = make_instruction(Opcode::MOVE, Operand::A.code(), Operand::B.code());
        assert_eq!(word, 0x2001);
        let word = make_instruction(Opcode::MOVE, Operand::A.code(), Operand::IMM.code());
        assert_eq!(word, 0x2010);
    }

    #[test]
    fn pack_short_form() {
        assert_eq!(make_short_instruction(Opcode::SYS, 42), 0x082A);
        // The constant field is ten bits wide; excess bits are dropped.
        assert_eq!(
            make_short_instruction(Opcode::BRK, 1024),
            make_short_instruction(Opcode::BRK, 0)
        );
    }
}
