use std::fmt;
use std::path::PathBuf;

use vm16::Word;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal assembly errors. Memory-location conflicts are not errors; the
/// locater reports them as [`Warning`](crate::locater::Warning)s instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A source or include file is missing or unreadable.
    File(PathBuf),
    /// An error tied to one source line.
    Line {
        file: String,
        line: u32,
        kind: LineErrorKind,
    },
    /// A COM image was requested but the program does not start at `$0100`.
    ComOrigin(Word),
}

impl Error {
    pub fn line(file: &str, line: u32, kind: LineErrorKind) -> Error {
        Error::Line {
            file: file.to_string(),
            line,
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineErrorKind {
    IncludeSyntax,
    MacroSyntax,
    UnterminatedMacro(String),
    MacroArity {
        name: String,
        expected: usize,
        found: usize,
    },
    /// The first word of a code line is not a known mnemonic.
    InvalidSyntax(String),
    BadNumber(String),
    /// An instruction would occupy more than two words.
    Oversize,
    InvalidLabel(String),
    DuplicateLabel(String),
    InvalidAlias(String),
    InvalidOperand(String),
    UnknownSymbol(String),
    OperandCount {
        expected: usize,
        found: usize,
    },
    OperandType {
        position: usize,
        operand: String,
    },
    /// Pass 2 emitted a different number of words than pass 1 declared.
    SizeMismatch {
        declared: Word,
        emitted: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::File(path) => write!(f, "Error: File '{}' missing", path.display()),
            Error::Line { file, line, kind } => {
                write!(f, "Error in file {}({}): {}", file, line, kind)
            }
            Error::ComOrigin(start) => write!(
                f,
                "Error: COM start address must be $0100 (found ${:04X})",
                start
            ),
        }
    }
}

impl fmt::Display for LineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LineErrorKind::IncludeSyntax => write!(f, "Invalid $include syntax"),
            LineErrorKind::MacroSyntax => write!(f, "Invalid macro syntax"),
            LineErrorKind::UnterminatedMacro(name) => {
                write!(f, "Macro '{}' is missing $endmacro", name)
            }
            LineErrorKind::MacroArity {
                name,
                expected,
                found,
            } => write!(
                f,
                "Invalid number of parameters for macro '{}' (expected {}, found {})",
                name, expected, found
            ),
            LineErrorKind::InvalidSyntax(line) => write!(f, "Invalid syntax '{}'", line),
            LineErrorKind::BadNumber(literal) => write!(f, "Invalid number '{}'", literal),
            LineErrorKind::Oversize => write!(f, "Instruction is longer than two words"),
            LineErrorKind::InvalidLabel(label) => write!(f, "Invalid label '{}'", label),
            LineErrorKind::DuplicateLabel(label) => write!(f, "Label '{}' used twice", label),
            LineErrorKind::InvalidAlias(name) => write!(f, "Invalid alias name '{}'", name),
            LineErrorKind::InvalidOperand(operand) => write!(f, "Invalid operand '{}'", operand),
            LineErrorKind::UnknownSymbol(symbol) => write!(f, "Unknown symbol '{}'", symbol),
            LineErrorKind::OperandCount { expected, found } => write!(
                f,
                "Invalid operand count (expected {}, found {})",
                expected, found
            ),
            LineErrorKind::OperandType { position, operand } => {
                write!(f, "Invalid operand{} type '{}'", position, operand)
            }
            LineErrorKind::SizeMismatch { declared, emitted } => write!(
                f,
                "Internal error: emitted {} words where {} were declared",
                emitted, declared
            ),
        }
    }
}

impl std::error::Error for Error {}
