use std::{error::Error, fmt};

/// Byte order used by every binary format in the workspace.
pub type Endian = byteorder::LittleEndian;

/// A string did not name any variant of the expected enum.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" is not a valid {}", &self.value, &self.enum_name)
    }
}

impl Error for ParseEnumError {}

/// Parsing for fieldless enums, implemented via `#[derive(EnumFromStr)]`
/// from the `util-derive` crate. The derived impl matches variant names
/// without regard to ASCII case.
pub trait EnumFromStr: Sized {
    fn from_str(s: &str) -> Result<Self, ParseEnumError>;
}
