use std::io;

use byteorder::WriteBytesExt;
use util::Endian;
use vm16::Word;

use crate::error::{Error, Result};
use crate::locater::MemoryImage;
use crate::pass1::{Body, Token};
use crate::symbols::SymbolTable;

/// Load address required of COM images.
pub const COM_ORIGIN: Word = 0x0100;

/// Words per H16 data row and per `.tbl`/`.bin` text row.
const ROW_WORDS: usize = 8;

/// Flattens the image for COM output. Unwritten cells become zero; the
/// image must start at the fixed COM load address.
pub fn com_words(image: &MemoryImage) -> Result<Vec<Word>> {
    if image.start != COM_ORIGIN {
        return Err(Error::ComOrigin(image.start));
    }
    Ok(image
        .cells
        .iter()
        .map(|&cell| if cell < 0 { 0 } else { cell as Word })
        .collect())
}

/// Serializes COM words as a little-endian byte stream.
pub fn write_com<W: io::Write>(writer: &mut W, words: &[Word]) -> io::Result<()> {
    for &word in words {
        writer.write_u16::<Endian>(word)?;
    }
    Ok(())
}

/// Renders the sparse H16 text format.
///
/// The header announces the valid address range, each data record holds a
/// run of up to eight words, and runs never cross an eight-word row
/// boundary. Unwritten cells break runs instead of being emitted.
pub fn h16_text(image: &MemoryImage) -> String {
    let mut out = vec![format!(":2000001{:04X}{:04X}", image.start, image.last)];
    for (row, chunk) in image.cells.chunks(ROW_WORDS).enumerate() {
        let mut index = 0;
        while index < chunk.len() {
            if chunk[index] < 0 {
                index += 1;
                continue;
            }
            let run_end = chunk[index..]
                .iter()
                .position(|&cell| cell < 0)
                .map(|p| index + p)
                .unwrap_or_else(|| chunk.len());
            let address = u32::from(image.start) + (row * ROW_WORDS + index) as u32;
            let data: String = chunk[index..run_end]
                .iter()
                .map(|&cell| format!("{:04X}", cell as Word))
                .collect();
            out.push(format!(":{:X}{:04X}00{}", run_end - index, address, data));
            index = run_end;
        }
    }
    out.push(":00000FF".to_string());
    out.join("\n")
}

/// Renders the listing: one `AAAA: WWWW, …  ; source` line per code record,
/// address/word dumps under their source line for text and data records,
/// comments echoed untouched.
pub fn listing(tokens: &[Token]) -> String {
    let mut out = vec![
        format!("VM16ASM v{}", env!("CARGO_PKG_VERSION")),
        String::new(),
    ];
    for token in tokens {
        match &token.body {
            Body::Comment => out.push(token.text.trim_end().to_string()),
            Body::Code { opcodes, .. } => {
                let code = format_words(opcodes);
                out.push(format!(
                    "{:04X}: {:<12}  {}",
                    token.address,
                    code,
                    token.text.trim()
                ));
            }
            Body::Text(_) | Body::Packed(_) | Body::Data(_) => {
                out.push(token.text.trim_end().to_string());
                out.push(format!(
                    "{:04X}: {}",
                    token.address,
                    format_words(token.opcodes())
                ));
            }
        }
    }
    out.join("\n")
}

fn format_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|word| format!("{:04X}", word))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the image as a constant table (`0xNNNN`, comma-separated, eight
/// per line) for embedding in test fixtures. Unwritten cells become zero.
pub fn tbl_text(image: &MemoryImage) -> String {
    rows(image, |cell| format!("0x{:04X}", cell), ", ", ",\n")
}

/// Renders the image as bare hex words, eight per line. Unwritten cells
/// become zero.
pub fn bin_text(image: &MemoryImage) -> String {
    rows(image, |cell| format!("{:04X}", cell), " ", "\n")
}

fn rows<F>(image: &MemoryImage, format: F, separator: &str, row_separator: &str) -> String
where
    F: Fn(Word) -> String,
{
    image
        .cells
        .chunks(ROW_WORDS)
        .map(|chunk| {
            chunk
                .iter()
                .map(|&cell| format(if cell < 0 { 0 } else { cell as Word }))
                .collect::<Vec<_>>()
                .join(separator)
        })
        .collect::<Vec<_>>()
        .join(row_separator)
}

/// Renders the symbol table sorted by address.
pub fn symbol_table(symbols: &SymbolTable) -> String {
    let mut entries: Vec<(&String, &Word)> = symbols.iter().collect();
    entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
    entries
        .iter()
        .map(|(name, address)| format!(" - {:<24} = {:04X}", name, address))
        .collect::<Vec<_>>()
        .join("\n")
}
