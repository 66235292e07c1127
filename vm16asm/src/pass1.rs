use vm16::{Opcode, Operand, Word};

use crate::error::{Error, LineErrorKind, Result};
use crate::parser::{self, Rule};
use crate::symbols::{expand_ident, namespace, substitute_alias, AliasTable, SymbolTable};
use crate::tokenizer::SourceLine;

/// Segment selected by the `.code`/`.data`/`.text`/`.ctext` directives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Segment {
    Code,
    WText,
    BText,
    Data,
}

/// One source record after address assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub file: String,
    pub line_no: u32,
    pub text: String,
    /// Emit address in words. Meaningless for comments.
    pub address: Word,
    /// Number of words this record contributes to the image.
    pub size: Word,
    pub body: Body,
}

/// Per-segment payload. Code keeps its cleaned instruction words as text
/// until pass 2 fills `opcodes`; the other emitting kinds are numeric as
/// soon as pass 1 decodes them.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Comment,
    Code {
        words: Vec<String>,
        opcodes: Vec<Word>,
    },
    Text(Vec<Word>),
    Packed(Vec<Word>),
    Data(Vec<Word>),
}

impl Token {
    /// Whether this record occupies image memory.
    pub fn is_emitting(&self) -> bool {
        !matches!(self.body, Body::Comment)
    }

    /// The words this record contributes to the image. Empty for comments,
    /// and for code records that pass 2 has not encoded yet.
    pub fn opcodes(&self) -> &[Word] {
        match &self.body {
            Body::Comment => &[],
            Body::Code { opcodes, .. } => opcodes,
            Body::Text(words) | Body::Packed(words) | Body::Data(words) => words,
        }
    }
}

/// Walks the line stream, tracking the current segment and emit address.
/// Collects the symbol and alias tables and sizes every instruction.
pub struct Pass1<'a> {
    namespaces: &'a [String],
    segment: Segment,
    address: Word,
    symbols: SymbolTable,
    aliases: AliasTable,
}

impl<'a> Pass1<'a> {
    pub fn new(namespaces: &'a [String]) -> Pass1<'a> {
        Pass1 {
            namespaces,
            segment: Segment::Code,
            address: 0,
            symbols: SymbolTable::new(),
            aliases: AliasTable::new(),
        }
    }

    pub fn run(&mut self, lines: &[SourceLine]) -> Result<Vec<Token>> {
        lines.iter().map(|line| self.decode(line)).collect()
    }

    /// The tables collected while running, for pass 2.
    pub fn into_tables(self) -> (SymbolTable, AliasTable) {
        (self.symbols, self.aliases)
    }

    fn decode(&mut self, src: &SourceLine) -> Result<Token> {
        let stripped = src.text.split(';').next().unwrap_or("");
        let cleaned = stripped.replace(',', " ").replace('\t', " ");
        let line = cleaned.trim();
        if line.is_empty() {
            return Ok(self.comment(src));
        }
        let ns = namespace(&src.file).to_string();

        if self.directive(src, line)? {
            return Ok(self.comment(src));
        }

        if let Some(pair) = parser::parse_prefix(Rule::alias_def, line) {
            let mut inner = pair.into_inner();
            let name = inner.next().map(|p| p.as_str()).unwrap_or("");
            let value = inner.next().map(|p| p.as_str()).unwrap_or("");
            let qualified = expand_ident(self.namespaces, &ns, name).ok_or_else(|| {
                Error::line(&src.file, src.line_no, LineErrorKind::InvalidAlias(name.to_string()))
            })?;
            self.aliases.insert(qualified, value.to_string());
            return Ok(self.comment(src));
        }

        let mut rest = line;
        if let Some(pair) = parser::parse_prefix(Rule::label_def, line) {
            let consumed = pair.as_str().len();
            let label = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            self.add_symbol(src, &ns, label)?;
            rest = line[consumed..].trim();
            if rest.is_empty() {
                return Ok(self.comment(src));
            }
        }

        match self.segment {
            Segment::WText => {
                let words = text_words(rest);
                Ok(self.emit(src, words.len(), Body::Text(words)))
            }
            Segment::BText => {
                let words = packed_words(rest);
                Ok(self.emit(src, words.len(), Body::Packed(words)))
            }
            Segment::Data => {
                let mut values = Vec::new();
                for literal in rest.split_whitespace() {
                    let value = parser::parse_word(literal).ok_or_else(|| {
                        Error::line(
                            &src.file,
                            src.line_no,
                            LineErrorKind::BadNumber(literal.to_string()),
                        )
                    })?;
                    values.push(value);
                }
                Ok(self.emit(src, values.len(), Body::Data(values)))
            }
            Segment::Code => self.code(src, &ns, rest),
        }
    }

    /// Handles segment and origin directives. Entering `.code` defines the
    /// synthetic `<namespace>.start` label unless it already exists.
    fn directive(&mut self, src: &SourceLine, line: &str) -> Result<bool> {
        let mut words = line.split_whitespace();
        match words.next().unwrap_or("") {
            ".code" => {
                self.segment = Segment::Code;
                let start = format!("{}.start", namespace(&src.file));
                self.symbols.entry(start).or_insert(self.address);
                Ok(true)
            }
            ".data" => {
                self.segment = Segment::Data;
                Ok(true)
            }
            ".text" => {
                self.segment = Segment::WText;
                Ok(true)
            }
            ".ctext" => {
                self.segment = Segment::BText;
                Ok(true)
            }
            ".org" => match words.next() {
                Some(literal) => {
                    self.address = parser::parse_word(literal).ok_or_else(|| {
                        Error::line(
                            &src.file,
                            src.line_no,
                            LineErrorKind::BadNumber(literal.to_string()),
                        )
                    })?;
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn add_symbol(&mut self, src: &SourceLine, ns: &str, label: &str) -> Result<()> {
        let qualified = expand_ident(self.namespaces, ns, label).ok_or_else(|| {
            Error::line(
                &src.file,
                src.line_no,
                LineErrorKind::InvalidLabel(label.to_string()),
            )
        })?;
        if label != "start" && self.symbols.contains_key(&qualified) {
            return Err(Error::line(
                &src.file,
                src.line_no,
                LineErrorKind::DuplicateLabel(label.to_string()),
            ));
        }
        self.symbols.insert(qualified, self.address);
        Ok(())
    }

    /// Sizes one instruction. Short-form opcodes with a single operand are
    /// always one word; everything else is the instruction word plus one
    /// extra word per value-carrying operand.
    fn code(&mut self, src: &SourceLine, ns: &str, line: &str) -> Result<Token> {
        let mut words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let opcode: Opcode = words[0].parse().map_err(|_| {
            Error::line(
                &src.file,
                src.line_no,
                LineErrorKind::InvalidSyntax(line.to_string()),
            )
        })?;

        let size = if words.len() == 2 && opcode.has_short_form() {
            1
        } else {
            correct_jump_target(opcode, &mut words);
            let size = 1
                + words.get(1).map_or(0, |w| self.operand_size(ns, w))
                + words.get(2).map_or(0, |w| self.operand_size(ns, w));
            if size > 2 {
                return Err(Error::line(&src.file, src.line_no, LineErrorKind::Oversize));
            }
            size
        };

        Ok(self.emit(
            src,
            size,
            Body::Code {
                words,
                opcodes: Vec::new(),
            },
        ))
    }

    /// Extra words needed by one operand, after alias substitution: 0 for
    /// registers, memory modes and the in-slot constants, 1 for anything
    /// carrying a value.
    fn operand_size(&self, ns: &str, operand: &str) -> usize {
        let substituted = substitute_alias(&self.aliases, self.namespaces, ns, operand);
        let s = substituted.as_ref();
        match s {
            "#0" | "#1" | "#$0" | "#$1" => 0,
            _ if s.starts_with('#') || s.starts_with('+') || s.starts_with('-') => 1,
            _ if Operand::from_symbol(s).is_some() => 0,
            _ => 1,
        }
    }

    fn comment(&self, src: &SourceLine) -> Token {
        Token {
            file: src.file.clone(),
            line_no: src.line_no,
            text: src.text.clone(),
            address: 0,
            size: 0,
            body: Body::Comment,
        }
    }

    fn emit(&mut self, src: &SourceLine, size: usize, body: Body) -> Token {
        let token = Token {
            file: src.file.clone(),
            line_no: src.line_no,
            text: src.text.clone(),
            address: self.address,
            size: size as Word,
            body,
        };
        self.address = self.address.wrapping_add(size as Word);
        token
    }
}

/// Bare branch targets of jump instructions are implicitly immediate:
/// prepend `#` unless the operand already carries a mode prefix.
fn correct_jump_target(opcode: Opcode, words: &mut Vec<String>) {
    if !opcode.is_jump() {
        return;
    }
    let index = match words.len() {
        3 => 2,
        2 => 1,
        _ => return,
    };
    let needs_prefix = {
        let target = &words[index];
        !target.starts_with('#') && !target.starts_with('+') && !target.starts_with('-')
    };
    if needs_prefix {
        let prefixed = format!("#{}", words[index]);
        words[index] = prefixed;
    }
}

/// Resolves the `\n` and `\0` escapes; all other characters pass through.
fn unescape(s: &str) -> String {
    s.replace("\\n", "\n").replace("\\0", "\0")
}

/// `.text` body: one word per character of the quoted string. Lines that
/// are not a single quoted string contribute nothing.
fn text_words(line: &str) -> Vec<Word> {
    match parser::parse_exact(Rule::quoted, line) {
        Some(pair) => {
            let body = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            unescape(body).chars().map(|c| c as u32 as Word).collect()
        }
        None => Vec::new(),
    }
}

/// `.ctext` body: pairs of bytes packed into words, high byte first. A
/// trailing lone byte occupies the high byte of the final word.
fn packed_words(line: &str) -> Vec<Word> {
    let pair = match parser::parse_exact(Rule::quoted, line) {
        Some(pair) => pair,
        None => return Vec::new(),
    };
    let body = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    let bytes: Vec<Word> = unescape(body)
        .chars()
        .map(|c| (c as u32 & 0xFF) as Word)
        .collect();
    bytes
        .chunks(2)
        .map(|pair| {
            let high = pair[0] << 8;
            let low = if pair.len() > 1 { pair[1] } else { 0 };
            high | low
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn text_words_use_one_word_per_character() {
        assert_eq!(text_words("\"AB\""), vec![0x41, 0x42]);
        assert_eq!(text_words("\"a\\nb\\0\""), vec![0x61, 0x0A, 0x62, 0x00]);
        assert_eq!(text_words("no quotes"), Vec::<Word>::new());
    }

    #[test]
    fn packed_words_pack_high_byte_first() {
        assert_eq!(packed_words("\"AB\""), vec![0x4142]);
        assert_eq!(packed_words("\"ABC\""), vec![0x4142, 0x4300]);
        assert_eq!(packed_words("\"A\\0B\""), vec![0x4100, 0x4200]);
        assert_eq!(packed_words("\"\""), Vec::<Word>::new());
    }

    #[test]
    fn jump_targets_become_immediate() {
        let mut words = vec!["jump".to_string(), "loop".to_string()];
        correct_jump_target(Opcode::JUMP, &mut words);
        assert_eq!(words[1], "#loop");

        let mut words = vec!["bnze".to_string(), "A".to_string(), "loop".to_string()];
        correct_jump_target(Opcode::BNZE, &mut words);
        assert_eq!(words[2], "#loop");

        let mut words = vec!["jump".to_string(), "-loop".to_string()];
        correct_jump_target(Opcode::JUMP, &mut words);
        assert_eq!(words[1], "-loop");

        let mut words = vec!["move".to_string(), "A".to_string(), "loop".to_string()];
        correct_jump_target(Opcode::MOVE, &mut words);
        assert_eq!(words[2], "loop");
    }
}
