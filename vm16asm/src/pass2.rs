use matches::debug_assert_matches;
use vm16::{make_instruction, make_short_instruction, Opcode, Operand, Word};

use crate::error::{Error, LineErrorKind, Result};
use crate::parser::{self, Rule};
use crate::pass1::{Body, Token};
use crate::symbols::{expand_ident, namespace, substitute_alias, AliasTable, SymbolTable};

/// Replays the pass-1 token stream and encodes every code record: resolves
/// aliases and symbols, validates operand types against the opcode's class
/// markers and packs the instruction words. Non-code records pass through
/// untouched.
pub struct Pass2<'a> {
    namespaces: &'a [String],
    symbols: &'a SymbolTable,
    aliases: &'a AliasTable,
}

impl<'a> Pass2<'a> {
    pub fn new(
        namespaces: &'a [String],
        symbols: &'a SymbolTable,
        aliases: &'a AliasTable,
    ) -> Pass2<'a> {
        Pass2 {
            namespaces,
            symbols,
            aliases,
        }
    }

    pub fn run(&self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        tokens.into_iter().map(|token| self.encode(token)).collect()
    }

    fn encode(&self, mut token: Token) -> Result<Token> {
        let words = match &token.body {
            Body::Code { words, .. } => words.clone(),
            _ => return Ok(token),
        };
        let opcodes = self.encode_words(&token, &words)?;
        if opcodes.len() != token.size as usize {
            return Err(Error::line(
                &token.file,
                token.line_no,
                LineErrorKind::SizeMismatch {
                    declared: token.size,
                    emitted: opcodes.len(),
                },
            ));
        }
        if let Body::Code { opcodes: slot, .. } = &mut token.body {
            *slot = opcodes;
        }
        Ok(token)
    }

    fn encode_words(&self, token: &Token, words: &[String]) -> Result<Vec<Word>> {
        debug_assert_matches!(token.body, Body::Code { .. });
        let opcode: Opcode = words[0].parse().map_err(|_| {
            Error::line(
                &token.file,
                token.line_no,
                LineErrorKind::InvalidSyntax(words.join(" ")),
            )
        })?;

        let expected = opcode.operand_count();
        let found = words.len() - 1;
        if found != expected {
            return Err(Error::line(
                &token.file,
                token.line_no,
                LineErrorKind::OperandCount { expected, found },
            ));
        }

        if opcode.has_short_form() && found == 1 {
            let value = const_val(&words[1]).ok_or_else(|| {
                Error::line(
                    &token.file,
                    token.line_no,
                    LineErrorKind::InvalidOperand(words[1].clone()),
                )
            })?;
            return Ok(vec![make_short_instruction(opcode, value)]);
        }

        let ns = namespace(&token.file);
        let classes = [opcode.operands().0, opcode.operands().1];
        let mut resolved: Vec<(Operand, Option<Word>)> = Vec::with_capacity(2);
        for (index, word) in words[1..].iter().enumerate() {
            let (operand, value) = self.operand(token, ns, word)?;
            if let Some(class) = classes[index] {
                if !class.contains(operand) {
                    return Err(Error::line(
                        &token.file,
                        token.line_no,
                        LineErrorKind::OperandType {
                            position: index + 1,
                            operand: word.clone(),
                        },
                    ));
                }
            }
            resolved.push((operand, value));
        }

        let code1 = resolved.get(0).map_or(0, |(op, _)| op.code());
        let code2 = resolved.get(1).map_or(0, |(op, _)| op.code());
        let mut out = vec![make_instruction(opcode, code1, code2)];
        out.extend(resolved.iter().filter_map(|(_, value)| *value));
        Ok(out)
    }

    /// Resolves one operand to its encoding and optional extra word.
    fn operand(&self, token: &Token, ns: &str, raw: &str) -> Result<(Operand, Option<Word>)> {
        let substituted = substitute_alias(self.aliases, self.namespaces, ns, raw);
        let s = substituted.as_ref();

        if let Some(operand) = Operand::from_symbol(s) {
            return Ok((operand, None));
        }
        if s == "#$0" {
            return Ok((Operand::ZERO, None));
        }
        if s == "#$1" {
            return Ok((Operand::ONE, None));
        }

        let invalid = || {
            Error::line(
                &token.file,
                token.line_no,
                LineErrorKind::InvalidOperand(raw.to_string()),
            )
        };
        let pair = parser::parse_exact(Rule::operand, s).ok_or_else(invalid)?;
        let inner = pair.into_inner().next().ok_or_else(invalid)?;
        match inner.as_rule() {
            Rule::const_num => {
                let number = inner.into_inner().next().ok_or_else(invalid)?;
                let value = parser::number_value(number).ok_or_else(invalid)?;
                Ok((Operand::IMM, Some(value)))
            }
            Rule::addr_num => {
                let number = inner.into_inner().next().ok_or_else(invalid)?;
                let value = parser::number_value(number).ok_or_else(invalid)?;
                Ok((Operand::IND, Some(value)))
            }
            Rule::rel_num => {
                let mut parts = inner.into_inner();
                let sign = parts.next().ok_or_else(invalid)?.as_str().to_string();
                let number = parts.next().ok_or_else(invalid)?;
                let value = parser::number_value(number).ok_or_else(invalid)?;
                let offset = if sign == "-" {
                    ((0x10000 - u32::from(value)) & 0xFFFF) as Word
                } else {
                    value
                };
                Ok((Operand::REL, Some(offset)))
            }
            Rule::sp_rel => {
                let number = inner.into_inner().next().ok_or_else(invalid)?;
                let value = parser::number_value(number).ok_or_else(invalid)?;
                Ok((Operand::SPREL, Some(value)))
            }
            Rule::const_sym => {
                let ident = inner.into_inner().next().ok_or_else(invalid)?;
                let address = self.symbol_addr(token, ns, ident.as_str())?;
                Ok((Operand::IMM, Some(address)))
            }
            Rule::rel_sym => {
                // The branch offset is relative to the PC after the two-word
                // instruction; the written sign carries no meaning once a
                // symbol is involved.
                let mut parts = inner.into_inner();
                let _sign = parts.next().ok_or_else(invalid)?;
                let ident = parts.next().ok_or_else(invalid)?;
                let target = self.symbol_addr(token, ns, ident.as_str())?;
                let offset = (0x10000i64 + i64::from(target)
                    - i64::from(token.address)
                    - 2) as u64
                    & 0xFFFF;
                Ok((Operand::REL, Some(offset as Word)))
            }
            Rule::addr_sym => {
                let address = self.symbol_addr(token, ns, inner.as_str())?;
                Ok((Operand::IND, Some(address)))
            }
            _ => Err(invalid()),
        }
    }

    fn symbol_addr(&self, token: &Token, ns: &str, ident: &str) -> Result<Word> {
        expand_ident(self.namespaces, ns, ident)
            .and_then(|qualified| self.symbols.get(&qualified).copied())
            .ok_or_else(|| {
                Error::line(
                    &token.file,
                    token.line_no,
                    LineErrorKind::UnknownSymbol(ident.to_string()),
                )
            })
    }
}

/// Short-form constants accept `#<decimal>` or `#$<hex>` only. The encoding
/// has ten bits for the value, so it is reduced modulo 1024.
fn const_val(s: &str) -> Option<Word> {
    if !s.starts_with('#') {
        return None;
    }
    let digits = &s[1..];
    let value = if digits.starts_with('$') {
        u32::from_str_radix(&digits[1..], 16).ok()?
    } else {
        u32::from_str_radix(digits, 10).ok()?
    };
    Some((value % 1024) as Word)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_form_constants() {
        assert_eq!(const_val("#42"), Some(42));
        assert_eq!(const_val("#$2A"), Some(42));
        assert_eq!(const_val("#1025"), Some(1));
        assert_eq!(const_val("42"), None);
        assert_eq!(const_val("#label"), None);
        assert_eq!(const_val("#0x2A"), None);
    }
}
