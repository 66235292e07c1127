use matches::debug_assert_matches;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use vm16::Word;

#[derive(Parser)]
#[grammar = "vm16.pest"]
pub struct AsmParser;

/// Parses `rule` at the start of `input`; trailing input is left alone.
pub fn parse_prefix(rule: Rule, input: &str) -> Option<Pair<Rule>> {
    AsmParser::parse(rule, input).ok()?.next()
}

/// Parses `rule` and requires it to consume all of `input`.
pub fn parse_exact(rule: Rule, input: &str) -> Option<Pair<Rule>> {
    let pair = parse_prefix(rule, input)?;
    if pair.as_str().len() == input.len() {
        Some(pair)
    } else {
        None
    }
}

/// Decodes a parsed `number` pair. Values must fit a machine word.
pub fn number_value(pair: Pair<Rule>) -> Option<Word> {
    debug_assert_matches!(pair.as_rule(), Rule::number);
    let inner = pair.into_inner().next()?;
    let value = match inner.as_rule() {
        Rule::hex_number => {
            let digits = inner.into_inner().next()?;
            u32::from_str_radix(digits.as_str(), 16).ok()?
        }
        Rule::oct_number => u32::from_str_radix(inner.as_str(), 8).ok()?,
        Rule::dec_number => u32::from_str_radix(inner.as_str(), 10).ok()?,
        _ => return None,
    };
    if value > u32::from(Word::max_value()) {
        return None;
    }
    Some(value as Word)
}

/// Parses a stand-alone number literal: `$AB`, `0xAB`, octal (leading `0`)
/// or decimal.
pub fn parse_word(s: &str) -> Option<Word> {
    parse_exact(Rule::number, s).and_then(number_value)
}
