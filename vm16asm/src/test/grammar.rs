use crate::parser::{parse_exact, parse_prefix, parse_word, Rule};

fn operand_shape(input: &str) -> Option<Rule> {
    parse_exact(Rule::operand, input)
        .and_then(|pair| pair.into_inner().next())
        .map(|inner| inner.as_rule())
}

#[test]
fn number_literals_cover_every_base() {
    assert_eq!(parse_word("$FF"), Some(0xFF));
    assert_eq!(parse_word("0x10"), Some(0x10));
    assert_eq!(parse_word("017"), Some(0o17));
    assert_eq!(parse_word("9"), Some(9));
    assert_eq!(parse_word("0"), Some(0));
    assert_eq!(parse_word("65535"), Some(0xFFFF));
}

#[test]
fn number_literals_are_bounded_and_exact() {
    assert_eq!(parse_word("65536"), None);
    assert_eq!(parse_word("$10000"), None);
    assert_eq!(parse_word("08"), None);
    assert_eq!(parse_word("5x"), None);
    assert_eq!(parse_word("abc"), None);
    assert_eq!(parse_word(""), None);
}

#[test]
fn operand_shapes_resolve_in_order() {
    assert_eq!(operand_shape("#5"), Some(Rule::const_num));
    assert_eq!(operand_shape("#$12"), Some(Rule::const_num));
    assert_eq!(operand_shape("+5"), Some(Rule::rel_num));
    assert_eq!(operand_shape("-$10"), Some(Rule::rel_num));
    assert_eq!(operand_shape("5"), Some(Rule::addr_num));
    assert_eq!(operand_shape("#foo"), Some(Rule::const_sym));
    assert_eq!(operand_shape("-loop"), Some(Rule::rel_sym));
    assert_eq!(operand_shape("foo.bar"), Some(Rule::addr_sym));
    assert_eq!(operand_shape("[SP+2]"), Some(Rule::sp_rel));
    assert_eq!(operand_shape("[SP+$A]"), Some(Rule::sp_rel));
}

#[test]
fn malformed_operands_do_not_parse() {
    assert_eq!(operand_shape("[Z]"), None);
    assert_eq!(operand_shape("5abc"), None);
    assert_eq!(operand_shape("#"), None);
    assert_eq!(operand_shape("foo+bar"), None);
}

#[test]
fn labels_match_as_a_prefix() {
    let pair = parse_prefix(Rule::label_def, "loop: nop").unwrap();
    assert_eq!(pair.as_str(), "loop:");
    assert_eq!(pair.into_inner().next().unwrap().as_str(), "loop");

    // Identifiers are at least two characters long.
    assert!(parse_prefix(Rule::label_def, "a: nop").is_none());
    assert!(parse_prefix(Rule::label_def, "9a: nop").is_none());
    assert!(parse_prefix(Rule::label_def, "loop nop").is_none());
}

#[test]
fn aliases_match_name_and_value() {
    let pair = parse_prefix(Rule::alias_def, "max = $FF trailing").unwrap();
    let mut inner = pair.into_inner();
    assert_eq!(inner.next().unwrap().as_str(), "max");
    assert_eq!(inner.next().unwrap().as_str(), "$FF");
}

#[test]
fn quoted_strings_stop_at_the_closing_quote() {
    let pair = parse_exact(Rule::quoted, "\"hi there\"").unwrap();
    assert_eq!(pair.into_inner().next().unwrap().as_str(), "hi there");

    assert!(parse_exact(Rule::quoted, "\"hi\" there").is_none());
    assert!(parse_prefix(Rule::quoted, "\"hi\" there").is_some());
    assert!(parse_exact(Rule::quoted, "\"open").is_none());
}

#[test]
fn macro_signatures_take_an_optional_single_digit_arity() {
    let pair = parse_exact(Rule::macro_sig, "name 3").unwrap();
    let mut inner = pair.into_inner();
    assert_eq!(inner.next().unwrap().as_str(), "name");
    assert_eq!(inner.next().unwrap().as_str(), "3");

    let pair = parse_exact(Rule::macro_sig, "name").unwrap();
    let mut inner = pair.into_inner();
    assert_eq!(inner.next().unwrap().as_str(), "name");
    assert!(inner.next().is_none());

    assert!(parse_exact(Rule::macro_sig, "name 12").is_none());
}
