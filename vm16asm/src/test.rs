use std::path::Path;

use crate::error::{Error, LineErrorKind};
use crate::*;

mod grammar;

fn assemble_ok(source: &str) -> Assembly {
    match assemble_str("main.asm", source) {
        Ok(assembly) => assembly,
        Err(err) => panic!("assembly failed: {}", err),
    }
}

fn line_error(source: &str) -> LineErrorKind {
    match assemble_str("main.asm", source) {
        Err(Error::Line { kind, .. }) => kind,
        other => panic!("expected a line error, got {:?}", other),
    }
}

#[test]
fn register_to_register_move() {
    let assembly = assemble_ok(".code\nmove A, B");
    assert_eq!(assembly.image.start, 0x0000);
    assert_eq!(assembly.image.cells, vec![0x2001]);
}

#[test]
fn immediate_operand_takes_an_extra_word() {
    let assembly = assemble_ok(".code\nmove A, #$1234");
    assert_eq!(assembly.image.cells, vec![0x2010, 0x1234]);
}

#[test]
fn forward_references_resolve() {
    let assembly = assemble_ok(".code\n.org $100\njump label\nnop\nlabel: nop");
    assert_eq!(assembly.image.start, 0x0100);
    assert_eq!(
        assembly.image.cells,
        vec![0x1200, 0x0103, 0x0000, 0x0000]
    );
    assert_eq!(assembly.symbols["main.label"], 0x0103);
}

#[test]
fn symbol_relative_branches_count_from_past_the_instruction() {
    let assembly = assemble_ok(".code\n.org $100\nback: nop\njump -back");
    assert_eq!(
        assembly.image.cells,
        vec![0x0000, 0x1240, 0xFFFD]
    );
}

#[test]
fn short_form_packs_the_constant_into_one_word() {
    let assembly = assemble_ok(".code\nsys #42");
    assert_eq!(assembly.image.cells, vec![0x082A]);

    let assembly = assemble_ok(".code\nsys #1000");
    assert_eq!(assembly.image.cells, vec![0x0800 + 1000]);
}

#[test]
fn packed_text_pairs_characters() {
    let assembly = assemble_ok(".ctext\n\"AB\"");
    assert_eq!(assembly.image.cells, vec![0x4142]);
}

#[test]
fn word_text_emits_one_word_per_character() {
    let assembly = assemble_ok(".text\nmsg: \"AB\"");
    assert_eq!(assembly.image.cells, vec![0x0041, 0x0042]);
    assert_eq!(assembly.symbols["main.msg"], 0x0000);
}

#[test]
fn data_lines_accept_every_literal_base() {
    let assembly = assemble_ok(".data\n1, 2, $FF\n0x10 017 9");
    assert_eq!(assembly.image.cells, vec![1, 2, 0xFF, 0x10, 0o17, 9]);
}

#[test]
fn labels_record_their_definition_address() {
    let assembly = assemble_ok(".org $50\n.code\nfirst: nop\nsecond: nop");
    assert_eq!(assembly.symbols["main.start"], 0x50);
    assert_eq!(assembly.symbols["main.first"], 0x50);
    assert_eq!(assembly.symbols["main.second"], 0x51);
}

#[test]
fn encoded_length_always_matches_the_declared_size() {
    let assembly = assemble_ok(
        ".org $100\n.code\nstart: move A, #$10\nloop: dbnz A, loop\nsys #3\n\
         .data\n1 2 3\n.text\n\"hi\"\n.ctext\n\"hi\"",
    );
    for token in &assembly.tokens {
        assert_eq!(token.opcodes().len(), token.size as usize);
    }
}

#[test]
fn aliases_substitute_textually() {
    let assembly = assemble_ok("ten = 10\n.code\nmove A, #ten\nmove B, ten");
    assert_eq!(
        assembly.image.cells,
        vec![0x2010, 0x000A, 0x2031, 0x000A]
    );
}

#[test]
fn aliases_can_name_registers() {
    let assembly = assemble_ok("ptr = [X]\n.code\nmove ptr, B");
    assert_eq!(assembly.image.cells, vec![0x2101]);
}

#[test]
fn in_slot_constants_do_not_take_a_word() {
    let assembly = assemble_ok(".code\nmove A, #1\nmove B, #$0");
    assert_eq!(assembly.image.cells, vec![0x200D, 0x202C]);
}

#[test]
fn macros_expand_before_pass_1() {
    let assembly = assemble_ok("$macro bump2 1\ninc %1\ninc %1\n$endmacro\n.code\nbump2 A");
    assert_eq!(assembly.image.cells, vec![0x2800, 0x2800]);
}

const LIB: &str = ".org $200\n.code\nexit: ret";

fn main_with_includes(includes: usize) -> String {
    let mut source = String::new();
    for _ in 0..includes {
        source.push_str("$include \"lib.asm\"\n");
    }
    source.push_str(".org $100\n.code\ncall lib\njump lib.exit\nhalt");
    source
}

fn assemble_with_lib(source: &str) -> Assembly {
    let mut fs = MemFs::new();
    fs.insert("main.asm", source);
    fs.insert("lib.asm", LIB);
    assemble(&fs, Path::new("main.asm")).unwrap()
}

#[test]
fn included_namespaces_resolve_to_their_start_label() {
    let assembly = assemble_with_lib(&main_with_includes(1));
    assert_eq!(assembly.symbols["lib.start"], 0x0200);
    assert_eq!(assembly.symbols["lib.exit"], 0x0200);
    assert_eq!(assembly.symbols["main.start"], 0x0100);

    assert_eq!(assembly.image.start, 0x0100);
    assert_eq!(assembly.image.last, 0x0200);
    assert_eq!(
        &assembly.image.cells[0..5],
        &[0x1600, 0x0200, 0x1200, 0x0200, 0x1C00]
    );
    assert_eq!(assembly.image.cells[0x100], 0x1800);
}

#[test]
fn double_inclusion_changes_nothing() {
    let once = assemble_with_lib(&main_with_includes(1));
    let twice = assemble_with_lib(&main_with_includes(2));
    assert_eq!(once.symbols, twice.symbols);
    assert_eq!(once.aliases, twice.aliases);
    assert_eq!(once.image, twice.image);
}

#[test]
fn duplicate_labels_are_fatal() {
    assert_eq!(
        line_error(".code\nfoo: nop\nfoo: nop"),
        LineErrorKind::DuplicateLabel("foo".to_string())
    );
}

#[test]
fn unknown_mnemonics_are_fatal() {
    assert_eq!(
        line_error(".code\nfrob A"),
        LineErrorKind::InvalidSyntax("frob A".to_string())
    );
}

#[test]
fn unknown_symbols_are_fatal() {
    assert_eq!(
        line_error(".code\njump nowhere"),
        LineErrorKind::UnknownSymbol("nowhere".to_string())
    );
}

#[test]
fn operand_classes_are_enforced() {
    assert_eq!(
        line_error(".code\nout A, B"),
        LineErrorKind::OperandType {
            position: 1,
            operand: "A".to_string(),
        }
    );
    assert_eq!(
        line_error(".code\nmove #2, A"),
        LineErrorKind::OperandType {
            position: 1,
            operand: "#2".to_string(),
        }
    );
}

#[test]
fn operand_counts_are_enforced() {
    assert_eq!(
        line_error(".code\nret A"),
        LineErrorKind::OperandCount {
            expected: 0,
            found: 1,
        }
    );
    assert_eq!(
        line_error(".code\nsys"),
        LineErrorKind::OperandCount {
            expected: 1,
            found: 0,
        }
    );
}

#[test]
fn three_word_instructions_are_rejected() {
    assert_eq!(line_error(".code\nmove #2, #3"), LineErrorKind::Oversize);
}

#[test]
fn bad_numbers_are_fatal() {
    assert_eq!(
        line_error(".data\n99999"),
        LineErrorKind::BadNumber("99999".to_string())
    );
    assert_eq!(
        line_error(".org $10000\n.code\nnop"),
        LineErrorKind::BadNumber("$10000".to_string())
    );
}

#[test]
fn overlapping_records_warn_and_overwrite() {
    let assembly = assemble_ok(".data\n1 2\n.org 0\n3");
    assert_eq!(assembly.warnings, vec![Warning { address: 0 }]);
    assert_eq!(assembly.image.cells, vec![3, 2]);
}

#[test]
fn overlaps_resolve_in_address_order() {
    let assembly = assemble_ok(".data\n.org $A\n$AA $BB\n.org 0\n1 1 1 1 1 1 1 1 1 1 1 1");
    assert_eq!(
        assembly.warnings,
        vec![Warning { address: 0x0A }, Warning { address: 0x0B }]
    );
    assert_eq!(&assembly.image.cells[0x0A..], &[0xAA, 0xBB]);
}

#[test]
fn com_output_requires_the_fixed_origin() {
    let assembly = assemble_ok(".org $100\n.code\nmove A, B");
    let words = output::com_words(&assembly.image).unwrap();
    assert_eq!(words, vec![0x2001]);

    let mut bytes = Vec::new();
    output::write_com(&mut bytes, &words).unwrap();
    assert_eq!(bytes, vec![0x01, 0x20]);

    let assembly = assemble_ok(".code\nnop");
    assert_eq!(
        output::com_words(&assembly.image).unwrap_err(),
        Error::ComOrigin(0)
    );
}

#[test]
fn h16_output_is_sparse() {
    let assembly = assemble_ok(".data\n1 2 3\n.org $10\n$ABCD");
    assert_eq!(
        output::h16_text(&assembly.image),
        ":200000100000010\n:3000000000100020003\n:1001000ABCD\n:00000FF"
    );
}

#[test]
fn listings_carry_addresses_words_and_source() {
    let assembly = assemble_ok(".code\nmove A, B ; copy");
    let listing = output::listing(&assembly.tokens);
    assert!(listing.contains("0000: 2001"));
    assert!(listing.contains("; copy"));
    assert!(listing.contains("File: main.asm"));
}
