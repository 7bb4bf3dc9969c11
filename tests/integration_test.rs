/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::path::Path;

use tinycomp::assemble;
use tinycomp::errors::AssemblyError;
use tinycomp::file_reader::{DiskFileReader, FileReader, MockFileReader};
use tinycomp::simulator::{HeadlessDriver, RunOutcome};

const PARAGRAPH_SEARCH: &str = include_str!("../demos/paragraph_search.asm");

fn assemble_text(source: &str) -> tinycomp::Assembly {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.asm", source);
    assemble(Path::new("prog.asm"), &reader).unwrap()
}

#[test]
fn test_minimal_encoding_smoke() {
    let assembly = assemble_text("START: LOC 6\n       LDR 0,0,10\n       HLT\n");
    assert_eq!(assembly.load_image, "000006 002012\n000007 000000\n");
}

#[test]
fn test_forward_reference_resolves() {
    let assembly = assemble_text("LOC 6\n       JMA 0,0,END\n       DATA 7\nEND:   HLT\n");
    let lines: Vec<&str> = assembly.load_image.lines().collect();
    assert_eq!(lines.len(), 3);
    // END is address 8 and lands in the JMA address field.
    assert_eq!(lines[0], "000006 026010");
    assert_eq!(lines[1], "000007 000007");
    assert_eq!(lines[2], "000010 000000");
}

#[test]
fn test_assembly_error_carries_line_number() {
    let mut reader = MockFileReader::default();
    reader.add_file("bad.asm", "LOC 6\nFROB 1,2\n");
    let err = assemble(Path::new("bad.asm"), &reader).unwrap_err();
    let root = err.root_cause().to_string();
    assert!(root.contains("line 2"), "diagnostic was: {root}");
    assert!(root.contains("FROB"));
}

#[test]
fn test_listing_reproduces_source() {
    let source = "; greatest hits\nLOC 6\n       DATA 42   ; answer\n\n       HLT\n";
    let assembly = assemble_text(source);
    let lines: Vec<&str> = assembly.listing.lines().collect();
    assert_eq!(lines[0], "; greatest hits");
    assert!(lines[1].trim_start().starts_with("LOC 6"));
    assert!(lines[2].starts_with("000006 000052"));
    assert!(lines[2].contains("; answer"));
    assert_eq!(lines[3], "");
    assert!(lines[4].starts_with("000007 000000"));
}

#[test]
fn test_load_image_round_trips_through_ipl() {
    let assembly = assemble_text("LOC 6\nDATA 1\nDATA 2\nLOC 40\nDATA 3\nHLT\n");
    let mut driver = HeadlessDriver::new();
    driver.load(&assembly.load_image).unwrap();
    for word in &assembly.words {
        assert_eq!(
            driver.machine.memory.direct_read(word.address).unwrap(),
            word.word
        );
    }
    assert_eq!(driver.machine.regs.pc(), assembly.words[0].address);
}

#[test]
fn test_assemble_load_run_executes_program() {
    // Store 'H' and 'I', print both, halt.
    let source = "\
LOC 6
CHH:    DATA 72
CHI:    DATA 73
START:  LDR 0,0,CHH
        OUT 0,1
        LDR 0,0,CHI
        OUT 0,1
        HLT
";
    let assembly = assemble_text(source);
    let mut driver = HeadlessDriver::new();
    driver.load(&assembly.load_image).unwrap();
    // Execution starts at the first record, which is the data block;
    // point the PC at START instead.
    driver.machine.regs.set_pc(8);
    assert!(matches!(driver.run(100), RunOutcome::Halted { .. }));
    assert_eq!(driver.printed_text(), "HI");
}

#[test]
fn test_subroutine_linkage_end_to_end() {
    let source = "\
LOC 6
ENTRY:  JSR 0,0,SUB
        HLT
SUB:    RFS 0
";
    let assembly = assemble_text(source);
    let mut driver = HeadlessDriver::new();
    driver.load(&assembly.load_image).unwrap();
    assert!(matches!(driver.run(10), RunOutcome::Halted { .. }));
    // Returned to the instruction after the JSR with GPR0 = 0.
    assert_eq!(driver.machine.regs.pc(), 7);
    assert_eq!(driver.machine.regs.gpr(0), 0);
    assert_eq!(driver.machine.regs.gpr(3), 7);
}

#[test]
fn test_paragraph_search_end_to_end() {
    let paragraph = "Rain falls gently against the window. A gentle rain often brings peace.";
    let assembly = assemble_text(PARAGRAPH_SEARCH);

    let mut driver = HeadlessDriver::new();
    driver.load(&assembly.load_image).unwrap();
    driver.machine.regs.set_pc(20);
    driver
        .machine
        .set_program_file(paragraph.chars().map(|c| c as u16).collect());
    driver.deposit_input("window\n");

    assert!(matches!(driver.run(10_000), RunOutcome::Halted { .. }));
    let expected = format!("{paragraph}\nEnter word: \nWord: window\n Sentence: 1\n Word: 6\n");
    assert_eq!(driver.printed_text(), expected);
}

#[test]
fn test_paragraph_search_word_missing() {
    let assembly = assemble_text(PARAGRAPH_SEARCH);
    let mut driver = HeadlessDriver::new();
    driver.load(&assembly.load_image).unwrap();
    driver.machine.regs.set_pc(20);
    driver
        .machine
        .set_program_file("One two three.".chars().map(|c| c as u16).collect());
    driver.deposit_input("absent\n");

    assert!(matches!(driver.run(10_000), RunOutcome::Halted { .. }));
    // The not-found path halts right after the search.
    assert!(driver.printed_text().ends_with("Word: absent\n"));
}

#[test]
fn test_duplicate_label_diagnostic() {
    let mut reader = MockFileReader::default();
    reader.add_file("dup.asm", "A: DATA 1\nA: DATA 2\n");
    let err = assemble(Path::new("dup.asm"), &reader).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("duplicate label"), "diagnostic was: {chain}");
}

#[test]
fn test_disk_reader_and_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.asm");
    std::fs::write(&source_path, "LOC 6\nHLT\n").unwrap();

    let assembly = assemble(&source_path, &DiskFileReader).unwrap();
    let load_path = dir.path().join("LoadFile.txt");
    std::fs::write(&load_path, &assembly.load_image).unwrap();

    let round_trip = DiskFileReader.read_to_string(&load_path).unwrap();
    assert_eq!(round_trip, "000006 000000\n");
}

#[test]
fn test_assembly_errors_match_taxonomy() {
    for (source, expect) in [
        ("LDR 0,0\n", "expects 3 operand"),
        ("LDR 0,0,99\n", "address must be in 0..=31"),
        ("LOC\n", "malformed directive"),
        ("JMA 0,0,NOWHERE\n", "undefined symbol"),
        ("FROB 1\n", "unknown opcode"),
    ] {
        let err = tinycomp::assemble_source(source).unwrap_err();
        assert!(
            err.to_string().contains(expect),
            "source {source:?} produced {err}"
        );
    }
    assert!(matches!(
        tinycomp::assemble_source("X: DATA 1\nX: DATA 2\n"),
        Err(AssemblyError::DuplicateLabel { line: 2, .. })
    ));
}

#[test]
fn test_encoded_words_round_trip_through_decoder() {
    // Decoding an assembled word and re-assembling its rendering
    // produces the same word.
    let source = "\
LOC 6
        LDR 1,2,20
        STR 0,0,21,1
        LDX 3,22
        AIR 2,31
        SIR 0,1
        RFS 0
        ADD 0,1
        MLT 0,2
        NOT 3
        SRC 1,3,1,0
        RRC 2,4,0,1
        IN 0,0
        OUT 0,1
        CHK 1,1
        TRAP 3
        JCC 2,0,25
        SOB 1,0,26
        HLT
";
    let assembly = assemble_text(source);
    for emitted in &assembly.words {
        let decoded = tinycomp::isa::Instruction::decode(emitted.word)
            .unwrap_or_else(|| panic!("word {:06o} failed to decode", emitted.word));
        let rendered = format!("{decoded}\n");
        let reassembled = tinycomp::assemble_source(&rendered)
            .unwrap_or_else(|e| panic!("rendering {rendered:?} failed: {e}"));
        assert_eq!(reassembled.words[0].word, emitted.word, "for {rendered:?}");
    }
}
