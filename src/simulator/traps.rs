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

use super::{Fault, Machine};
use log::warn;

// Software service calls. Codes 0..=3 are defined; everything else is
// an illegal-trap fault. Memory touched by a service goes through the
// program path, so reserved/bounds faults propagate.
pub(crate) fn dispatch(machine: &mut Machine, code: u8) -> Result<(), Fault> {
    match code {
        0 => load_file(machine),
        1 => print_memory(machine),
        2 => read_word(machine),
        3 => find_word(machine),
        _ => Err(Fault::IllegalTrap),
    }
}

// TRAP 0: deposit the configured program file at GPR0, length to GPR1.
fn load_file(machine: &mut Machine) -> Result<(), Fault> {
    let base = machine.regs.gpr(0);
    let words = machine.io.program_file().to_vec();
    if words.is_empty() {
        warn!("TRAP 0 with no program file registered");
    }
    for (offset, word) in words.iter().enumerate() {
        let addr = base
            .checked_add(offset as u16)
            .ok_or(Fault::BeyondMemory)?;
        machine.memory.write(addr, *word)?;
    }
    machine.regs.set_gpr(1, words.len() as u16);
    Ok(())
}

// TRAP 1: emit GPR1 bytes starting at GPR0 to the printer.
fn print_memory(machine: &mut Machine) -> Result<(), Fault> {
    let base = machine.regs.gpr(0);
    let count = machine.regs.gpr(1);
    for offset in 0..count {
        let addr = base.checked_add(offset).ok_or(Fault::BeyondMemory)?;
        let word = machine.memory.read(addr)?;
        machine.io.print_byte(word as u8);
    }
    Ok(())
}

// TRAP 2: read one whitespace-delimited word of input into memory at
// GPR0, one code point per word; length to GPR1. Leading whitespace is
// skipped, the terminating delimiter stays in the buffer.
fn read_word(machine: &mut Machine) -> Result<(), Fault> {
    let base = machine.regs.gpr(0);
    while machine.io.peek_key().is_some_and(is_whitespace) {
        machine.io.read_key();
    }
    let mut length: u16 = 0;
    while let Some(key) = machine.io.peek_key() {
        if is_whitespace(key) {
            break;
        }
        machine.io.read_key();
        let addr = base.checked_add(length).ok_or(Fault::BeyondMemory)?;
        machine.memory.write(addr, key)?;
        length += 1;
    }
    machine.regs.set_gpr(1, length);
    Ok(())
}

// TRAP 3: paragraph word search. Inputs (paragraph_addr=GPR0,
// paragraph_len=GPR1, word_addr=GPR2, word_len=GPR3); returns the
// 1-based sentence number in GPR0 and the 1-based word number within
// that sentence in GPR1, or GPR0=0 if the word does not occur.
fn find_word(machine: &mut Machine) -> Result<(), Fault> {
    let (paragraph_base, paragraph_len) = (machine.regs.gpr(0), machine.regs.gpr(1));
    let (needle_base, needle_len) = (machine.regs.gpr(2), machine.regs.gpr(3));
    let paragraph = read_span(machine, paragraph_base, paragraph_len)?;
    let needle = read_span(machine, needle_base, needle_len)?;

    match locate(&paragraph, &needle) {
        Some((sentence, word)) => {
            machine.regs.set_gpr(0, sentence);
            machine.regs.set_gpr(1, word);
        }
        None => machine.regs.set_gpr(0, 0),
    }
    Ok(())
}

fn read_span(machine: &mut Machine, base: u16, length: u16) -> Result<Vec<u16>, Fault> {
    let mut span = Vec::with_capacity(usize::from(length));
    for offset in 0..length {
        let addr = base.checked_add(offset).ok_or(Fault::BeyondMemory)?;
        span.push(machine.memory.read(addr)?);
    }
    Ok(span)
}

fn is_whitespace(code: u16) -> bool {
    char::from_u32(u32::from(code)).is_some_and(char::is_whitespace)
}

fn is_word_char(code: u16) -> bool {
    char::from_u32(u32::from(code)).is_some_and(|c| c.is_ascii_alphanumeric())
}

fn is_sentence_end(code: u16) -> bool {
    code == u16::from(b'.') || code == u16::from(b'!') || code == u16::from(b'?')
}

// Sentences are delimited by `.`, `!`, `?`; words by any run of
// non-alphanumeric code points. Matching is case-sensitive.
fn locate(paragraph: &[u16], needle: &[u16]) -> Option<(u16, u16)> {
    if needle.is_empty() {
        return None;
    }
    let mut sentence: u16 = 1;
    let mut word_in_sentence: u16 = 0;
    let mut current: Vec<u16> = Vec::new();

    for &code in paragraph {
        if is_word_char(code) {
            current.push(code);
            continue;
        }
        if !current.is_empty() {
            word_in_sentence += 1;
            if current == needle {
                return Some((sentence, word_in_sentence));
            }
            current.clear();
        }
        if is_sentence_end(code) {
            sentence += 1;
            word_in_sentence = 0;
        }
    }
    if !current.is_empty() {
        word_in_sentence += 1;
        if current == needle {
            return Some((sentence, word_in_sentence));
        }
    }
    None
}

// ------------- unit tests -------------
