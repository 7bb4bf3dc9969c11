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

mod encoder;
mod symbol_table;

pub use encoder::Encoder;
pub use symbol_table::SymbolTable;

use crate::ast::{Directive, Head, Operand, SourceLine, Statement};
use crate::errors::AssemblyError;
use crate::isa::ADDRESS_SPACE;
use std::collections::{HashMap, HashSet};

/// One word of the load image, tied back to the source line that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedWord {
    pub line_number: usize,
    pub address: u16,
    pub word: u16,
}

/// The complete result of one assembly run.
#[derive(Debug, PartialEq)]
pub struct Assembly {
    pub words: Vec<EmittedWord>,
    pub listing: String,
    pub load_image: String,
}

/// Pass 1: walk the tokenized lines with a location counter and record
/// every label. LOC moves the counter; DATA and every opcode line
/// allocate one word.
pub fn build_symbol_table(lines: &[SourceLine]) -> Result<SymbolTable, AssemblyError> {
    let mut symbols = SymbolTable::new();
    let mut loc: u16 = 0;

    for line in lines {
        // A label binds to the counter before the directive on the
        // same line takes effect.
        if let Some(label) = &line.label {
            symbols.put(label, loc, line.line_number)?;
        }
        if let Some(statement) = &line.statement {
            match &statement.head {
                Head::Directive(Directive::Loc) => {
                    loc = loc_target(statement, line.line_number)?;
                }
                Head::Directive(Directive::Data) | Head::Mnemonic(_) => {
                    loc = advance(loc, line.line_number)?;
                }
            }
        }
    }

    Ok(symbols)
}

/// Pass 2: re-walk with the counter reset, encode every DATA and
/// opcode line, and render the listing and the load image.
pub fn generate(
    lines: &[SourceLine],
    symbols: &SymbolTable,
    source: &str,
) -> Result<Assembly, AssemblyError> {
    let mut words = Vec::new();
    let mut loc_lines = HashSet::new();
    let mut loc: u16 = 0;

    for line in lines {
        let Some(statement) = &line.statement else {
            continue;
        };
        match &statement.head {
            Head::Directive(Directive::Loc) => {
                loc = loc_target(statement, line.line_number)?;
                loc_lines.insert(line.line_number);
            }
            Head::Directive(Directive::Data) => {
                let encoder = Encoder::new(symbols, line.line_number);
                let word = encoder.data_word(data_operand(statement, line.line_number)?)?;
                words.push(EmittedWord {
                    line_number: line.line_number,
                    address: loc,
                    word,
                });
                loc = advance(loc, line.line_number)?;
            }
            Head::Mnemonic(mnemonic) => {
                let encoder = Encoder::new(symbols, line.line_number);
                let word = encoder.encode(mnemonic, &statement.operands)?;
                words.push(EmittedWord {
                    line_number: line.line_number,
                    address: loc,
                    word,
                });
                loc = advance(loc, line.line_number)?;
            }
        }
    }

    let listing = render_listing(source, &words, &loc_lines);
    let load_image = render_load_image(&words);
    Ok(Assembly {
        words,
        listing,
        load_image,
    })
}

// LOC takes a single decimal address; a label argument is malformed.
fn loc_target(statement: &Statement, line: usize) -> Result<u16, AssemblyError> {
    match statement.operands.as_slice() {
        [Operand::Number(value)] => {
            if *value < 0 || *value >= i64::from(ADDRESS_SPACE) {
                return Err(AssemblyError::OperandOutOfRange {
                    line,
                    field: "LOC address",
                    min: 0,
                    max: i64::from(ADDRESS_SPACE) - 1,
                    actual: *value,
                });
            }
            Ok(*value as u16)
        }
        _ => Err(AssemblyError::MalformedDirective {
            line,
            reason: "LOC takes a single decimal address".to_string(),
        }),
    }
}

fn data_operand(statement: &Statement, line: usize) -> Result<&Operand, AssemblyError> {
    match statement.operands.as_slice() {
        [operand] => Ok(operand),
        _ => Err(AssemblyError::MalformedDirective {
            line,
            reason: "DATA takes a single value".to_string(),
        }),
    }
}

// Allocate one word at `loc` and step the counter.
fn advance(loc: u16, line: usize) -> Result<u16, AssemblyError> {
    if loc >= ADDRESS_SPACE {
        return Err(AssemblyError::OperandOutOfRange {
            line,
            field: "location counter",
            min: 0,
            max: i64::from(ADDRESS_SPACE) - 1,
            actual: i64::from(loc),
        });
    }
    Ok(loc + 1)
}

// Load image: one `AAAAAA OOOOOO` record per emitted word, both
// fields six octal digits, in assembly order.
fn render_load_image(words: &[EmittedWord]) -> String {
    let mut out = String::new();
    for emitted in words {
        out.push_str(&format!("{:06o} {:06o}\n", emitted.address, emitted.word));
    }
    out
}

// Listing: address/word columns followed by the original source line.
// LOC directives get a decorative line without the columns; blank and
// comment-only lines are reproduced verbatim.
fn render_listing(source: &str, words: &[EmittedWord], loc_lines: &HashSet<usize>) -> String {
    let by_line: HashMap<usize, &EmittedWord> =
        words.iter().map(|w| (w.line_number, w)).collect();

    let mut out = String::new();
    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        if let Some(emitted) = by_line.get(&line_number) {
            out.push_str(&format!(
                "{:06o} {:06o} {}\n",
                emitted.address, emitted.word, raw
            ));
        } else if loc_lines.contains(&line_number) {
            out.push_str(&format!("{:13} {}\n", "", raw));
        } else {
            out.push_str(raw);
            out.push('\n');
        }
    }
    out
}

// ------------- unit tests -------------
