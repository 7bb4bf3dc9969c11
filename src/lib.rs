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

pub mod assembler;
pub mod ast;
pub mod errors;
pub mod file_reader;
pub mod isa;
pub mod parser;
pub mod simulator;

use std::path::Path;

use anyhow::{Context, Result};
use file_reader::FileReader;

pub use assembler::Assembly;

/// Assemble a source file into a listing and a load image.
pub fn assemble<F: FileReader>(source_path: &Path, reader: &F) -> Result<Assembly> {
    let source = reader.read_to_string(source_path).with_context(|| {
        format!("failed to read source file {}", source_path.display())
    })?;

    let assembly = assemble_source(&source).context("assembly failed")?;
    Ok(assembly)
}

/// Assemble source text: tokenize, build the symbol table (pass 1),
/// then encode and render the outputs (pass 2).
pub fn assemble_source(source: &str) -> Result<Assembly, errors::AssemblyError> {
    let lines = parser::parse_source(source)?;
    let symbols = assembler::build_symbol_table(&lines)?;
    assembler::generate(&lines, &symbols, source)
}
