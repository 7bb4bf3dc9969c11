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

// Represents a single operand token. The tokenizer only classifies the
// token; range checks and symbol resolution happen in the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(i64),
    Symbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Loc,
    Data,
}

// The first token after the optional label: a directive keyword or an
// opcode mnemonic, normalized to uppercase. Mnemonic validity is
// checked at encode time.
#[derive(Debug, Clone, PartialEq)]
pub enum Head {
    Directive(Directive),
    Mnemonic(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub head: Head,
    pub operands: Vec<Operand>,
}

// One tokenized source line. Label-only lines are permitted, so both
// fields may be present or either may be absent; blank and comment-only
// lines never reach this type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceLine {
    pub line_number: usize,
    pub label: Option<String>,
    pub statement: Option<Statement>,
    pub comment: Option<String>,
}
