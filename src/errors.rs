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

use thiserror::Error;

// Assembly is fail-fast: the first error aborts the run and is
// reported with its 1-based source line.
#[derive(Error, Debug, PartialEq)]
pub enum AssemblyError {
    #[error("Syntax Error: {0}")]
    PestError(#[from] pest::error::Error<crate::parser::Rule>),

    #[error("line {line}: duplicate label `{name}`")]
    DuplicateLabel { line: usize, name: String },

    #[error("line {line}: undefined symbol `{name}`")]
    UndefinedSymbol { line: usize, name: String },

    #[error("line {line}: unknown opcode `{mnemonic}`")]
    UnknownOpcode { line: usize, mnemonic: String },

    #[error("line {line}: {mnemonic} expects {expected} operand(s), got {actual}")]
    OperandCountMismatch {
        line: usize,
        mnemonic: String,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: {field} must be in {min}..={max}, got {actual}")]
    OperandOutOfRange {
        line: usize,
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("line {line}: malformed directive: {reason}")]
    MalformedDirective { line: usize, reason: String },
}

// IPL rejects a malformed record before depositing any of its words;
// records already deposited stay in memory.
#[derive(Error, Debug, PartialEq)]
pub enum LoadError {
    #[error("load image line {line}: expected two octal tokens")]
    MalformedRecord { line: usize },

    #[error("load image line {line}: `{token}` is not a 16-bit octal value")]
    BadOctal { line: usize, token: String },

    #[error("load image line {line}: address {address:06o} is outside memory")]
    AddressOutOfRange { line: usize, address: u16 },
}
