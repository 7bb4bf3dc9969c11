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

use crate::assembler::symbol_table::SymbolTable;
use crate::ast::Operand;
use crate::errors::AssemblyError;
use crate::isa::{Instruction, InstructionKind, Opcode};

/// Encodes one instruction line into a 16-bit word during pass 2.
pub struct Encoder<'a> {
    symbols: &'a SymbolTable,
    line: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(symbols: &'a SymbolTable, line: usize) -> Self {
        Encoder { symbols, line }
    }

    pub fn encode(&self, mnemonic: &str, operands: &[Operand]) -> Result<u16, AssemblyError> {
        let opcode =
            Opcode::from_mnemonic(mnemonic).ok_or_else(|| AssemblyError::UnknownOpcode {
                line: self.line,
                mnemonic: mnemonic.to_string(),
            })?;

        let instruction = match opcode.kind() {
            InstructionKind::Memory => self.memory_format(opcode, operands)?,
            InstructionKind::IndexMemory => self.index_memory_format(opcode, operands)?,
            InstructionKind::Immediate => self.immediate_format(opcode, operands)?,
            InstructionKind::RegReg => self.reg_reg_format(opcode, operands)?,
            InstructionKind::ShiftRotate => self.shift_rotate_format(opcode, operands)?,
            InstructionKind::Io => self.io_format(opcode, operands)?,
            InstructionKind::Trap => {
                self.expect_count(opcode, operands, 1)?;
                Instruction::Trap {
                    code: self.field("trap code", &operands[0], 0, 15)? as u8,
                }
            }
            InstructionKind::Halt => {
                self.expect_count(opcode, operands, 0)?;
                Instruction::Halt
            }
        };

        Ok(instruction.encode())
    }

    /// Resolves a DATA operand: a decimal integer is used as-is, any
    /// identifier goes through the symbol table. The result is masked
    /// to 16 bits.
    pub fn data_word(&self, operand: &Operand) -> Result<u16, AssemblyError> {
        Ok((self.resolve(operand)? & 0xFFFF) as u16)
    }

    fn memory_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        let (operands, indirect) = split_indirect(operands, 3);
        self.expect_count(opcode, operands, 3)?;
        let r = match opcode {
            Opcode::Jcc => self.field("condition code", &operands[0], 0, 3)? as u8,
            // JMA/JSR carry no register; the field is validated and
            // encoded as zero.
            Opcode::Jma | Opcode::Jsr => {
                self.field("register", &operands[0], 0, 3)?;
                0
            }
            _ => self.field("register", &operands[0], 0, 3)? as u8,
        };
        Ok(Instruction::Memory {
            opcode,
            r,
            ix: self.field("index register", &operands[1], 0, 3)? as u8,
            indirect,
            addr: self.field("address", &operands[2], 0, 31)? as u8,
        })
    }

    fn index_memory_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        let (operands, indirect) = split_indirect(operands, 2);
        self.expect_count(opcode, operands, 2)?;
        Ok(Instruction::IndexMemory {
            opcode,
            ix: self.field("index register", &operands[0], 1, 3)? as u8,
            indirect,
            addr: self.field("address", &operands[1], 0, 31)? as u8,
        })
    }

    fn immediate_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        match opcode {
            Opcode::Rfs => {
                self.expect_count(opcode, operands, 1)?;
                Ok(Instruction::Immediate {
                    opcode,
                    r: 0,
                    imm: self.field("immediate", &operands[0], 0, 255)? as u8,
                })
            }
            _ => {
                self.expect_count(opcode, operands, 2)?;
                Ok(Instruction::Immediate {
                    opcode,
                    r: self.field("register", &operands[0], 0, 3)? as u8,
                    imm: self.field("immediate", &operands[1], 0, 255)? as u8,
                })
            }
        }
    }

    fn reg_reg_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        if opcode == Opcode::Not {
            self.expect_count(opcode, operands, 1)?;
            return Ok(Instruction::RegReg {
                opcode,
                rx: self.field("register", &operands[0], 0, 3)? as u8,
                ry: 0,
            });
        }
        self.expect_count(opcode, operands, 2)?;
        let rx = self.field("register", &operands[0], 0, 3)? as u8;
        let ry = self.field("register", &operands[1], 0, 3)? as u8;
        // MLT/DVD occupy a register pair rx, rx+1.
        if matches!(opcode, Opcode::Mlt | Opcode::Dvd) {
            for reg in [rx, ry] {
                if reg % 2 != 0 {
                    return Err(AssemblyError::OperandOutOfRange {
                        line: self.line,
                        field: "register pair (0 or 2)",
                        min: 0,
                        max: 2,
                        actual: i64::from(reg),
                    });
                }
            }
        }
        Ok(Instruction::RegReg { opcode, rx, ry })
    }

    fn shift_rotate_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        self.expect_count(opcode, operands, 4)?;
        Ok(Instruction::ShiftRotate {
            opcode,
            r: self.field("register", &operands[0], 0, 3)? as u8,
            count: self.field("shift count", &operands[1], 0, 15)? as u8,
            left: self.field("L/R flag", &operands[2], 0, 1)? != 0,
            logical: self.field("A/L flag", &operands[3], 0, 1)? != 0,
        })
    }

    fn io_format(
        &self,
        opcode: Opcode,
        operands: &[Operand],
    ) -> Result<Instruction, AssemblyError> {
        self.expect_count(opcode, operands, 2)?;
        Ok(Instruction::Io {
            opcode,
            r: self.field("register", &operands[0], 0, 3)? as u8,
            device: self.field("device id", &operands[1], 0, 31)? as u8,
        })
    }

    fn resolve(&self, operand: &Operand) -> Result<i64, AssemblyError> {
        match operand {
            Operand::Number(value) => Ok(*value),
            Operand::Symbol(name) => self
                .symbols
                .get(name)
                .map(i64::from)
                .ok_or_else(|| AssemblyError::UndefinedSymbol {
                    line: self.line,
                    name: name.clone(),
                }),
        }
    }

    // Resolve, then range-check against the instruction field.
    fn field(
        &self,
        name: &'static str,
        operand: &Operand,
        min: i64,
        max: i64,
    ) -> Result<u16, AssemblyError> {
        let value = self.resolve(operand)?;
        if value < min || value > max {
            return Err(AssemblyError::OperandOutOfRange {
                line: self.line,
                field: name,
                min,
                max,
                actual: value,
            });
        }
        Ok(value as u16)
    }

    fn expect_count(
        &self,
        opcode: Opcode,
        operands: &[Operand],
        expected: usize,
    ) -> Result<(), AssemblyError> {
        if operands.len() != expected {
            return Err(AssemblyError::OperandCountMismatch {
                line: self.line,
                mnemonic: opcode.mnemonic().to_string(),
                expected,
                actual: operands.len(),
            });
        }
        Ok(())
    }
}

// A trailing operand of literal `1` or `I` on a memory-format line
// sets the indirect bit and is consumed before the remaining operand
// shape is validated.
fn split_indirect(operands: &[Operand], base: usize) -> (&[Operand], bool) {
    if operands.len() == base + 1 && operands.last().is_some_and(is_indirect_marker) {
        (&operands[..base], true)
    } else {
        (operands, false)
    }
}

fn is_indirect_marker(operand: &Operand) -> bool {
    match operand {
        Operand::Number(1) => true,
        Operand::Symbol(name) => name.eq_ignore_ascii_case("i"),
        _ => false,
    }
}

// ------------- unit tests -------------
