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

use super::registers::ConditionCode;
use super::{Fault, Machine, StepOutcome, io, traps};
use crate::isa::{ADDRESS_MASK, Instruction, Opcode};
use log::{error, info};

// How one instruction hands control back to the loop.
enum Flow {
    Next,
    Jump(u16),
    Halt,
    Await,
}

impl Machine {
    /// One fetch/decode/execute cycle. PC advances unless the
    /// instruction jumped, suspended on empty input, or faulted.
    pub fn step(&mut self) -> StepOutcome {
        if !self.running {
            return StepOutcome::Halted;
        }

        // Fetch.
        let pc = self.regs.pc();
        self.regs.set_mar(pc);
        let word = match self.memory.read(pc) {
            Ok(word) => word,
            Err(fault) => return self.raise(fault),
        };
        self.regs.set_ir(word);
        self.regs.set_mbr(word);

        // Decode.
        let Some(instruction) = Instruction::decode(word) else {
            return self.raise(Fault::IllegalOpcode);
        };

        // Execute, then commit the PC.
        match self.execute(&instruction) {
            Ok(Flow::Next) => {
                self.regs.set_pc(pc.wrapping_add(1));
                StepOutcome::Executed
            }
            Ok(Flow::Jump(target)) => {
                self.regs.set_pc(target);
                StepOutcome::Executed
            }
            Ok(Flow::Halt) => {
                self.running = false;
                info!("HLT instruction executed.");
                StepOutcome::Halted
            }
            Ok(Flow::Await) => StepOutcome::AwaitingInput,
            Err(fault) => self.raise(fault),
        }
    }

    fn raise(&mut self, fault: Fault) -> StepOutcome {
        self.regs.raise_mfr(fault.code());
        self.running = false;
        error!(
            "machine fault at PC {:04o}: code {:04b}",
            self.regs.pc(),
            fault.code()
        );
        StepOutcome::Faulted(fault)
    }

    // Effective address for all memory-format operations. The raw
    // indexed sum is checked against the reserved range and bounds
    // before any truncation to 12 bits.
    fn effective_address(&mut self, ix: u8, indirect: bool, addr: u8) -> Result<u16, Fault> {
        let mut ea = u32::from(addr) + u32::from(self.regs.ixr(ix));
        if indirect {
            check_range(ea)?;
            ea = u32::from(self.memory.read(ea as u16)?) & u32::from(ADDRESS_MASK);
        }
        check_range(ea)?;
        Ok(ea as u16)
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<Flow, Fault> {
        match *instruction {
            Instruction::Halt => Ok(Flow::Halt),
            Instruction::Memory {
                opcode,
                r,
                ix,
                indirect,
                addr,
            } => self.exec_memory(opcode, r, ix, indirect, addr),
            Instruction::IndexMemory {
                opcode,
                ix,
                indirect,
                addr,
            } => self.exec_index_memory(opcode, ix, indirect, addr),
            Instruction::Immediate { opcode, r, imm } => self.exec_immediate(opcode, r, imm),
            Instruction::RegReg { opcode, rx, ry } => self.exec_reg_reg(opcode, rx, ry),
            Instruction::ShiftRotate {
                opcode,
                r,
                logical,
                left,
                count,
            } => {
                let value = self.regs.gpr(r);
                let result = match opcode {
                    Opcode::Rrc => rotate(value, u16::from(count), left),
                    _ => shift(value, u16::from(count), left, logical),
                };
                self.regs.set_gpr(r, result);
                Ok(Flow::Next)
            }
            Instruction::Io { opcode, r, device } => self.exec_io(opcode, r, device),
            Instruction::Trap { code } => {
                traps::dispatch(self, code)?;
                Ok(Flow::Next)
            }
        }
    }

    fn exec_memory(
        &mut self,
        opcode: Opcode,
        r: u8,
        ix: u8,
        indirect: bool,
        addr: u8,
    ) -> Result<Flow, Fault> {
        let ea = self.effective_address(ix, indirect, addr)?;
        match opcode {
            Opcode::Ldr => {
                let value = self.memory.read(ea)?;
                self.regs.set_gpr(r, value);
                Ok(Flow::Next)
            }
            Opcode::Str => {
                self.memory.write(ea, self.regs.gpr(r))?;
                Ok(Flow::Next)
            }
            // LDA: the register receives the effective address itself.
            Opcode::Lda => {
                self.regs.set_gpr(r, ea);
                Ok(Flow::Next)
            }
            Opcode::Amr => {
                let operand = self.memory.read(ea)?;
                let sum = signed(self.regs.gpr(r)) + signed(operand);
                self.set_arith_flags(sum);
                self.regs.set_gpr(r, sum as u16);
                Ok(Flow::Next)
            }
            Opcode::Smr => {
                let operand = self.memory.read(ea)?;
                let diff = signed(self.regs.gpr(r)) - signed(operand);
                self.set_arith_flags(diff);
                self.regs.set_gpr(r, diff as u16);
                Ok(Flow::Next)
            }
            Opcode::Jz => Ok(branch(self.regs.gpr(r) == 0, ea)),
            Opcode::Jne => Ok(branch(self.regs.gpr(r) != 0, ea)),
            Opcode::Jge => Ok(branch((self.regs.gpr(r) as i16) >= 0, ea)),
            // The R field holds the condition-code index.
            Opcode::Jcc => Ok(branch(self.regs.cc.test_index(r), ea)),
            Opcode::Jma => Ok(Flow::Jump(ea)),
            Opcode::Jsr => {
                // R3 is the link register.
                self.regs
                    .set_gpr(3, self.regs.pc().wrapping_add(1) & ADDRESS_MASK);
                Ok(Flow::Jump(ea))
            }
            Opcode::Sob => {
                let value = (self.regs.gpr(r) as i16).wrapping_sub(1);
                self.regs.set_gpr(r, value as u16);
                Ok(branch(value > 0, ea))
            }
            _ => Err(Fault::IllegalOpcode),
        }
    }

    fn exec_index_memory(
        &mut self,
        opcode: Opcode,
        ix: u8,
        indirect: bool,
        addr: u8,
    ) -> Result<Flow, Fault> {
        // The IX field names the target register here; the effective
        // address is never indexed.
        let ea = self.effective_address(0, indirect, addr)?;
        match opcode {
            Opcode::Ldx => {
                let value = self.memory.read(ea)?;
                self.regs.set_ixr(ix, value);
            }
            _ => {
                self.memory.write(ea, self.regs.ixr(ix))?;
            }
        }
        Ok(Flow::Next)
    }

    fn exec_immediate(&mut self, opcode: Opcode, r: u8, imm: u8) -> Result<Flow, Fault> {
        match opcode {
            Opcode::Air => Ok(self.add_immediate(r, i32::from(imm))),
            Opcode::Sir => Ok(self.add_immediate(r, -i32::from(imm))),
            _ => {
                // RFS: immediate to GPR0, return through the link
                // register.
                self.regs.set_gpr(0, u16::from(imm));
                Ok(Flow::Jump(self.regs.gpr(3) & ADDRESS_MASK))
            }
        }
    }

    // AIR/SIR. A zero immediate is a no-op; a zero register receives
    // the signed immediate directly.
    fn add_immediate(&mut self, r: u8, imm: i32) -> Flow {
        if imm == 0 {
            return Flow::Next;
        }
        let current = self.regs.gpr(r);
        if current == 0 {
            self.regs.set_gpr(r, imm as i16 as u16);
        } else {
            let sum = signed(current) + imm;
            self.set_arith_flags(sum);
            self.regs.set_gpr(r, sum as u16);
        }
        Flow::Next
    }

    fn exec_reg_reg(&mut self, opcode: Opcode, rx: u8, ry: u8) -> Result<Flow, Fault> {
        match opcode {
            Opcode::Add => {
                let sum = signed(self.regs.gpr(rx)) + signed(self.regs.gpr(ry));
                self.set_arith_flags(sum);
                self.regs.set_gpr(rx, sum as u16);
            }
            Opcode::Sub => {
                let diff = signed(self.regs.gpr(rx)) - signed(self.regs.gpr(ry));
                self.set_arith_flags(diff);
                self.regs.set_gpr(rx, diff as u16);
            }
            Opcode::Mlt => {
                let product = signed(self.regs.gpr(rx)) * signed(self.regs.gpr(ry));
                let high = (product >> 16) as u16;
                let low = product as u16;
                self.regs.set_gpr(rx, high);
                self.regs.set_gpr(rx + 1, low);
                // Overflow unless the high half is the sign extension
                // of the low half.
                let fits = (high == 0 && low & 0x8000 == 0)
                    || (high == 0xFFFF && low & 0x8000 != 0);
                self.regs.cc.set(ConditionCode::OVERFLOW, !fits);
            }
            Opcode::Dvd => {
                let divisor = signed(self.regs.gpr(ry));
                if divisor == 0 {
                    self.regs.cc.set(ConditionCode::DIVZERO, true);
                } else {
                    self.regs.cc.set(ConditionCode::DIVZERO, false);
                    let dividend = signed(self.regs.gpr(rx));
                    let quotient = dividend / divisor;
                    let remainder = dividend % divisor;
                    self.regs.set_gpr(rx, quotient as u16);
                    self.regs.set_gpr(rx + 1, remainder as u16);
                    self.regs.cc.set(
                        ConditionCode::OVERFLOW,
                        quotient > i32::from(i16::MAX) || quotient < i32::from(i16::MIN),
                    );
                }
            }
            Opcode::Trr => {
                let equal = self.regs.gpr(rx) == self.regs.gpr(ry);
                self.regs.cc.set(ConditionCode::EQUALORNOT, equal);
            }
            Opcode::And => {
                let value = self.regs.gpr(rx) & self.regs.gpr(ry);
                self.regs.set_gpr(rx, value);
            }
            Opcode::Orr => {
                let value = self.regs.gpr(rx) | self.regs.gpr(ry);
                self.regs.set_gpr(rx, value);
            }
            Opcode::Not => {
                let value = !self.regs.gpr(rx);
                self.regs.set_gpr(rx, value);
            }
            _ => return Err(Fault::IllegalOpcode),
        }
        Ok(Flow::Next)
    }

    fn exec_io(&mut self, opcode: Opcode, r: u8, device: u8) -> Result<Flow, Fault> {
        match opcode {
            Opcode::In => match device {
                io::KEYBOARD_DEVICE => match self.io.read_key() {
                    Some(key) => {
                        self.regs.set_gpr(r, key);
                        Ok(Flow::Next)
                    }
                    // Suspend until the driver deposits input.
                    None => Ok(Flow::Await),
                },
                _ => {
                    self.regs.set_gpr(r, 0);
                    Ok(Flow::Next)
                }
            },
            Opcode::Out => {
                if device == io::PRINTER_DEVICE {
                    self.io.print_byte(self.regs.gpr(r) as u8);
                }
                Ok(Flow::Next)
            }
            _ => {
                let status = match device {
                    io::KEYBOARD_DEVICE => u16::from(self.io.key_ready()),
                    io::PRINTER_DEVICE => 1,
                    _ => 0,
                };
                self.regs.set_gpr(r, status);
                Ok(Flow::Next)
            }
        }
    }

    fn set_arith_flags(&mut self, result: i32) {
        self.regs
            .cc
            .set(ConditionCode::OVERFLOW, result > i32::from(i16::MAX));
        self.regs
            .cc
            .set(ConditionCode::UNDERFLOW, result < i32::from(i16::MIN));
    }
}

fn signed(value: u16) -> i32 {
    i32::from(value as i16)
}

fn branch(condition: bool, target: u16) -> Flow {
    if condition {
        Flow::Jump(target)
    } else {
        Flow::Next
    }
}

fn check_range(ea: u32) -> Result<(), Fault> {
    if ea <= 5 {
        Err(Fault::ReservedMemory)
    } else if ea >= u32::from(crate::isa::ADDRESS_SPACE) {
        Err(Fault::BeyondMemory)
    } else {
        Ok(())
    }
}

// Shift count 0 is a no-op; left shifts are always logical; right
// shifts sign-extend unless the A/L bit selects logical.
pub(crate) fn shift(value: u16, count: u16, left: bool, logical: bool) -> u16 {
    if count == 0 {
        return value;
    }
    if count >= 16 {
        return if !left && !logical {
            ((value as i16) >> 15) as u16
        } else {
            0
        };
    }
    if left {
        value << count
    } else if logical {
        value >> count
    } else {
        ((value as i16) >> count) as u16
    }
}

// Rotate count is taken modulo 16, so 16 equals 0.
pub(crate) fn rotate(value: u16, count: u16, left: bool) -> u16 {
    let count = u32::from(count) % 16;
    if left {
        value.rotate_left(count)
    } else {
        value.rotate_right(count)
    }
}

// ------------- unit tests -------------
