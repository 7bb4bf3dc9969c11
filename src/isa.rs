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

//! The binary contract shared by the assembler and the simulator: one
//! opcode table, one word layout. Both sides must agree bit-for-bit,
//! so everything that touches instruction words lives here.
//!
//! A word is 16 bits. The opcode occupies bits 15..10; the remaining
//! ten bits are laid out per format:
//!
//! ```text
//! | 15..10 | 9..8 | 7..6 | 5 | 4..0 |
//! | opcode |  R   |  IX  | I | ADDR |
//! ```
//!
//! Immediate instructions reuse bits 7..0 as the immediate; shifts use
//! bit 7 as A/L, bit 6 as L/R and bits 3..0 as the count; I/O uses
//! bits 4..0 as the device id; TRAP uses bits 3..0 as the trap code.

use std::fmt;

/// Words of addressable memory (addresses are 12-bit).
pub const ADDRESS_SPACE: u16 = 2048;

/// Mask applied to every PC/MAR assignment and indirect dereference.
pub const ADDRESS_MASK: u16 = 0o7777;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Hlt,
    Ldr,
    Str,
    Lda,
    Amr,
    Smr,
    Air,
    Sir,
    Jz,
    Jne,
    Jcc,
    Jma,
    Jsr,
    Rfs,
    Sob,
    Jge,
    Mlt,
    Dvd,
    Trr,
    And,
    Orr,
    Not,
    Add,
    Sub,
    Trap,
    Src,
    Rrc,
    Ldx,
    Stx,
    In,
    Out,
    Chk,
}

/// Operand shape of an opcode; the encoder dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Memory,
    IndexMemory,
    Immediate,
    RegReg,
    ShiftRotate,
    Io,
    Trap,
    Halt,
}

impl Opcode {
    /// The 6-bit opcode value (given in octal).
    pub const fn code(self) -> u16 {
        match self {
            Opcode::Hlt => 0o00,
            Opcode::Ldr => 0o01,
            Opcode::Str => 0o02,
            Opcode::Lda => 0o03,
            Opcode::Amr => 0o04,
            Opcode::Smr => 0o05,
            Opcode::Air => 0o06,
            Opcode::Sir => 0o07,
            Opcode::Jz => 0o10,
            Opcode::Jne => 0o11,
            Opcode::Jcc => 0o12,
            Opcode::Jma => 0o13,
            Opcode::Jsr => 0o14,
            Opcode::Rfs => 0o15,
            Opcode::Sob => 0o16,
            Opcode::Jge => 0o17,
            Opcode::Mlt => 0o20,
            Opcode::Dvd => 0o21,
            Opcode::Trr => 0o22,
            Opcode::And => 0o23,
            Opcode::Orr => 0o24,
            Opcode::Not => 0o25,
            Opcode::Add => 0o26,
            Opcode::Sub => 0o27,
            Opcode::Trap => 0o30,
            Opcode::Src => 0o31,
            Opcode::Rrc => 0o32,
            Opcode::Ldx => 0o41,
            Opcode::Stx => 0o42,
            Opcode::In => 0o61,
            Opcode::Out => 0o62,
            Opcode::Chk => 0o63,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0o00 => Opcode::Hlt,
            0o01 => Opcode::Ldr,
            0o02 => Opcode::Str,
            0o03 => Opcode::Lda,
            0o04 => Opcode::Amr,
            0o05 => Opcode::Smr,
            0o06 => Opcode::Air,
            0o07 => Opcode::Sir,
            0o10 => Opcode::Jz,
            0o11 => Opcode::Jne,
            0o12 => Opcode::Jcc,
            0o13 => Opcode::Jma,
            0o14 => Opcode::Jsr,
            0o15 => Opcode::Rfs,
            0o16 => Opcode::Sob,
            0o17 => Opcode::Jge,
            0o20 => Opcode::Mlt,
            0o21 => Opcode::Dvd,
            0o22 => Opcode::Trr,
            0o23 => Opcode::And,
            0o24 => Opcode::Orr,
            0o25 => Opcode::Not,
            0o26 => Opcode::Add,
            0o27 => Opcode::Sub,
            0o30 => Opcode::Trap,
            0o31 => Opcode::Src,
            0o32 => Opcode::Rrc,
            0o41 => Opcode::Ldx,
            0o42 => Opcode::Stx,
            0o61 => Opcode::In,
            0o62 => Opcode::Out,
            0o63 => Opcode::Chk,
            _ => return None,
        })
    }

    /// Lookup by uppercase mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "HLT" => Opcode::Hlt,
            "LDR" => Opcode::Ldr,
            "STR" => Opcode::Str,
            "LDA" => Opcode::Lda,
            "AMR" => Opcode::Amr,
            "SMR" => Opcode::Smr,
            "AIR" => Opcode::Air,
            "SIR" => Opcode::Sir,
            "JZ" => Opcode::Jz,
            "JNE" => Opcode::Jne,
            "JCC" => Opcode::Jcc,
            "JMA" => Opcode::Jma,
            "JSR" => Opcode::Jsr,
            "RFS" => Opcode::Rfs,
            "SOB" => Opcode::Sob,
            "JGE" => Opcode::Jge,
            "MLT" => Opcode::Mlt,
            "DVD" => Opcode::Dvd,
            "TRR" => Opcode::Trr,
            "AND" => Opcode::And,
            "ORR" => Opcode::Orr,
            "NOT" => Opcode::Not,
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "TRAP" => Opcode::Trap,
            "SRC" => Opcode::Src,
            "RRC" => Opcode::Rrc,
            "LDX" => Opcode::Ldx,
            "STX" => Opcode::Stx,
            "IN" => Opcode::In,
            "OUT" => Opcode::Out,
            "CHK" => Opcode::Chk,
            _ => return None,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldr => "LDR",
            Opcode::Str => "STR",
            Opcode::Lda => "LDA",
            Opcode::Amr => "AMR",
            Opcode::Smr => "SMR",
            Opcode::Air => "AIR",
            Opcode::Sir => "SIR",
            Opcode::Jz => "JZ",
            Opcode::Jne => "JNE",
            Opcode::Jcc => "JCC",
            Opcode::Jma => "JMA",
            Opcode::Jsr => "JSR",
            Opcode::Rfs => "RFS",
            Opcode::Sob => "SOB",
            Opcode::Jge => "JGE",
            Opcode::Mlt => "MLT",
            Opcode::Dvd => "DVD",
            Opcode::Trr => "TRR",
            Opcode::And => "AND",
            Opcode::Orr => "ORR",
            Opcode::Not => "NOT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Trap => "TRAP",
            Opcode::Src => "SRC",
            Opcode::Rrc => "RRC",
            Opcode::Ldx => "LDX",
            Opcode::Stx => "STX",
            Opcode::In => "IN",
            Opcode::Out => "OUT",
            Opcode::Chk => "CHK",
        }
    }

    pub const fn kind(self) -> InstructionKind {
        match self {
            Opcode::Hlt => InstructionKind::Halt,
            Opcode::Ldr
            | Opcode::Str
            | Opcode::Lda
            | Opcode::Amr
            | Opcode::Smr
            | Opcode::Jz
            | Opcode::Jne
            | Opcode::Jcc
            | Opcode::Jma
            | Opcode::Jsr
            | Opcode::Sob
            | Opcode::Jge => InstructionKind::Memory,
            Opcode::Ldx | Opcode::Stx => InstructionKind::IndexMemory,
            Opcode::Air | Opcode::Sir | Opcode::Rfs => InstructionKind::Immediate,
            Opcode::Mlt
            | Opcode::Dvd
            | Opcode::Trr
            | Opcode::And
            | Opcode::Orr
            | Opcode::Not
            | Opcode::Add
            | Opcode::Sub => InstructionKind::RegReg,
            Opcode::Src | Opcode::Rrc => InstructionKind::ShiftRotate,
            Opcode::In | Opcode::Out | Opcode::Chk => InstructionKind::Io,
            Opcode::Trap => InstructionKind::Trap,
        }
    }
}

/// A decoded instruction word. Field widths are already validated:
/// decoding a word that does not form a legal instruction yields
/// `None`, which the execution unit reports as an illegal-opcode
/// fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Memory {
        opcode: Opcode,
        // For JCC this is the condition-code index; for JMA/JSR it is
        // always zero.
        r: u8,
        ix: u8,
        indirect: bool,
        addr: u8,
    },
    IndexMemory {
        opcode: Opcode,
        ix: u8,
        indirect: bool,
        addr: u8,
    },
    Immediate {
        opcode: Opcode,
        r: u8,
        imm: u8,
    },
    RegReg {
        opcode: Opcode,
        rx: u8,
        ry: u8,
    },
    ShiftRotate {
        opcode: Opcode,
        r: u8,
        // Bit 7: 1 = logical, 0 = arithmetic. Bit 6: 1 = left.
        logical: bool,
        left: bool,
        count: u8,
    },
    Io {
        opcode: Opcode,
        r: u8,
        device: u8,
    },
    Trap {
        code: u8,
    },
    Halt,
}

impl Instruction {
    pub fn encode(&self) -> u16 {
        match *self {
            Instruction::Halt => 0,
            Instruction::Memory {
                opcode,
                r,
                ix,
                indirect,
                addr,
            } => {
                (opcode.code() << 10)
                    | (u16::from(r) << 8)
                    | (u16::from(ix) << 6)
                    | (u16::from(indirect) << 5)
                    | u16::from(addr)
            }
            Instruction::IndexMemory {
                opcode,
                ix,
                indirect,
                addr,
            } => {
                (opcode.code() << 10)
                    | (u16::from(ix) << 6)
                    | (u16::from(indirect) << 5)
                    | u16::from(addr)
            }
            Instruction::Immediate { opcode, r, imm } => {
                (opcode.code() << 10) | (u16::from(r) << 8) | u16::from(imm)
            }
            Instruction::RegReg { opcode, rx, ry } => {
                (opcode.code() << 10) | (u16::from(rx) << 8) | (u16::from(ry) << 6)
            }
            Instruction::ShiftRotate {
                opcode,
                r,
                logical,
                left,
                count,
            } => {
                (opcode.code() << 10)
                    | (u16::from(r) << 8)
                    | (u16::from(logical) << 7)
                    | (u16::from(left) << 6)
                    | u16::from(count)
            }
            Instruction::Io { opcode, r, device } => {
                (opcode.code() << 10) | (u16::from(r) << 8) | u16::from(device)
            }
            Instruction::Trap { code } => (Opcode::Trap.code() << 10) | u16::from(code),
        }
    }

    pub fn decode(word: u16) -> Option<Instruction> {
        let opcode = Opcode::from_code(word >> 10)?;
        let r = ((word >> 8) & 0b11) as u8;
        let ix = ((word >> 6) & 0b11) as u8;
        let indirect = word & 0b10_0000 != 0;
        let addr = (word & 0b1_1111) as u8;

        Some(match opcode.kind() {
            InstructionKind::Halt => Instruction::Halt,
            InstructionKind::Memory => Instruction::Memory {
                opcode,
                r,
                ix,
                indirect,
                addr,
            },
            InstructionKind::IndexMemory => {
                // Index register 0 does not exist for LDX/STX.
                if ix == 0 {
                    return None;
                }
                Instruction::IndexMemory {
                    opcode,
                    ix,
                    indirect,
                    addr,
                }
            }
            InstructionKind::Immediate => Instruction::Immediate {
                opcode,
                r,
                imm: (word & 0xFF) as u8,
            },
            InstructionKind::RegReg => {
                // MLT/DVD write a register pair: rx and ry must be 0 or 2.
                if matches!(opcode, Opcode::Mlt | Opcode::Dvd) && (r % 2 != 0 || ix % 2 != 0) {
                    return None;
                }
                Instruction::RegReg {
                    opcode,
                    rx: r,
                    ry: ix,
                }
            }
            InstructionKind::ShiftRotate => Instruction::ShiftRotate {
                opcode,
                r,
                logical: word & 0x80 != 0,
                left: word & 0x40 != 0,
                count: (word & 0x0F) as u8,
            },
            InstructionKind::Io => Instruction::Io {
                opcode,
                r,
                device: addr,
            },
            InstructionKind::Trap => Instruction::Trap {
                code: (word & 0x0F) as u8,
            },
        })
    }
}

// Renders in source syntax, e.g. `LDR 0,0,10` or `LDR 0,1,10,1` with
// the indirect bit set. Re-assembling the rendered text produces the
// same word.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Halt => write!(f, "HLT"),
            Instruction::Memory {
                opcode,
                r,
                ix,
                indirect,
                addr,
            } => {
                write!(f, "{} {},{},{}", opcode.mnemonic(), r, ix, addr)?;
                if indirect {
                    write!(f, ",1")?;
                }
                Ok(())
            }
            Instruction::IndexMemory {
                opcode,
                ix,
                indirect,
                addr,
            } => {
                write!(f, "{} {},{}", opcode.mnemonic(), ix, addr)?;
                if indirect {
                    write!(f, ",1")?;
                }
                Ok(())
            }
            Instruction::Immediate { opcode, r, imm } => match opcode {
                Opcode::Rfs => write!(f, "RFS {imm}"),
                _ => write!(f, "{} {},{}", opcode.mnemonic(), r, imm),
            },
            Instruction::RegReg { opcode, rx, ry } => match opcode {
                Opcode::Not => write!(f, "NOT {rx}"),
                _ => write!(f, "{} {},{}", opcode.mnemonic(), rx, ry),
            },
            Instruction::ShiftRotate {
                opcode,
                r,
                logical,
                left,
                count,
            } => write!(
                f,
                "{} {},{},{},{}",
                opcode.mnemonic(),
                r,
                count,
                u8::from(left),
                u8::from(logical)
            ),
            Instruction::Io { opcode, r, device } => {
                write!(f, "{} {},{}", opcode.mnemonic(), r, device)
            }
            Instruction::Trap { code } => write!(f, "TRAP {code}"),
        }
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_codes_round_trip() {
        for code in 0..64u16 {
            if let Some(op) = Opcode::from_code(code) {
                assert_eq!(op.code(), code);
                assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
            }
        }
    }

    #[test]
    fn test_encode_ldr() {
        let inst = Instruction::Memory {
            opcode: Opcode::Ldr,
            r: 0,
            ix: 0,
            indirect: false,
            addr: 10,
        };
        assert_eq!(inst.encode(), 0o002012);
    }

    #[test]
    fn test_encode_hlt_is_zero() {
        assert_eq!(Instruction::Halt.encode(), 0);
        assert_eq!(Instruction::decode(0), Some(Instruction::Halt));
    }

    #[test]
    fn test_decode_round_trip_memory() {
        let inst = Instruction::Memory {
            opcode: Opcode::Str,
            r: 3,
            ix: 2,
            indirect: true,
            addr: 31,
        };
        assert_eq!(Instruction::decode(inst.encode()), Some(inst));
    }

    #[test]
    fn test_decode_round_trip_immediate() {
        let inst = Instruction::Immediate {
            opcode: Opcode::Air,
            r: 1,
            imm: 200,
        };
        assert_eq!(Instruction::decode(inst.encode()), Some(inst));
    }

    #[test]
    fn test_decode_round_trip_shift() {
        let inst = Instruction::ShiftRotate {
            opcode: Opcode::Src,
            r: 2,
            logical: true,
            left: false,
            count: 15,
        };
        assert_eq!(Instruction::decode(inst.encode()), Some(inst));
    }

    #[test]
    fn test_decode_rejects_unassigned_opcode() {
        // 0o77 is not in the opcode table.
        assert_eq!(Instruction::decode(0o77 << 10), None);
    }

    #[test]
    fn test_decode_rejects_ldx_with_index_zero() {
        let word = Opcode::Ldx.code() << 10;
        assert_eq!(Instruction::decode(word), None);
    }

    #[test]
    fn test_decode_rejects_odd_mlt_pair() {
        let word = (Opcode::Mlt.code() << 10) | (1 << 8);
        assert_eq!(Instruction::decode(word), None);
    }

    #[test]
    fn test_display_matches_source_syntax() {
        let inst = Instruction::Memory {
            opcode: Opcode::Ldr,
            r: 0,
            ix: 0,
            indirect: false,
            addr: 10,
        };
        assert_eq!(inst.to_string(), "LDR 0,0,10");

        let inst = Instruction::ShiftRotate {
            opcode: Opcode::Rrc,
            r: 1,
            logical: false,
            left: true,
            count: 4,
        };
        assert_eq!(inst.to_string(), "RRC 1,4,1,0");
    }
}
