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

mod cache;
mod exec;
mod harness;
mod io;
mod loader;
mod memory;
mod registers;
mod traps;

pub use cache::{AccessKind, Cache, LINE_COUNT};
pub use harness::{HeadlessDriver, RunOutcome};
pub use io::{IoChannels, KEYBOARD_DEVICE, PRINTER_DEVICE};
pub use loader::load_image;
pub use memory::{Memory, RESERVED_WORDS};
pub use registers::{ConditionCode, RegisterFile};

/// Machine fault codes; the MFR composes them by OR, though the loop
/// exits at the first non-zero MFR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Access to the reserved range 0..=5.
    ReservedMemory,
    IllegalTrap,
    IllegalOpcode,
    /// Address at or past the end of memory.
    BeyondMemory,
}

impl Fault {
    pub const fn code(self) -> u8 {
        match self {
            Fault::ReservedMemory => 0b0001,
            Fault::IllegalTrap => 0b0010,
            Fault::IllegalOpcode => 0b0100,
            Fault::BeyondMemory => 0b1000,
        }
    }
}

/// What one call to [`Machine::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    Halted,
    /// IN found the keyboard buffer empty; PC is unchanged and the
    /// driver must deposit input before resuming.
    AwaitingInput,
    Faulted(Fault),
}

// The machine singleton: register file, memory (which owns the
// cache), and the device channels. Only the execution unit, the IPL
// loader and operator deposits mutate it, one at a time.
#[derive(Debug)]
pub struct Machine {
    pub regs: RegisterFile,
    pub memory: Memory,
    pub io: IoChannels,
    running: bool,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            regs: RegisterFile::new(),
            memory: Memory::new(),
            io: IoChannels::new(),
            running: true,
        }
    }

    pub fn reset(&mut self) {
        self.regs.reset();
        self.memory.reset();
        self.io.reset();
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Driver-requested cancellation; honored between instructions.
    pub fn request_halt(&mut self) {
        self.running = false;
    }

    /// Register the word stream served by TRAP 0.
    pub fn set_program_file(&mut self, words: Vec<u16>) {
        self.io.set_program_file(words);
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes() {
        assert_eq!(Fault::ReservedMemory.code(), 1);
        assert_eq!(Fault::IllegalTrap.code(), 2);
        assert_eq!(Fault::IllegalOpcode.code(), 4);
        assert_eq!(Fault::BeyondMemory.code(), 8);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut machine = Machine::new();
        machine.regs.set_pc(100);
        machine.regs.set_gpr(0, 7);
        machine.memory.direct_write(50, 9).unwrap();
        machine.io.deposit_str("abc");

        machine.reset();
        assert_eq!(machine.regs.pc(), 0);
        assert_eq!(machine.regs.gpr(0), 0);
        assert_eq!(machine.memory.direct_read(50).unwrap(), 0);
        assert!(!machine.io.key_ready());

        machine.reset();
        assert_eq!(machine.regs.pc(), 0);
        assert!(machine.is_running());
    }
}
