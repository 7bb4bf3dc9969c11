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

use super::{Machine, StepOutcome, loader};
use crate::errors::LoadError;

/// Why a [`HeadlessDriver::run`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted { cycles: u64 },
    Faulted { cycles: u64 },
    AwaitingInput { cycles: u64 },
    CycleLimit { cycles: u64 },
}

// Headless driver for tests and the CLI: deposits keyboard input,
// collects printed bytes, and pumps the execution loop without any
// front panel.
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    pub machine: Machine,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, image: &str) -> Result<(), LoadError> {
        loader::load_image(&mut self.machine, image)
    }

    pub fn deposit_input(&mut self, text: &str) {
        self.machine.io.deposit_str(text);
    }

    pub fn printed(&self) -> &[u8] {
        self.machine.io.printed()
    }

    pub fn printed_text(&self) -> String {
        self.machine.io.printed_text()
    }

    pub fn step(&mut self) -> StepOutcome {
        self.machine.step()
    }

    /// Step up to `n` cycles, stopping early on anything other than a
    /// plain executed instruction.
    pub fn step_n(&mut self, n: usize) -> StepOutcome {
        let mut last = StepOutcome::Executed;
        for _ in 0..n {
            last = self.machine.step();
            if last != StepOutcome::Executed {
                break;
            }
        }
        last
    }

    /// Run until halt, fault, suspension, or the cycle bound.
    pub fn run(&mut self, max_cycles: u64) -> RunOutcome {
        let mut cycles = 0u64;
        while cycles < max_cycles {
            match self.machine.step() {
                StepOutcome::Executed => cycles += 1,
                StepOutcome::Halted => return RunOutcome::Halted { cycles },
                StepOutcome::Faulted(_) => return RunOutcome::Faulted { cycles },
                StepOutcome::AwaitingInput => return RunOutcome::AwaitingInput { cycles },
            }
        }
        RunOutcome::CycleLimit { cycles }
    }
}

// ------------- unit tests -------------
