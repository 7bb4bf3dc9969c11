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

use super::Fault;
use super::cache::Cache;
use crate::isa::ADDRESS_SPACE;

/// Addresses 0..=5 are reserved; any program-path access to them
/// faults.
pub const RESERVED_WORDS: u16 = 6;

// 2048 words, zero-initialized, fronted by the cache. `read`/`write`
// are the program path and enforce the reserved range; the `direct_*`
// pair bypasses the cache (cache fill and IPL deposit) and enforces
// bounds only.
#[derive(Debug)]
pub struct Memory {
    cells: Vec<u16>,
    cache: Cache,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: vec![0; usize::from(ADDRESS_SPACE)],
            cache: Cache::new(),
        }
    }

    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.cache.reset();
    }

    fn bounds(addr: u16) -> Result<usize, Fault> {
        if addr >= ADDRESS_SPACE {
            return Err(Fault::BeyondMemory);
        }
        Ok(usize::from(addr))
    }

    fn program_path(addr: u16) -> Result<usize, Fault> {
        let index = Self::bounds(addr)?;
        if addr < RESERVED_WORDS {
            return Err(Fault::ReservedMemory);
        }
        Ok(index)
    }

    pub fn read(&mut self, addr: u16) -> Result<u16, Fault> {
        Self::program_path(addr)?;
        Ok(self.cache.read(addr, &self.cells))
    }

    pub fn write(&mut self, addr: u16, value: u16) -> Result<(), Fault> {
        let index = Self::program_path(addr)?;
        // Write-through: main memory first, then the cache copy.
        self.cells[index] = value;
        self.cache.note_write(addr, value);
        Ok(())
    }

    pub fn direct_read(&self, addr: u16) -> Result<u16, Fault> {
        Ok(self.cells[Self::bounds(addr)?])
    }

    pub fn direct_write(&mut self, addr: u16, value: u16) -> Result<(), Fault> {
        let index = Self::bounds(addr)?;
        self.cells[index] = value;
        Ok(())
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- unit tests -------------
