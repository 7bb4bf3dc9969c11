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

pub const LINE_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    valid: bool,
    tag: u16,
    data: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessKind {
    #[default]
    None,
    ReadHit,
    ReadMiss,
    WriteHit,
    WriteMiss,
}

// Fully associative, one word per line, FIFO replacement via the
// victim pointer, write-through with write-allocate. The telemetry
// fields are observability only; no algorithm consults them.
#[derive(Debug, Default)]
pub struct Cache {
    lines: [Line; LINE_COUNT],
    victim: usize,
    hits: u64,
    misses: u64,
    last_kind: AccessKind,
    last_index: usize,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every line, zero the telemetry, reset the victim
    /// pointer.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn lookup(&self, addr: u16) -> Option<usize> {
        self.lines.iter().position(|l| l.valid && l.tag == addr)
    }

    // A miss installs at the victim pointer, which then advances
    // modulo the line count.
    fn install(&mut self, addr: u16, data: u16) -> usize {
        let index = self.victim;
        self.lines[index] = Line {
            valid: true,
            tag: addr,
            data,
        };
        self.victim = (index + 1) % LINE_COUNT;
        index
    }

    pub(crate) fn read(&mut self, addr: u16, cells: &[u16]) -> u16 {
        if let Some(index) = self.lookup(addr) {
            self.hits += 1;
            self.note(AccessKind::ReadHit, index);
            self.lines[index].data
        } else {
            self.misses += 1;
            let data = cells[usize::from(addr)];
            let index = self.install(addr, data);
            self.note(AccessKind::ReadMiss, index);
            data
        }
    }

    // Main memory has already been updated (write-through); keep the
    // cached copy coherent. A write-hit updates in place without
    // moving the victim pointer; a write-miss allocates.
    pub(crate) fn note_write(&mut self, addr: u16, value: u16) {
        if let Some(index) = self.lookup(addr) {
            self.hits += 1;
            self.lines[index].data = value;
            self.note(AccessKind::WriteHit, index);
        } else {
            self.misses += 1;
            let index = self.install(addr, value);
            self.note(AccessKind::WriteMiss, index);
        }
    }

    fn note(&mut self, kind: AccessKind, index: usize) {
        self.last_kind = kind;
        self.last_index = index;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn last_access(&self) -> (AccessKind, usize) {
        (self.last_kind, self.last_index)
    }

    pub fn victim_pointer(&self) -> usize {
        self.victim
    }

    /// `(tag, data)` of a valid line, for inspection.
    pub fn line(&self, index: usize) -> Option<(u16, u16)> {
        let line = self.lines.get(index)?;
        line.valid.then_some((line.tag, line.data))
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cells_with(addr: usize, value: u16) -> Vec<u16> {
        let mut cells = vec![0u16; 2048];
        cells[addr] = value;
        cells
    }

    #[test]
    fn test_read_miss_then_hit() {
        let mut cache = Cache::new();
        let cells = cells_with(100, 42);

        assert_eq!(cache.read(100, &cells), 42);
        assert_eq!(cache.last_access(), (AccessKind::ReadMiss, 0));
        assert_eq!(cache.misses(), 1);

        assert_eq!(cache.read(100, &cells), 42);
        assert_eq!(cache.last_access(), (AccessKind::ReadHit, 0));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_victim_pointer_advances_modulo_line_count() {
        let mut cache = Cache::new();
        let cells = vec![0u16; 2048];
        for n in 0..20u16 {
            cache.read(100 + n, &cells);
            assert_eq!(cache.victim_pointer(), usize::from(n + 1) % LINE_COUNT);
        }
    }

    #[test]
    fn test_write_hit_leaves_victim_pointer() {
        let mut cache = Cache::new();
        let cells = cells_with(50, 1);
        cache.read(50, &cells);
        let victim = cache.victim_pointer();

        cache.note_write(50, 9);
        assert_eq!(cache.victim_pointer(), victim);
        assert_eq!(cache.last_access(), (AccessKind::WriteHit, 0));
        assert_eq!(cache.line(0), Some((50, 9)));
    }

    #[test]
    fn test_write_miss_allocates() {
        let mut cache = Cache::new();
        cache.note_write(75, 3);
        assert_eq!(cache.last_access(), (AccessKind::WriteMiss, 0));
        assert_eq!(cache.line(0), Some((75, 3)));
        assert_eq!(cache.victim_pointer(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cache = Cache::new();
        let cells = vec![0u16; 2048];
        for n in 0..5 {
            cache.read(n, &cells);
        }
        cache.reset();
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
        assert_eq!(cache.victim_pointer(), 0);
        assert_eq!(cache.last_access(), (AccessKind::None, 0));
        assert_eq!(cache.line(0), None);
    }
}
