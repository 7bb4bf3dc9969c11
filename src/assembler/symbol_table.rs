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

use crate::errors::AssemblyError;
use std::collections::HashMap;

// The symbol table stores label names and their absolute addresses.
// It exists only for the duration of one assembly; lookups never
// mutate it.
#[derive(Debug, Default, PartialEq)]
pub struct SymbolTable {
    entries: HashMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.entries.get(name).copied()
    }

    // Redefinition is a fatal assembly error.
    pub fn put(&mut self, name: &str, address: u16, line: usize) -> Result<(), AssemblyError> {
        if self.entries.contains_key(name) {
            return Err(AssemblyError::DuplicateLabel {
                line,
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), address);
        Ok(())
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut table = SymbolTable::new();
        table.put("START", 6, 1).unwrap();
        assert!(table.contains("START"));
        assert_eq!(table.get("START"), Some(6));
        assert_eq!(table.get("END"), None);
    }

    #[test]
    fn test_duplicate_label_is_fatal() {
        let mut table = SymbolTable::new();
        table.put("LOOP", 10, 3).unwrap();
        let err = table.put("LOOP", 12, 7).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::DuplicateLabel {
                line: 7,
                name: "LOOP".to_string()
            }
        );
    }
}
