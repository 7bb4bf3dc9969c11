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

use super::Machine;
use crate::errors::LoadError;
use crate::isa::ADDRESS_SPACE;
use log::{info, warn};

/// IPL: reset the machine, deposit every `address word` record (both
/// octal) directly into memory, then point PC and MAR at the first
/// record. An empty image leaves both at 0 with a warning.
pub fn load_image(machine: &mut Machine, text: &str) -> Result<(), LoadError> {
    machine.reset();

    let mut entry: Option<u16> = None;
    let mut count = 0usize;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let mut tokens = raw.split_whitespace();
        let (addr_token, word_token) = match (tokens.next(), tokens.next()) {
            (Some(a), Some(w)) => (a, w),
            _ => return Err(LoadError::MalformedRecord { line }),
        };
        let address = parse_octal(addr_token, line)?;
        let word = parse_octal(word_token, line)?;
        if address >= ADDRESS_SPACE {
            return Err(LoadError::AddressOutOfRange { line, address });
        }
        // The loader bypasses the cache; reset() above flushed it.
        machine
            .memory
            .direct_write(address, word)
            .map_err(|_| LoadError::AddressOutOfRange { line, address })?;
        if entry.is_none() {
            entry = Some(address);
        }
        count += 1;
    }

    match entry {
        Some(address) => {
            machine.regs.set_pc(address);
            machine.regs.set_mar(address);
            info!("IPL: {count} words deposited, entry {address:04o}");
        }
        None => warn!("IPL: empty load image; PC remains 0"),
    }
    Ok(())
}

fn parse_octal(token: &str, line: usize) -> Result<u16, LoadError> {
    u16::from_str_radix(token, 8).map_err(|_| LoadError::BadOctal {
        line,
        token: token.to_string(),
    })
}

// ------------- unit tests -------------
