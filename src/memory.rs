//! Main memory store.
//!
//! Per §2, main memory is an external collaborator in principle: a
//! byte-addressed map from 32-bit addresses to bytes that completes every
//! operation synchronously with no latency. No other supplier exists for
//! this crate, so a minimal sparse implementation lives here; the cache
//! layer is the only component that talks to it.

use std::collections::HashMap;

/// A byte-addressable store backing both caches.
///
/// Unmapped addresses read as zero (§7: "this crate's in-process memory
/// store treats every 32-bit address as mapped, reading zero-initialized
/// bytes until written").
#[derive(Debug, Default, Clone)]
pub struct MainMemory {
    bytes: HashMap<u32, u8>,
}

impl MainMemory {
    /// Creates an empty memory image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a single byte, defaulting to zero if never written.
    #[must_use]
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.bytes.get(&addr).copied().unwrap_or(0)
    }

    /// Writes a single byte.
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        self.bytes.insert(addr, value);
    }

    /// Loads a flat binary image starting at `base`, big-endian byte order
    /// preserved exactly as given (the image is not reinterpreted as words).
    pub fn load_image(&mut self, base: u32, image: &[u8]) {
        for (i, &b) in image.iter().enumerate() {
            self.write_byte(base.wrapping_add(i as u32), b);
        }
    }
}
