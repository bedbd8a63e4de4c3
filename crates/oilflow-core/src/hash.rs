//! Deterministic state hashing for replay and desync checks.

use crate::fixed::{Fixed64, Ticks};
use crate::products::Products;

/// FNV-1a (64-bit) over the raw bits of the simulation state. Not
/// cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(u64);

impl StateHash {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[u8::from(v)]);
    }

    pub fn write_fixed(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn write_products(&mut self, p: &Products) {
        self.write_fixed(p.gasoline);
        self.write_fixed(p.naphtha);
        self.write_fixed(p.asphalt);
    }

    /// Hash a backlog, length-prefixed so adjacent backlogs cannot alias.
    pub fn write_backlog(&mut self, entries: impl IntoIterator<Item = (Ticks, Fixed64)>) {
        let mut count = 0u64;
        for (tick, amount) in entries {
            self.write_u64(tick);
            self.write_fixed(amount);
            count += 1;
        }
        self.write_u64(count);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
